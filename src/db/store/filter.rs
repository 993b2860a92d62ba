//! Relation filters over JSONB entity documents.
//!
//! The same filter is evaluated in memory against pending documents and
//! rendered to SQL for documents already persisted in PostgreSQL.

use serde_json::Value as JsonValue;

use crate::db::DbValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// `field == value`. A `Null` value matches missing fields too.
    Eq(&'static str, JsonValue),
    /// `field` equals one of the values. An empty list matches nothing.
    In(&'static str, Vec<JsonValue>),
    /// `field` is absent or null.
    IsNull(&'static str),
    /// Array `field` contains `value`.
    Contains(&'static str, JsonValue),
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn is_in<I, V>(field: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        Filter::In(field, values.into_iter().map(Into::into).collect())
    }

    pub fn contains(field: &'static str, value: impl Into<JsonValue>) -> Self {
        Filter::Contains(field, value.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            Filter::All => other,
            first => Filter::And(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Evaluate against a document.
    pub fn matches(&self, doc: &JsonValue) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, JsonValue::Null) => field_of(doc, field).is_null(),
            Filter::Eq(field, value) => field_of(doc, field) == value,
            Filter::In(field, values) => {
                let actual = field_of(doc, field);
                values.iter().any(|v| v == actual)
            }
            Filter::IsNull(field) => field_of(doc, field).is_null(),
            Filter::Contains(field, value) => match field_of(doc, field) {
                JsonValue::Array(items) => items.contains(value),
                _ => false,
            },
            Filter::Not(inner) => !inner.matches(doc),
            Filter::And(parts) => parts.iter().all(|p| p.matches(doc)),
            Filter::Or(parts) => parts.iter().any(|p| p.matches(doc)),
        }
    }

    /// Render as a boolean SQL expression over the `data` JSONB column,
    /// appending bound values to `params`.
    pub fn to_sql(&self, params: &mut Vec<DbValue>) -> String {
        match self {
            Filter::All => "TRUE".to_string(),
            Filter::Eq(field, JsonValue::Null) | Filter::IsNull(field) => format!(
                "(data->'{0}' IS NULL OR data->'{0}' = 'null'::jsonb)",
                field
            ),
            Filter::Eq(field, value) => {
                params.push(DbValue::JsonB(value.clone()));
                format!("data->'{}' = ${}::jsonb", field, params.len())
            }
            Filter::In(_, values) if values.is_empty() => "FALSE".to_string(),
            Filter::In(field, values) => {
                params.push(DbValue::JsonB(JsonValue::Array(values.clone())));
                format!(
                    "data->'{}' IN (SELECT jsonb_array_elements(${}::jsonb))",
                    field,
                    params.len()
                )
            }
            Filter::Contains(field, value) => {
                params.push(DbValue::JsonB(JsonValue::Array(vec![value.clone()])));
                format!("data->'{}' @> ${}::jsonb", field, params.len())
            }
            Filter::Not(inner) => format!("NOT ({})", inner.to_sql(params)),
            Filter::And(parts) if parts.is_empty() => "TRUE".to_string(),
            Filter::And(parts) => join_sql(parts, " AND ", params),
            Filter::Or(parts) if parts.is_empty() => "FALSE".to_string(),
            Filter::Or(parts) => join_sql(parts, " OR ", params),
        }
    }
}

fn field_of<'a>(doc: &'a JsonValue, field: &str) -> &'a JsonValue {
    doc.get(field).unwrap_or(&JsonValue::Null)
}

fn join_sql(parts: &[Filter], separator: &str, params: &mut Vec<DbValue>) -> String {
    let rendered: Vec<String> = parts.iter().map(|p| p.to_sql(params)).collect();
    format!("({})", rendered.join(separator))
}
