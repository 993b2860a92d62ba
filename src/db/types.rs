use serde_json::Value as JsonValue;

/// A value that can be bound to a SQL parameter.
#[derive(Debug, Clone)]
pub enum DbValue {
    Text(String),
    /// JSONB document
    JsonB(JsonValue),
}

/// Database operation flushed inside one batch transaction.
#[derive(Debug, Clone)]
pub enum DbOperation {
    /// INSERT with ON CONFLICT DO UPDATE (upsert)
    Upsert {
        table: String,
        columns: Vec<String>,
        values: Vec<DbValue>,
        /// Columns that form the unique constraint
        conflict_columns: Vec<String>,
        /// Columns to update on conflict
        update_columns: Vec<String>,
    },
    /// DELETE with WHERE clause
    Delete {
        table: String,
        where_clause: WhereClause,
    },
}

impl DbOperation {
    /// Upsert of a JSONB entity document keyed by `id`.
    pub fn upsert_document(table: &str, id: &str, data: JsonValue) -> Self {
        DbOperation::Upsert {
            table: table.to_string(),
            columns: vec!["id".to_string(), "data".to_string()],
            values: vec![DbValue::Text(id.to_string()), DbValue::JsonB(data)],
            conflict_columns: vec!["id".to_string()],
            update_columns: vec!["data".to_string()],
        }
    }

    pub fn delete_document(table: &str, id: &str) -> Self {
        DbOperation::Delete {
            table: table.to_string(),
            where_clause: WhereClause {
                column: "id".to_string(),
                value: DbValue::Text(id.to_string()),
            },
        }
    }

    pub fn table(&self) -> &str {
        match self {
            DbOperation::Upsert { table, .. } | DbOperation::Delete { table, .. } => table,
        }
    }
}

/// `column = value` condition of a DELETE.
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub column: String,
    pub value: DbValue,
}
