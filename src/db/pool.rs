use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use serde_json::Value as JsonValue;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use super::error::DbError;
use super::types::{DbOperation, DbValue, WhereClause};

pub struct DbPool {
    pool: Pool,
}

impl DbPool {
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        let config = database_url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| DbError::InvalidConnectionString(e.to_string()))?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = Manager::from_config(config, NoTls, manager_config);

        let pool = Pool::builder(manager)
            .max_size(16)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(DbError::BuildError)?;

        let _conn = pool.get().await?;
        tracing::info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    pub async fn execute_transaction(&self, operations: Vec<DbOperation>) -> Result<(), DbError> {
        if operations.is_empty() {
            return Ok(());
        }

        let mut client = self.pool.get().await?;
        let transaction = client.transaction().await?;

        for op in operations {
            let (sql, params) = match op {
                DbOperation::Upsert {
                    table,
                    columns,
                    values,
                    conflict_columns,
                    update_columns,
                } => build_upsert_sql(&table, &columns, &values, &conflict_columns, &update_columns),
                DbOperation::Delete { table, where_clause } => {
                    build_delete_sql(&table, &where_clause)
                }
            };

            let params_refs: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

            if let Err(e) = transaction.execute(&sql, &params_refs[..]).await {
                let db_err: DbError = e.into();
                tracing::error!("SQL execution failed\n  SQL: {}\n  Error: {}", sql, db_err);
                return Err(db_err);
            }
        }

        transaction.commit().await?;
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), DbError> {
        super::migrations::run(&self.pool).await
    }

    /// Select `(id, data)` pairs from a document table.
    ///
    /// `condition` is a SQL boolean expression over the `data` column using
    /// `$1..$n` placeholders for `params`.
    pub async fn query_documents(
        &self,
        table: &str,
        condition: &str,
        params: &[DbValue],
    ) -> Result<Vec<(String, JsonValue)>, DbError> {
        let sql = format!(
            "SELECT id, data FROM {} WHERE {} ORDER BY id",
            quote_ident(table),
            condition
        );
        let params = convert_values_to_params(params);
        let params_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let client = self.pool.get().await?;
        let rows = client.query(&sql, &params_refs[..]).await?;
        Ok(rows
            .iter()
            .map(|row| (row.get::<_, String>(0), row.get::<_, JsonValue>(1)))
            .collect())
    }
}

#[derive(Debug)]
enum SqlParam {
    Text(String),
    Json(JsonValue),
}

impl ToSql for SqlParam {
    fn to_sql(
        &self,
        ty: &tokio_postgres::types::Type,
        out: &mut BytesMut,
    ) -> Result<tokio_postgres::types::IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlParam::Text(v) => v.to_sql(ty, out),
            SqlParam::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &tokio_postgres::types::Type) -> bool {
        <String as ToSql>::accepts(ty) || <JsonValue as ToSql>::accepts(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

fn convert_db_value(value: &DbValue) -> SqlParam {
    match value {
        DbValue::Text(v) => SqlParam::Text(v.clone()),
        DbValue::JsonB(v) => SqlParam::Json(v.clone()),
    }
}

fn convert_values_to_params(values: &[DbValue]) -> Vec<SqlParam> {
    values.iter().map(convert_db_value).collect()
}

/// Generate the SQL placeholder for a value at the given parameter index.
fn placeholder_for(value: &DbValue, param_idx: usize) -> String {
    match value {
        DbValue::JsonB(_) => format!("${}::jsonb", param_idx),
        DbValue::Text(_) => format!("${}", param_idx),
    }
}

/// Wrap a column name in double quotes to handle reserved keywords.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

fn quote_cols(columns: &[String]) -> String {
    columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ")
}

fn build_upsert_sql(
    table: &str,
    columns: &[String],
    values: &[DbValue],
    conflict_columns: &[String],
    update_columns: &[String],
) -> (String, Vec<SqlParam>) {
    let cols = quote_cols(columns);
    let placeholders: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| placeholder_for(v, i + 1))
        .collect();
    let placeholders_str = placeholders.join(", ");

    let conflict_cols = quote_cols(conflict_columns);
    let updates: Vec<String> = update_columns
        .iter()
        .map(|c| format!("{} = EXCLUDED.{}", quote_ident(c), quote_ident(c)))
        .collect();
    let updates_str = updates.join(", ");

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {}",
        quote_ident(table),
        cols,
        placeholders_str,
        conflict_cols,
        updates_str
    );

    let params = convert_values_to_params(values);
    (sql, params)
}

fn build_delete_sql(table: &str, where_clause: &WhereClause) -> (String, Vec<SqlParam>) {
    let sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quote_ident(table),
        quote_ident(&where_clause.column),
        placeholder_for(&where_clause.value, 1)
    );
    (sql, vec![convert_db_value(&where_clause.value)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_document_sql() {
        let op = DbOperation::upsert_document("post", "1", serde_json::json!({"id": "1"}));
        let DbOperation::Upsert {
            table,
            columns,
            values,
            conflict_columns,
            update_columns,
        } = op
        else {
            panic!("expected upsert");
        };
        let (sql, params) =
            build_upsert_sql(&table, &columns, &values, &conflict_columns, &update_columns);
        assert_eq!(
            sql,
            "INSERT INTO \"post\" (\"id\", \"data\") VALUES ($1, $2::jsonb) ON CONFLICT (\"id\") DO UPDATE SET \"data\" = EXCLUDED.\"data\""
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_delete_document_sql() {
        let DbOperation::Delete { table, where_clause } =
            DbOperation::delete_document("notification", "a-b")
        else {
            panic!("expected delete");
        };
        let (sql, params) = build_delete_sql(&table, &where_clause);
        assert_eq!(sql, "DELETE FROM \"notification\" WHERE \"id\" = $1");
        assert_eq!(params.len(), 1);
    }
}
