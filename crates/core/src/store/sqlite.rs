//! SQLite-backed document store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};
use serde_json::Value;

use super::{DocumentFilter, DocumentStore, FilterOp, Namespace, StoreError};

/// SQLite-backed document store.
///
/// All namespaces share one table; bodies are stored as JSON text and
/// filters are evaluated with `json_extract`.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Create a new SQLite document store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite document store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(namespace, created_at);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(
        namespace: Namespace,
        filter: &DocumentFilter,
    ) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = vec!["namespace = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(namespace.as_str().to_string())];

        for condition in &filter.conditions {
            // IS / IS NOT so that null comparisons behave like equality
            let op = match condition.op {
                FilterOp::Eq => "IS",
                FilterOp::Ne => "IS NOT",
                FilterOp::Gte => ">=",
                FilterOp::Lte => "<=",
            };
            conditions.push(format!("json_extract(body, ?) {} ?", op));
            params.push(Box::new(format!("$.{}", condition.field)));
            params.push(Box::new(json_to_sql(&condition.value)));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }

    fn key_of(namespace: Namespace, document: &Value) -> Result<String, StoreError> {
        document
            .get(namespace.key_field())
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StoreError::MissingKey {
                namespace: namespace.to_string(),
                field: namespace.key_field().to_string(),
            })
    }

    fn parse_body(body: &str) -> Result<Value, StoreError> {
        serde_json::from_str(body).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Convert a JSON scalar into the value `json_extract` would yield for it.
fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT body FROM documents WHERE namespace = ? AND key = ?",
            params![namespace.as_str(), key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(body) => Ok(Some(Self::parse_body(&body)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn save(&self, namespace: Namespace, document: &Value) -> Result<(), StoreError> {
        let key = Self::key_of(namespace, document)?;
        let body =
            serde_json::to_string(document).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (namespace, key, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![namespace.as_str(), key, body, now],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list(
        &self,
        namespace: Namespace,
        filter: &DocumentFilter,
    ) -> Result<Vec<Value>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(namespace, filter);

        let sql = format!(
            "SELECT body FROM documents {} ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut documents = Vec::new();
        for row_result in rows {
            let body = row_result.map_err(|e| StoreError::Database(e.to_string()))?;
            documents.push(Self::parse_body(&body)?);
        }

        Ok(documents)
    }

    fn count(&self, namespace: Namespace, filter: &DocumentFilter) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(namespace, filter);

        let sql = format!("SELECT COUNT(*) FROM documents {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count)
    }

    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();

        let deleted = conn
            .execute(
                "DELETE FROM documents WHERE namespace = ? AND key = ?",
                params![namespace.as_str(), key],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(deleted > 0)
    }
}
