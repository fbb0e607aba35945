//! SQLite storage backend.
//!
//! Keeps all documents in one table keyed by `(path, id)` with the payload
//! stored as JSON text. Array filters run inside SQLite through `json_each`.

use super::{StorageError, traits::*};
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite document store. One connection, serialized by a mutex.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

fn sqlite_error(e: rusqlite::Error) -> StorageError {
    StorageError::ConnectionError(e.to_string())
}

impl SqliteDocumentStore {
    /// Open (or create) a database file.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path).map_err(|e| {
            StorageError::ConnectionError(format!(
                "Failed to open document database {:?}: {}",
                db_path, e
            ))
        })?;
        info!("Opened SQLite document store at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqlite_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                path TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (path, id)
            )",
            [],
        )
        .map_err(sqlite_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Other("SQLite connection lock poisoned".to_string()))
    }
}

/// SQL value `json_each` reports for a JSON scalar.
fn json_atom(value: &Value) -> SqlValue {
    match value {
        Value::String(text) => SqlValue::Text(text.clone()),
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::Null => SqlValue::Null,
        other => SqlValue::Text(other.to_string()),
    }
}

fn parse(raw: &str) -> Result<Value, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Other(format!("Corrupt document payload: {}", e)))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn set_or_add(
        &self,
        path: &str,
        id: Option<&str>,
        data: Value,
    ) -> Result<String, StorageError> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);
        let conn = self.lock()?;
        // Upsert keeps the rowid, and with it the query order, of existing rows.
        conn.execute(
            "INSERT INTO documents (path, id, data) VALUES (?1, ?2, ?3)
             ON CONFLICT (path, id) DO UPDATE SET data = excluded.data, updated_at = CURRENT_TIMESTAMP",
            params![path, id, data.to_string()],
        )
        .map_err(sqlite_error)?;
        debug!(path, id = %id, "Stored document");
        Ok(id)
    }

    async fn get(&self, path: &str, id: &str) -> Result<Value, StorageError> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE path = ?1 AND id = ?2",
                params![path, id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sqlite_error)?;
        match raw {
            Some(raw) => parse(&raw),
            None => Err(StorageError::not_found(path, id)),
        }
    }

    async fn update(&self, path: &str, id: &str, data: Value) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows_affected = conn
            .execute(
                "UPDATE documents SET data = ?3, updated_at = CURRENT_TIMESTAMP
                 WHERE path = ?1 AND id = ?2",
                params![path, id, data.to_string()],
            )
            .map_err(sqlite_error)?;

        if rows_affected == 0 {
            Err(StorageError::not_found(path, id))
        } else {
            Ok(())
        }
    }

    async fn delete(&self, path: &str, id: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM documents WHERE path = ?1 AND id = ?2",
                params![path, id],
            )
            .map_err(sqlite_error)?;

        if rows_affected == 0 {
            Err(StorageError::not_found(path, id))
        } else {
            Ok(())
        }
    }

    async fn query(
        &self,
        path: &str,
        filters: &[QueryFilter],
    ) -> Result<Vec<(String, Value)>, StorageError> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE path = ?1");
        let mut bindings: Vec<SqlValue> = vec![SqlValue::Text(path.to_string())];
        for filter in filters {
            match filter {
                QueryFilter::ArrayContains { field, value } => {
                    let field_param = bindings.len() + 1;
                    sql.push_str(&format!(
                        " AND json_type(documents.data, ?{0}) = 'array' \
                         AND EXISTS (SELECT 1 FROM json_each(documents.data, ?{0}) WHERE json_each.value = ?{1})",
                        field_param,
                        field_param + 1
                    ));
                    bindings.push(SqlValue::Text(format!("$.{}", field)));
                    bindings.push(json_atom(value));
                }
            }
        }
        sql.push_str(" ORDER BY rowid");

        let rows: Vec<(String, String)> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(&sql).map_err(sqlite_error)?;
            let mapped = stmt
                .query_map(params_from_iter(bindings), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .map_err(sqlite_error)?;
            let rows = mapped
                .collect::<Result<Vec<_>, _>>()
                .map_err(sqlite_error)?;
            rows
        };

        rows.into_iter()
            .map(|(id, raw)| Ok((id, parse(&raw)?)))
            .collect()
    }
}
