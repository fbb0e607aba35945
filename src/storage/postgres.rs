//! PostgreSQL storage backend implementation.
//!
//! Uses sqlx for database operations and implements the DocumentStore trait.
//! Payloads are JSONB; array filters use containment (`@>`).

use super::{StorageError, traits::*};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::debug;

/// PostgreSQL storage backend implementation.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run the bundled migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url).await.map_err(|e| {
            StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
        })?;
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            return Err(StorageError::ConnectionError(format!(
                "Migration failed: {}",
                e
            )));
        }
        Ok(Self::new(pool))
    }
}

fn pg_error(e: sqlx::Error) -> StorageError {
    StorageError::ConnectionError(e.to_string())
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn set_or_add(
        &self,
        path: &str,
        id: Option<&str>,
        data: Value,
    ) -> Result<String, StorageError> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);
        sqlx::query(
            r#"
            INSERT INTO documents (path, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (path, id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(path)
        .bind(&id)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(pg_error)?;

        debug!(path, id = %id, "Stored document");
        Ok(id)
    }

    async fn get(&self, path: &str, id: &str) -> Result<Value, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE path = $1 AND id = $2
            "#,
        )
        .bind(path)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_error)?;

        match row {
            Some(row) => row.try_get::<Value, _>("data").map_err(pg_error),
            None => Err(StorageError::not_found(path, id)),
        }
    }

    async fn update(&self, path: &str, id: &str, data: Value) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE documents
            SET data = $3, updated_at = NOW()
            WHERE path = $1 AND id = $2
            "#,
        )
        .bind(path)
        .bind(id)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(pg_error)?
        .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::not_found(path, id))
        } else {
            Ok(())
        }
    }

    async fn delete(&self, path: &str, id: &str) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE path = $1 AND id = $2
            "#,
        )
        .bind(path)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(pg_error)?
        .rows_affected();

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
        let mut sql = String::from("SELECT id, data FROM documents WHERE path = $1");
        let mut values: Vec<(String, Value)> = Vec::with_capacity(filters.len());
        for filter in filters {
            match filter {
                QueryFilter::ArrayContains { field, value } => {
                    let field_param = values.len() * 2 + 2;
                    sql.push_str(&format!(
                        " AND data -> ${} @> ${}",
                        field_param,
                        field_param + 1
                    ));
                    values.push((field.clone(), Value::Array(vec![value.clone()])));
                }
            }
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut query = sqlx::query(&sql).bind(path);
        for (field, contained) in values {
            query = query.bind(field).bind(contained);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(pg_error)?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(pg_error)?;
                let data: Value = row.try_get("data").map_err(pg_error)?;
                Ok((id, data))
            })
            .collect()
    }
}
