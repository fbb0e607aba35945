//! Storage error types for the document store backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageError {
    /// Document not found
    #[error("Document not found: {entity_type} with id {entity_id}")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },
    /// Database connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// General storage error
    #[error("Storage error: {0}")]
    Other(String),
}

impl StorageError {
    /// `NotFound` for the record `<path>/<id>`; the entity type is the last path segment.
    pub fn not_found(path: &str, id: &str) -> Self {
        StorageError::NotFound {
            entity_type: path.rsplit('/').next().unwrap_or(path).to_string(),
            entity_id: id.to_string(),
        }
    }
}
