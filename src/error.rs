//! Error taxonomy of the document core.

use crate::services::auth::AuthError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by every entity, aggregate and service operation.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A record, aggregate entry or required project member does not exist
    #[error("Not found: {entity_type} \"{entity_id}\"")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },
    /// The same (type, id) pair was registered twice
    #[error("Conflict: {entity_type} \"{entity_id}\" {reason}")]
    Conflict {
        entity_type: String,
        entity_id: String,
        reason: String,
    },
    /// A required value was missing or a precondition did not hold
    #[error("Precondition failed: {0}")]
    Precondition(String),
    /// A path or id that cannot address a document
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// Project members break the owner/manager rules
    #[error("Invalid project members: {0}")]
    InvalidMembers(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(StorageError),
    /// Encryption collaborator failure
    #[error("Cipher error: {0}")]
    Cipher(String),
    /// Remote procedure transport or status failure
    #[error("Remote procedure error: {0}")]
    Functions(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict { .. })
    }
}

impl From<StorageError> for CoreError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound {
                entity_type,
                entity_id,
            } => CoreError::NotFound {
                entity_type,
                entity_id,
            },
            other => CoreError::Storage(other),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Serialization(error.to_string())
    }
}
