//! Storage trait definitions for the document store backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Filter applied to the documents of one collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum QueryFilter {
    /// The top level array `field` contains `value`
    ArrayContains { field: String, value: Value },
}

impl QueryFilter {
    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        QueryFilter::ArrayContains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Evaluates the filter against a stored payload.
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            QueryFilter::ArrayContains { field, value } => data
                .get(field)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
        }
    }
}

/// Fresh document id for stores that allocate ids themselves.
pub fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Collection-oriented document store.
///
/// Documents are addressed by a collection `path` and an `id`; payloads are
/// opaque JSON objects.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `data` under `id`, or under a newly allocated id. Returns the id.
    async fn set_or_add(
        &self,
        path: &str,
        id: Option<&str>,
        data: Value,
    ) -> Result<String, super::StorageError>;

    /// Reads one document. Fails with `NotFound` when absent.
    async fn get(&self, path: &str, id: &str) -> Result<Value, super::StorageError>;

    /// Replaces an existing document. Fails with `NotFound` when absent.
    async fn update(&self, path: &str, id: &str, data: Value) -> Result<(), super::StorageError>;

    /// Removes one document. Fails with `NotFound` when absent.
    async fn delete(&self, path: &str, id: &str) -> Result<(), super::StorageError>;

    /// All documents of a collection matching every filter.
    async fn query(
        &self,
        path: &str,
        filters: &[QueryFilter],
    ) -> Result<Vec<(String, Value)>, super::StorageError>;
}
