//! In-memory storage backend.
//!
//! Used when neither PostgreSQL nor SQLite is configured, and by tests.

use super::{StorageError, traits::*};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Document store that keeps every collection in ordered maps.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in one collection.
    pub async fn len(&self, path: &str) -> usize {
        self.collections
            .read()
            .await
            .get(path)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set_or_add(
        &self,
        path: &str,
        id: Option<&str>,
        data: Value,
    ) -> Result<String, StorageError> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);
        let mut collections = self.collections.write().await;
        collections
            .entry(path.to_string())
            .or_default()
            .insert(id.clone(), data);
        debug!(path, id = %id, "Stored document");
        Ok(id)
    }

    async fn get(&self, path: &str, id: &str) -> Result<Value, StorageError> {
        self.collections
            .read()
            .await
            .get(path)
            .and_then(|documents| documents.get(id))
            .cloned()
            .ok_or_else(|| StorageError::not_found(path, id))
    }

    async fn update(&self, path: &str, id: &str, data: Value) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        match collections
            .get_mut(path)
            .and_then(|documents| documents.get_mut(id))
        {
            Some(existing) => {
                *existing = data;
                Ok(())
            }
            None => Err(StorageError::not_found(path, id)),
        }
    }

    async fn delete(&self, path: &str, id: &str) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(path)
            .and_then(|documents| documents.remove(id))
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(path, id))
    }

    async fn query(
        &self,
        path: &str,
        filters: &[QueryFilter],
    ) -> Result<Vec<(String, Value)>, StorageError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(path) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .filter(|(_, data)| filters.iter().all(|filter| filter.matches(data)))
            .map(|(id, data)| (id.clone(), data.clone()))
            .collect())
    }
}
