//! Persistence of typed documents on top of a [`DocumentStore`].
//!
//! Stamps audit metadata, runs payload processors around the store round trip
//! and re-hydrates typed documents. Project-scoped variants resolve their
//! collection below the owning project.

use crate::error::CoreError;
use crate::models::document::{extract_document_type, stamp_altered, stamp_created};
use crate::models::{
    Document, DocumentData, DocumentType, Project, ProjectDocument, ProjectScope,
};
use crate::services::auth::AuthProvider;
use crate::storage::{DocumentStore, QueryFilter};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Transforms a payload before it is written, returning the payload to persist.
/// The caller's payload is left untouched.
#[async_trait]
pub trait WriteProcessor<D: DocumentData>: Send + Sync {
    async fn before_write(&self, data: &D, scope: &ProjectScope) -> Result<D, CoreError>;
}

/// Transforms a freshly loaded payload in place.
#[async_trait]
pub trait ReadProcessor<D: DocumentData>: Send + Sync {
    async fn after_read(
        &self,
        data: &mut D,
        scope: Option<&ProjectScope>,
    ) -> Result<(), CoreError>;
}

fn validate_collection_path(path: &str) -> Result<DocumentType, CoreError> {
    extract_document_type(path)
        .parse::<DocumentType>()
        .map_err(|e| CoreError::InvalidPath(format!("{} (path \"{}\")", e, path)))
}

fn validate_id(id: &str) -> Result<(), CoreError> {
    if id.is_empty() || id.contains('/') {
        return Err(CoreError::InvalidPath(format!(
            "document id \"{}\" is not a single path segment",
            id
        )));
    }
    Ok(())
}

/// Copies the metadata of `from` into `to`, if both carry a metadata slot.
fn copy_meta<D: DocumentData>(from: &D, to: &mut D) {
    let meta = from.meta().cloned();
    if let Some(slot) = to.meta_slot() {
        if meta.is_some() {
            *slot = meta;
        }
    }
}

/// Generic document CRUD and query.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    fn stamp_created<D: DocumentData>(&self, data: &mut D) -> Result<(), CoreError> {
        if data.meta_slot().is_some() {
            let by = self.auth.current_user_name()?;
            stamp_created(data, &by);
        }
        Ok(())
    }

    fn stamp_altered<D: DocumentData>(&self, data: &mut D) -> Result<(), CoreError> {
        if data.meta().is_some() {
            let by = self.auth.current_user_name()?;
            stamp_altered(data, &by);
        }
        Ok(())
    }

    /// Persists a new document under `id`, or under a store-allocated id.
    pub async fn create_document<D: DocumentData>(
        &self,
        path: &str,
        mut data: D,
        id: Option<&str>,
    ) -> Result<Document<D>, CoreError> {
        validate_collection_path(path)?;
        if let Some(id) = id {
            validate_id(id)?;
        }
        self.stamp_created(&mut data)?;
        let value = serde_json::to_value(&data)?;
        let id = self.store.set_or_add(path, id, value).await?;
        info!("Created {}/{}", path, id);
        Document::new(id, path, data)
    }

    /// Writes a document back to the store.
    ///
    /// `meta.altered` is stamped on the document, then `processor` is applied
    /// to its payload. `data` replaces the written payload when given; it is
    /// written with the document's metadata.
    pub async fn update<D: DocumentData>(
        &self,
        document: &mut Document<D>,
        processor: Option<&(dyn Fn(&mut D) + Send + Sync)>,
        data: Option<&D>,
    ) -> Result<(), CoreError> {
        self.stamp_altered(&mut document.data)?;
        if let Some(processor) = processor {
            processor(&mut document.data);
        }
        let value = match data {
            Some(replacement) => {
                let mut replacement = replacement.clone();
                copy_meta(&document.data, &mut replacement);
                serde_json::to_value(&replacement)?
            }
            None => serde_json::to_value(&document.data)?,
        };
        self.store
            .update(document.path(), document.id(), value)
            .await?;
        debug!("Updated {}", document.record_path());
        Ok(())
    }

    /// Removes the record only; sub-collections are not touched.
    pub async fn delete<D: DocumentData>(&self, document: &Document<D>) -> Result<(), CoreError> {
        self.store.delete(document.path(), document.id()).await?;
        info!("Deleted {}", document.record_path());
        Ok(())
    }

    /// Loads one document. A missing record is a `NotFound` error.
    pub async fn load<D: DocumentData>(
        &self,
        path: &str,
        id: &str,
        processor: Option<&dyn ReadProcessor<D>>,
    ) -> Result<Document<D>, CoreError> {
        self.load_scoped(path, id, processor, None).await
    }

    async fn load_scoped<D: DocumentData>(
        &self,
        path: &str,
        id: &str,
        processor: Option<&dyn ReadProcessor<D>>,
        scope: Option<&ProjectScope>,
    ) -> Result<Document<D>, CoreError> {
        validate_collection_path(path)?;
        let value = self.store.get(path, id).await?;
        let mut data: D = serde_json::from_value(value)?;
        data.after_load();
        if let Some(processor) = processor {
            processor.after_read(&mut data, scope).await?;
        }
        debug!("Loaded {}/{}", path, id);
        Document::new(id, path, data)
    }

    /// All documents of a collection matching `filters`, in store order.
    pub async fn query<D: DocumentData>(
        &self,
        path: &str,
        filters: &[QueryFilter],
        processor: Option<&dyn ReadProcessor<D>>,
    ) -> Result<Vec<Document<D>>, CoreError> {
        self.query_scoped(path, filters, processor, None).await
    }

    async fn query_scoped<D: DocumentData>(
        &self,
        path: &str,
        filters: &[QueryFilter],
        processor: Option<&dyn ReadProcessor<D>>,
        scope: Option<&ProjectScope>,
    ) -> Result<Vec<Document<D>>, CoreError> {
        validate_collection_path(path)?;
        let records = self.store.query(path, filters).await?;
        debug!("Queried {} ({} documents)", path, records.len());

        let mut documents = Vec::with_capacity(records.len());
        for (id, value) in records {
            let mut data: D = serde_json::from_value(value)?;
            data.after_load();
            if let Some(processor) = processor {
                processor.after_read(&mut data, scope).await?;
            }
            documents.push(Document::new(id, path, data)?);
        }
        Ok(documents)
    }

    /// Creates a document below a project. `processor` runs before the write
    /// and only its output is persisted; the returned document keeps `data`.
    pub async fn create_project_document<D: DocumentData>(
        &self,
        scope: &ProjectScope,
        document_type: DocumentType,
        mut data: D,
        processor: Option<&dyn WriteProcessor<D>>,
    ) -> Result<ProjectDocument<D>, CoreError> {
        let path = scope.collection_path(document_type);
        self.stamp_created(&mut data)?;
        let value = match processor {
            Some(processor) => serde_json::to_value(processor.before_write(&data, scope).await?)?,
            None => serde_json::to_value(&data)?,
        };
        let id = self.store.set_or_add(&path, None, value).await?;
        info!("Created {}/{}", path, id);
        Ok(ProjectDocument::new(
            Document::new(id, path, data)?,
            scope.project_id.clone(),
        ))
    }

    /// Writes a project document back, running `processor` before the write.
    ///
    /// `data` replaces the written payload when given, as in [`Self::update`].
    /// The `meta.altered` stamp reaches `document` only once the write has
    /// succeeded.
    pub async fn update_project_document<D: DocumentData>(
        &self,
        document: &mut ProjectDocument<D>,
        scope: &ProjectScope,
        processor: Option<&dyn WriteProcessor<D>>,
        data: Option<&D>,
    ) -> Result<(), CoreError> {
        if document.project_id() != scope.project_id {
            return Err(CoreError::Precondition(format!(
                "{} \"{}\" does not belong to project \"{}\"",
                document.document_type(),
                document.id(),
                scope.project_id
            )));
        }
        let mut stamped = document.data().clone();
        self.stamp_altered(&mut stamped)?;
        let mut payload = match data {
            Some(replacement) => replacement.clone(),
            None => stamped.clone(),
        };
        copy_meta(&stamped, &mut payload);
        if let Some(processor) = processor {
            payload = processor.before_write(&payload, scope).await?;
        }
        let value = serde_json::to_value(&payload)?;
        self.store
            .update(document.path(), document.id(), value)
            .await?;
        copy_meta(&stamped, document.data_mut());
        debug!("Updated {}", document.document.record_path());
        Ok(())
    }

    pub async fn load_project_document<D: DocumentData>(
        &self,
        scope: &ProjectScope,
        document_type: DocumentType,
        id: &str,
        processor: Option<&dyn ReadProcessor<D>>,
    ) -> Result<ProjectDocument<D>, CoreError> {
        let path = scope.collection_path(document_type);
        let document = self.load_scoped(&path, id, processor, Some(scope)).await?;
        Ok(ProjectDocument::new(document, scope.project_id.clone()))
    }

    pub async fn query_project_documents<D: DocumentData>(
        &self,
        scope: &ProjectScope,
        document_type: DocumentType,
        processor: Option<&dyn ReadProcessor<D>>,
    ) -> Result<Vec<ProjectDocument<D>>, CoreError> {
        let path = scope.collection_path(document_type);
        let documents = self
            .query_scoped(&path, &[], processor, Some(scope))
            .await?;
        Ok(documents
            .into_iter()
            .map(|document| ProjectDocument::new(document, scope.project_id.clone()))
            .collect())
    }

    /// Deletes a child document from the store, then from the aggregate of
    /// `project`. When the store delete fails the aggregate is unchanged.
    pub async fn delete_document(
        &self,
        project: &mut Project,
        document_type: DocumentType,
        id: &str,
    ) -> Result<(), CoreError> {
        // Must be registered before anything is deleted.
        project.get_document(document_type, id)?;
        let path = project.scope().collection_path(document_type);
        self.store.delete(&path, id).await?;
        project.remove_document(document_type, id);
        info!("Deleted {}/{}", path, id);
        Ok(())
    }
}
