//! Generic persisted document and the payload mixins shared by all entities.
//!
//! A document is addressed by its collection `path` (never containing the id)
//! and its `id`. The document type is always the last segment of the path.

use super::enums::{AttributeType, DocumentType};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// An object with an identifier.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// An object with a displayable name.
pub trait Named {
    fn name(&self) -> String;
}

impl<T: Named + ?Sized> Named for &T {
    fn name(&self) -> String {
        (**self).name()
    }
}

/// Primary collation key of a name: decomposed, without combining marks,
/// lowercased. "Émile" and "emile" share a key.
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Sorts by display name ignoring case and accents. Ties are broken by the
/// lowercased name, then by the exact name.
pub fn sort_by_name<T: Named>(items: &mut [T]) {
    items.sort_by_cached_key(|item| {
        let name = item.name();
        (collation_key(&name), name.to_lowercase(), name)
    });
}

/// Payload stored inside a [`Document`].
pub trait DocumentData: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn meta(&self) -> Option<&DocumentMetaData> {
        None
    }

    /// Metadata slot of the payload, `None` if the payload type carries none.
    fn meta_slot(&mut self) -> Option<&mut Option<DocumentMetaData>> {
        None
    }

    /// Rebuilds in-memory state that is not persisted. Called after every load.
    fn after_load(&mut self) {}
}

/// Who did something, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaStamp {
    pub by: String,
    pub at: DateTime<Utc>,
}

impl MetaStamp {
    pub fn now(by: impl Into<String>) -> Self {
        Self {
            by: by.into(),
            at: Utc::now(),
        }
    }
}

/// Audit metadata. `created` is written once, `altered` on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetaData {
    pub created: MetaStamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altered: Option<MetaStamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCommonData {
    pub name: String,
    pub description: Option<String>,
}

impl DocumentCommonData {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

/// User defined key/value attribute. Key uniqueness is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAttribute {
    pub key: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub value: AttributeValue,
}

impl DocumentAttribute {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attribute_type: AttributeType::String,
            value: AttributeValue::String(value.into()),
        }
    }

    pub fn number(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            attribute_type: AttributeType::Number,
            value: AttributeValue::Number(value),
        }
    }

    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            attribute_type: AttributeType::Boolean,
            value: AttributeValue::Boolean(value),
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Document type segment of a collection path (its last segment).
pub fn extract_document_type(path: &str) -> &str {
    last_segment(path)
}

/// Everything before the last segment of a path.
pub fn extract_parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}

/// A persisted record: identity, collection path and typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<D> {
    id: String,
    path: String,
    document_type: DocumentType,
    pub data: D,
}

impl<D: DocumentData> Document<D> {
    /// Builds a document from its collection path and id.
    pub fn new(id: impl Into<String>, path: impl Into<String>, data: D) -> Result<Self, CoreError> {
        let id = id.into();
        let path = path.into();
        if id.is_empty() || id.contains('/') {
            return Err(CoreError::InvalidPath(format!(
                "document id \"{}\" is not a single path segment",
                id
            )));
        }
        let document_type = extract_document_type(&path)
            .parse::<DocumentType>()
            .map_err(|e| CoreError::InvalidPath(format!("{} (path \"{}\")", e, path)))?;
        Ok(Self {
            id,
            path,
            document_type,
            data,
        })
    }

    /// Builds a document from the full record path `<collection>/<id>`.
    pub fn from_record_path(record_path: &str, data: D) -> Result<Self, CoreError> {
        let id = last_segment(record_path);
        let path = extract_parent_path(record_path);
        Self::new(id, path, data)
    }

    pub fn meta(&self) -> Option<&DocumentMetaData> {
        self.data.meta()
    }
}

impl<D> Document<D> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// `<path>/<id>`
    pub fn record_path(&self) -> String {
        format!("{}/{}", self.path, self.id)
    }

    /// Prefix for sub-collections of this document, `<path>/<id>/`.
    pub fn full_path(&self) -> String {
        format!("{}/{}/", self.path, self.id)
    }
}

impl<D> Identifiable for Document<D> {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Stamps `meta.created` on a payload that carries a metadata slot.
pub(crate) fn stamp_created<D: DocumentData>(data: &mut D, by: &str) {
    if let Some(slot) = data.meta_slot() {
        *slot = Some(DocumentMetaData {
            created: MetaStamp::now(by),
            altered: None,
        });
    }
}

/// Stamps `meta.altered`, overwriting any previous value.
pub(crate) fn stamp_altered<D: DocumentData>(data: &mut D, by: &str) {
    if let Some(Some(meta)) = data.meta_slot() {
        meta.altered = Some(MetaStamp::now(by));
    }
}
