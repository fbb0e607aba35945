//! Documents that live below a project.

use super::document::{Document, Identifiable};
use super::enums::DocumentType;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Snapshot of the owning project handed to payload processors and factories.
///
/// Holds ids only, never the project itself, so a child can be mutated while
/// its project is borrowed elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectScope {
    pub project_id: String,
    pub full_path: String,
    pub owner_id: Option<String>,
}

impl ProjectScope {
    /// Collection path of one kind of child documents.
    pub fn collection_path(&self, document_type: DocumentType) -> String {
        format!("{}{}", self.full_path, document_type.as_str())
    }

    /// Account id of the project owner; the key of all project secrets.
    pub fn owner_id(&self) -> Result<&str, CoreError> {
        self.owner_id.as_deref().ok_or_else(|| CoreError::NotFound {
            entity_type: "project owner".to_string(),
            entity_id: self.project_id.clone(),
        })
    }
}

/// A document bound to the project it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDocument<D> {
    pub document: Document<D>,
    project_id: String,
}

impl<D> ProjectDocument<D> {
    pub fn new(document: Document<D>, project_id: impl Into<String>) -> Self {
        Self {
            document,
            project_id: project_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        self.document.id()
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn document_type(&self) -> DocumentType {
        self.document.document_type()
    }

    pub fn path(&self) -> &str {
        self.document.path()
    }

    pub fn data(&self) -> &D {
        &self.document.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.document.data
    }
}

impl<D> Identifiable for ProjectDocument<D> {
    fn id(&self) -> &str {
        self.document.id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

/// A project document that can be placed on a diagram.
pub trait NodeEntity: Identifiable {
    fn node_type(&self) -> DocumentType;

    fn default_dimension(&self) -> Dimension;

    /// Whether the entity may be dropped into `target` (`None` is the diagram root).
    fn is_droppable(&self, target: Option<DocumentType>) -> bool;
}
