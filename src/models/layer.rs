use super::document::{
    DocumentAttribute, DocumentCommonData, DocumentData, DocumentMetaData, Named,
};
use super::enums::{DocumentType, LayerType};
use super::project_document::{Dimension, NodeEntity, ProjectDocument};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    pub common: DocumentCommonData,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    #[serde(default)]
    pub attributes: Vec<DocumentAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMetaData>,
}

impl LayerData {
    pub fn new(
        common: DocumentCommonData,
        layer_type: LayerType,
        attributes: Vec<DocumentAttribute>,
    ) -> Self {
        Self {
            common,
            layer_type,
            attributes,
            meta: None,
        }
    }
}

impl DocumentData for LayerData {
    fn meta(&self) -> Option<&DocumentMetaData> {
        self.meta.as_ref()
    }

    fn meta_slot(&mut self) -> Option<&mut Option<DocumentMetaData>> {
        Some(&mut self.meta)
    }
}

pub type Layer = ProjectDocument<LayerData>;

impl Named for Layer {
    fn name(&self) -> String {
        self.data().common.name.clone()
    }
}

impl NodeEntity for Layer {
    fn node_type(&self) -> DocumentType {
        DocumentType::Layer
    }

    fn default_dimension(&self) -> Dimension {
        Dimension {
            width: 400.0,
            height: 300.0,
        }
    }

    // Layers are never nested inside other nodes.
    fn is_droppable(&self, target: Option<DocumentType>) -> bool {
        target.is_none()
    }
}
