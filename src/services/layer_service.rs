use super::document_service::DocumentService;
use crate::error::CoreError;
use crate::models::{
    DocumentAttribute, DocumentCommonData, DocumentType, Layer, LayerData, LayerType, Project,
    ProjectEntity, ProjectScope,
};
use tracing::info;

#[derive(Clone)]
pub struct LayerService {
    documents: DocumentService,
}

impl LayerService {
    pub fn new(documents: DocumentService) -> Self {
        Self { documents }
    }

    pub async fn create_layer(
        &self,
        project: &mut Project,
        name: &str,
        description: Option<String>,
        layer_type: LayerType,
        attributes: Vec<DocumentAttribute>,
    ) -> Result<Layer, CoreError> {
        let data = LayerData::new(
            DocumentCommonData::new(name, description),
            layer_type,
            attributes,
        );
        let layer = self
            .documents
            .create_project_document(&project.scope(), DocumentType::Layer, data, None)
            .await?;
        project.add_document(layer.clone())?;
        info!(
            "Created {:?} layer {} in project {}",
            layer.data().layer_type,
            layer.id(),
            project.id()
        );
        Ok(layer)
    }

    pub async fn update_layer(&self, layer: &mut Layer, scope: &ProjectScope) -> Result<(), CoreError> {
        self.documents.update_project_document(layer, scope, None, None).await
    }

    pub async fn load_layer(&self, scope: &ProjectScope, id: &str) -> Result<Layer, CoreError> {
        self.documents
            .load_project_document::<LayerData>(scope, DocumentType::Layer, id, None)
            .await
    }

    pub async fn load_layers(&self, project: &mut Project) -> Result<(), CoreError> {
        let layers = self
            .documents
            .query_project_documents::<LayerData>(&project.scope(), DocumentType::Layer, None)
            .await?;
        project.set_documents(
            DocumentType::Layer,
            layers.into_iter().map(ProjectEntity::from).collect(),
        )
    }

    pub async fn delete_layer(&self, project: &mut Project, id: &str) -> Result<(), CoreError> {
        self.documents
            .delete_document(project, DocumentType::Layer, id)
            .await
    }
}
