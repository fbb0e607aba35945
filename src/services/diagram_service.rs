//! Diagrams of a project.

use super::document_service::DocumentService;
use crate::error::CoreError;
use crate::models::{
    DiagramData, DiagramType, Diagram, DocumentCommonData, DocumentType, Project, ProjectEntity,
    ProjectScope,
};
use tracing::info;

#[derive(Clone)]
pub struct DiagramService {
    documents: DocumentService,
}

impl DiagramService {
    pub fn new(documents: DocumentService) -> Self {
        Self { documents }
    }

    /// Creates an empty diagram and registers it with `project`.
    pub async fn create_diagram(
        &self,
        project: &mut Project,
        name: &str,
        description: Option<String>,
        diagram_type: DiagramType,
    ) -> Result<Diagram, CoreError> {
        let data = DiagramData::new(DocumentCommonData::new(name, description), diagram_type);
        let diagram = self
            .documents
            .create_project_document(&project.scope(), DocumentType::Diagram, data, None)
            .await?;
        project.add_document(diagram.clone())?;
        info!("Created diagram {} in project {}", diagram.id(), project.id());
        Ok(diagram)
    }

    /// Writes the node tree, edges and viewport of a diagram back.
    pub async fn update_diagram(
        &self,
        diagram: &mut Diagram,
        scope: &ProjectScope,
    ) -> Result<(), CoreError> {
        self.documents
            .update_project_document(diagram, scope, None, None)
            .await
    }

    pub async fn load_diagram(&self, scope: &ProjectScope, id: &str) -> Result<Diagram, CoreError> {
        self.documents
            .load_project_document::<DiagramData>(scope, DocumentType::Diagram, id, None)
            .await
    }

    /// Replaces the diagrams of the aggregate with the stored ones.
    pub async fn load_diagrams(&self, project: &mut Project) -> Result<(), CoreError> {
        let diagrams = self
            .documents
            .query_project_documents::<DiagramData>(&project.scope(), DocumentType::Diagram, None)
            .await?;
        project.set_documents(
            DocumentType::Diagram,
            diagrams.into_iter().map(ProjectEntity::from).collect(),
        )
    }

    pub async fn delete_diagram(&self, project: &mut Project, id: &str) -> Result<(), CoreError> {
        self.documents
            .delete_document(project, DocumentType::Diagram, id)
            .await
    }
}
