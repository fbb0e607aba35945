//! Roles of a project. Permissions carry no behaviour yet.

use super::document_service::DocumentService;
use crate::error::CoreError;
use crate::models::{
    DocumentCommonData, DocumentType, Permission, Project, ProjectEntity, ProjectScope, Role,
    RoleData,
};
use tracing::info;

#[derive(Clone)]
pub struct RoleService {
    documents: DocumentService,
}

impl RoleService {
    pub fn new(documents: DocumentService) -> Self {
        Self { documents }
    }

    pub async fn create_role(
        &self,
        project: &mut Project,
        name: &str,
        description: Option<String>,
        permissions: Vec<Permission>,
    ) -> Result<Role, CoreError> {
        let data = RoleData::new(DocumentCommonData::new(name, description), permissions);
        let role = self
            .documents
            .create_project_document(&project.scope(), DocumentType::Role, data, None)
            .await?;
        project.add_document(role.clone())?;
        info!("Created role {} in project {}", role.id(), project.id());
        Ok(role)
    }

    pub async fn update_role(&self, role: &mut Role, scope: &ProjectScope) -> Result<(), CoreError> {
        self.documents.update_project_document(role, scope, None, None).await
    }

    pub async fn load_role(&self, scope: &ProjectScope, id: &str) -> Result<Role, CoreError> {
        self.documents
            .load_project_document::<RoleData>(scope, DocumentType::Role, id, None)
            .await
    }

    pub async fn load_roles(&self, project: &mut Project) -> Result<(), CoreError> {
        let roles = self
            .documents
            .query_project_documents::<RoleData>(&project.scope(), DocumentType::Role, None)
            .await?;
        project.set_documents(
            DocumentType::Role,
            roles.into_iter().map(ProjectEntity::from).collect(),
        )
    }

    pub async fn delete_role(&self, project: &mut Project, id: &str) -> Result<(), CoreError> {
        self.documents
            .delete_document(project, DocumentType::Role, id)
            .await
    }
}
