//! Project lifecycle, membership queries and aggregate assembly.

use super::connection_service::ConnectionService;
use super::diagram_service::DiagramService;
use super::document_service::DocumentService;
use super::layer_service::LayerService;
use super::role_service::RoleService;
use crate::error::CoreError;
use crate::models::{
    sort_by_name, DocumentAttribute, DocumentCommonData, DocumentType, Project, ProjectData,
    ProjectMember, ProjectMemberRole, validate_members,
};
use crate::storage::QueryFilter;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Privileged, recursive deletion of a whole project.
#[async_trait]
pub trait ProjectDeleter: Send + Sync {
    async fn delete_project(&self, project_id: &str) -> Result<(), CoreError>;
}

/// Input of [`ProjectService::create_project`].
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<ProjectMember>,
    pub attributes: Vec<DocumentAttribute>,
    visitor_role: Option<(String, Option<String>)>,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        members: Vec<ProjectMember>,
        attributes: Vec<DocumentAttribute>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            members,
            attributes,
            visitor_role: None,
        }
    }

    /// Also create a role without permissions for visitors.
    pub fn with_visitor_role(mut self, name: impl Into<String>, description: Option<String>) -> Self {
        self.visitor_role = Some((name.into(), description));
        self
    }
}

#[derive(Clone)]
pub struct ProjectService {
    documents: DocumentService,
    connections: ConnectionService,
    diagrams: DiagramService,
    layers: LayerService,
    roles: RoleService,
    deleter: Option<Arc<dyn ProjectDeleter>>,
}

impl ProjectService {
    pub fn new(
        documents: DocumentService,
        connections: ConnectionService,
        deleter: Option<Arc<dyn ProjectDeleter>>,
    ) -> Self {
        Self {
            diagrams: DiagramService::new(documents.clone()),
            layers: LayerService::new(documents.clone()),
            roles: RoleService::new(documents.clone()),
            documents,
            connections,
            deleter,
        }
    }

    fn caller(&self) -> Result<String, CoreError> {
        Ok(self.documents.auth().current_user_id()?)
    }

    /// Creates a project. Members must hold exactly one owner and at most one
    /// manager; `access` is derived from them.
    pub async fn create_project(&self, new: NewProject) -> Result<Project, CoreError> {
        validate_members(&new.members)?;
        let data = ProjectData::new(
            DocumentCommonData::new(new.name, new.description),
            new.members,
            new.attributes,
        );
        let document = self
            .documents
            .create_document(DocumentType::Project.as_str(), data, None)
            .await?;
        let mut project = Project::new(document);
        info!("Created project {}", project.id());

        if let Some((name, description)) = new.visitor_role {
            self.roles
                .create_role(&mut project, &name, description, Vec::new())
                .await?;
        }
        Ok(project)
    }

    /// Writes the project back, recomputing `access` from its members.
    pub async fn update_project(&self, project: &mut Project) -> Result<(), CoreError> {
        validate_members(&project.data().members)?;
        self.documents
            .update(
                &mut project.document,
                Some(&|data: &mut ProjectData| data.refresh_access()),
                None,
            )
            .await
    }

    /// Projects visible to the current user, sorted by name.
    pub async fn load_projects(&self) -> Result<Vec<Project>, CoreError> {
        let caller = self.caller()?;
        let documents = self
            .documents
            .query::<ProjectData>(
                DocumentType::Project.as_str(),
                &[QueryFilter::array_contains("access", caller)],
                None,
            )
            .await?;
        let mut projects: Vec<Project> = documents.into_iter().map(Project::new).collect();
        sort_by_name(&mut projects);
        Ok(projects)
    }

    /// Loads a project together with its connections, diagrams, layers and roles.
    pub async fn load_project(&self, id: &str) -> Result<Project, CoreError> {
        let document = self
            .documents
            .load::<ProjectData>(DocumentType::Project.as_str(), id, None)
            .await?;
        let mut project = Project::new(document);
        if project.get_owner().is_err() {
            warn!("Project {} has no owner; its connections cannot be decrypted", id);
        }
        self.connections.load_connections(&mut project).await?;
        self.diagrams.load_diagrams(&mut project).await?;
        self.layers.load_layers(&mut project).await?;
        self.roles.load_roles(&mut project).await?;
        Ok(project)
    }

    /// Role of the current user in `project`.
    pub fn own_role(&self, project: &Project) -> Result<ProjectMemberRole, CoreError> {
        project.get_own_role(&self.caller()?)
    }

    /// Whether the current user holds one of `roles`. False without a session.
    pub fn has_role(&self, project: &Project, roles: &[ProjectMemberRole]) -> bool {
        match self.caller() {
            Ok(caller) => project.has_role(&caller, roles),
            Err(_) => false,
        }
    }

    /// Deletes the project and everything below it through the privileged
    /// procedure. Only the owner may do this.
    pub async fn delete_project(&self, project: Project) -> Result<(), CoreError> {
        let deleter = self.deleter.as_ref().ok_or_else(|| {
            CoreError::Precondition("project deletion is not configured".to_string())
        })?;
        deleter.delete_project(project.id()).await?;
        info!("Project {} deleted", project.id());
        Ok(())
    }
}
