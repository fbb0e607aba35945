//! Projects and the in-memory aggregate of their child documents.

use super::connection::Connection;
use super::diagram::Diagram;
use super::document::{
    sort_by_name, Document, DocumentAttribute, DocumentCommonData, DocumentData,
    DocumentMetaData, Identifiable, Named,
};
use super::enums::{DocumentType, ProjectMemberRole};
use super::layer::Layer;
use super::project_document::ProjectScope;
use super::role::Role;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub account_id: String,
    pub display_name: String,
    pub role: ProjectMemberRole,
}

impl ProjectMember {
    pub fn new(
        account_id: impl Into<String>,
        display_name: impl Into<String>,
        role: ProjectMemberRole,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub common: DocumentCommonData,
    #[serde(default)]
    pub attributes: Vec<DocumentAttribute>,
    /// Account ids allowed to see the project. Derived from `members`.
    #[serde(default)]
    pub access: Vec<String>,
    pub members: Vec<ProjectMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMetaData>,
}

impl ProjectData {
    pub fn new(
        common: DocumentCommonData,
        members: Vec<ProjectMember>,
        attributes: Vec<DocumentAttribute>,
    ) -> Self {
        let access = create_access_list(&members);
        Self {
            common,
            attributes,
            access,
            members,
            meta: None,
        }
    }

    /// Recomputes `access` from the current members.
    pub fn refresh_access(&mut self) {
        self.access = create_access_list(&self.members);
    }
}

impl DocumentData for ProjectData {
    fn meta(&self) -> Option<&DocumentMetaData> {
        self.meta.as_ref()
    }

    fn meta_slot(&mut self) -> Option<&mut Option<DocumentMetaData>> {
        Some(&mut self.meta)
    }
}

/// Unique member account ids, in order of first appearance.
pub fn create_access_list(members: &[ProjectMember]) -> Vec<String> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|member| seen.insert(member.account_id.as_str()))
        .map(|member| member.account_id.clone())
        .collect()
}

/// Exactly one owner and at most one manager.
pub fn validate_members(members: &[ProjectMember]) -> Result<(), CoreError> {
    let owners = members
        .iter()
        .filter(|member| member.role == ProjectMemberRole::Owner)
        .count();
    if owners != 1 {
        return Err(CoreError::InvalidMembers(format!(
            "a project needs exactly one owner, found {}",
            owners
        )));
    }
    let managers = members
        .iter()
        .filter(|member| member.role == ProjectMemberRole::Manager)
        .count();
    if managers > 1 {
        return Err(CoreError::InvalidMembers(format!(
            "a project has at most one manager, found {}",
            managers
        )));
    }
    Ok(())
}

/// Any document that can be registered in a project aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEntity {
    Connection(Connection),
    Diagram(Diagram),
    Layer(Layer),
    Role(Role),
}

impl ProjectEntity {
    pub fn document_type(&self) -> DocumentType {
        match self {
            ProjectEntity::Connection(_) => DocumentType::Connection,
            ProjectEntity::Diagram(_) => DocumentType::Diagram,
            ProjectEntity::Layer(_) => DocumentType::Layer,
            ProjectEntity::Role(_) => DocumentType::Role,
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            ProjectEntity::Connection(entity) => entity.project_id(),
            ProjectEntity::Diagram(entity) => entity.project_id(),
            ProjectEntity::Layer(entity) => entity.project_id(),
            ProjectEntity::Role(entity) => entity.project_id(),
        }
    }
}

impl Identifiable for ProjectEntity {
    fn id(&self) -> &str {
        match self {
            ProjectEntity::Connection(entity) => entity.id(),
            ProjectEntity::Diagram(entity) => entity.id(),
            ProjectEntity::Layer(entity) => entity.id(),
            ProjectEntity::Role(entity) => entity.id(),
        }
    }
}

impl Named for ProjectEntity {
    fn name(&self) -> String {
        match self {
            ProjectEntity::Connection(entity) => entity.name(),
            ProjectEntity::Diagram(entity) => entity.name(),
            ProjectEntity::Layer(entity) => entity.name(),
            ProjectEntity::Role(entity) => entity.name(),
        }
    }
}

impl From<Connection> for ProjectEntity {
    fn from(entity: Connection) -> Self {
        ProjectEntity::Connection(entity)
    }
}

impl From<Diagram> for ProjectEntity {
    fn from(entity: Diagram) -> Self {
        ProjectEntity::Diagram(entity)
    }
}

impl From<Layer> for ProjectEntity {
    fn from(entity: Layer) -> Self {
        ProjectEntity::Layer(entity)
    }
}

impl From<Role> for ProjectEntity {
    fn from(entity: Role) -> Self {
        ProjectEntity::Role(entity)
    }
}

/// A loaded project and the child documents registered with it.
#[derive(Debug, Clone)]
pub struct Project {
    pub document: Document<ProjectData>,
    children: BTreeMap<DocumentType, HashMap<String, ProjectEntity>>,
}

impl Project {
    /// Wraps a project document with an empty aggregate.
    pub fn new(document: Document<ProjectData>) -> Self {
        Self {
            document,
            children: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.document.id()
    }

    pub fn data(&self) -> &ProjectData {
        &self.document.data
    }

    pub fn data_mut(&mut self) -> &mut ProjectData {
        &mut self.document.data
    }

    /// `project/<id>/`, the prefix of every child collection.
    pub fn full_path(&self) -> String {
        self.document.full_path()
    }

    pub fn scope(&self) -> ProjectScope {
        ProjectScope {
            project_id: self.id().to_string(),
            full_path: self.full_path(),
            owner_id: self.get_owner().ok().map(|owner| owner.account_id.clone()),
        }
    }

    /// Registers a child document. Fails with `Conflict` if the same type and id
    /// is already present, leaving the registered document in place.
    pub fn add_document(&mut self, entity: impl Into<ProjectEntity>) -> Result<(), CoreError> {
        let entity = entity.into();
        if entity.project_id() != self.id() {
            return Err(CoreError::Precondition(format!(
                "{} \"{}\" belongs to project \"{}\", not \"{}\"",
                entity.document_type(),
                entity.id(),
                entity.project_id(),
                self.id()
            )));
        }
        let documents = self.children.entry(entity.document_type()).or_default();
        if documents.contains_key(entity.id()) {
            return Err(CoreError::Conflict {
                entity_type: entity.document_type().to_string(),
                entity_id: entity.id().to_string(),
                reason: format!("is already part of the project \"{}\"", self.document.id()),
            });
        }
        documents.insert(entity.id().to_string(), entity);
        Ok(())
    }

    pub fn get_document(&self, document_type: DocumentType, id: &str) -> Result<&ProjectEntity, CoreError> {
        self.children
            .get(&document_type)
            .and_then(|documents| documents.get(id))
            .ok_or_else(|| CoreError::not_found(document_type.as_str(), id))
    }

    pub fn get_document_mut(
        &mut self,
        document_type: DocumentType,
        id: &str,
    ) -> Result<&mut ProjectEntity, CoreError> {
        self.children
            .get_mut(&document_type)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| CoreError::not_found(document_type.as_str(), id))
    }

    /// All registered documents of one kind, in no particular order.
    pub fn documents(&self, document_type: DocumentType) -> Vec<&ProjectEntity> {
        self.children
            .get(&document_type)
            .map(|documents| documents.values().collect())
            .unwrap_or_default()
    }

    /// Replaces every registered document of one kind.
    pub fn set_documents(
        &mut self,
        document_type: DocumentType,
        entities: Vec<ProjectEntity>,
    ) -> Result<(), CoreError> {
        let mut documents = HashMap::with_capacity(entities.len());
        for entity in entities {
            if entity.document_type() != document_type {
                return Err(CoreError::Precondition(format!(
                    "cannot register {} \"{}\" as {}",
                    entity.document_type(),
                    entity.id(),
                    document_type
                )));
            }
            documents.insert(entity.id().to_string(), entity);
        }
        self.children.insert(document_type, documents);
        Ok(())
    }

    pub fn remove_document(&mut self, document_type: DocumentType, id: &str) -> Option<ProjectEntity> {
        self.children
            .get_mut(&document_type)
            .and_then(|documents| documents.remove(id))
    }

    pub fn connections(&self) -> Vec<&Connection> {
        let mut connections: Vec<&Connection> = self
            .documents(DocumentType::Connection)
            .into_iter()
            .filter_map(|entity| match entity {
                ProjectEntity::Connection(connection) => Some(connection),
                _ => None,
            })
            .collect();
        sort_by_name(&mut connections);
        connections
    }

    pub fn diagrams(&self) -> Vec<&Diagram> {
        let mut diagrams: Vec<&Diagram> = self
            .documents(DocumentType::Diagram)
            .into_iter()
            .filter_map(|entity| match entity {
                ProjectEntity::Diagram(diagram) => Some(diagram),
                _ => None,
            })
            .collect();
        sort_by_name(&mut diagrams);
        diagrams
    }

    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self
            .documents(DocumentType::Layer)
            .into_iter()
            .filter_map(|entity| match entity {
                ProjectEntity::Layer(layer) => Some(layer),
                _ => None,
            })
            .collect();
        sort_by_name(&mut layers);
        layers
    }

    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self
            .documents(DocumentType::Role)
            .into_iter()
            .filter_map(|entity| match entity {
                ProjectEntity::Role(role) => Some(role),
                _ => None,
            })
            .collect();
        sort_by_name(&mut roles);
        roles
    }

    pub fn connection(&self, id: &str) -> Result<&Connection, CoreError> {
        match self.get_document(DocumentType::Connection, id)? {
            ProjectEntity::Connection(connection) => Ok(connection),
            _ => Err(CoreError::not_found(DocumentType::Connection.as_str(), id)),
        }
    }

    pub fn connection_mut(&mut self, id: &str) -> Result<&mut Connection, CoreError> {
        match self.get_document_mut(DocumentType::Connection, id)? {
            ProjectEntity::Connection(connection) => Ok(connection),
            _ => Err(CoreError::not_found(DocumentType::Connection.as_str(), id)),
        }
    }

    pub fn diagram(&self, id: &str) -> Result<&Diagram, CoreError> {
        match self.get_document(DocumentType::Diagram, id)? {
            ProjectEntity::Diagram(diagram) => Ok(diagram),
            _ => Err(CoreError::not_found(DocumentType::Diagram.as_str(), id)),
        }
    }

    pub fn diagram_mut(&mut self, id: &str) -> Result<&mut Diagram, CoreError> {
        match self.get_document_mut(DocumentType::Diagram, id)? {
            ProjectEntity::Diagram(diagram) => Ok(diagram),
            _ => Err(CoreError::not_found(DocumentType::Diagram.as_str(), id)),
        }
    }

    pub fn layer(&self, id: &str) -> Result<&Layer, CoreError> {
        match self.get_document(DocumentType::Layer, id)? {
            ProjectEntity::Layer(layer) => Ok(layer),
            _ => Err(CoreError::not_found(DocumentType::Layer.as_str(), id)),
        }
    }

    pub fn layer_mut(&mut self, id: &str) -> Result<&mut Layer, CoreError> {
        match self.get_document_mut(DocumentType::Layer, id)? {
            ProjectEntity::Layer(layer) => Ok(layer),
            _ => Err(CoreError::not_found(DocumentType::Layer.as_str(), id)),
        }
    }

    pub fn role(&self, id: &str) -> Result<&Role, CoreError> {
        match self.get_document(DocumentType::Role, id)? {
            ProjectEntity::Role(role) => Ok(role),
            _ => Err(CoreError::not_found(DocumentType::Role.as_str(), id)),
        }
    }

    pub fn role_mut(&mut self, id: &str) -> Result<&mut Role, CoreError> {
        match self.get_document_mut(DocumentType::Role, id)? {
            ProjectEntity::Role(role) => Ok(role),
            _ => Err(CoreError::not_found(DocumentType::Role.as_str(), id)),
        }
    }

    fn member_with_role(&self, role: ProjectMemberRole) -> Result<&ProjectMember, CoreError> {
        self.data()
            .members
            .iter()
            .find(|member| member.role == role)
            .ok_or_else(|| {
                CoreError::not_found(format!("project {:?}", role).to_lowercase(), self.id())
            })
    }

    pub fn get_owner(&self) -> Result<&ProjectMember, CoreError> {
        self.member_with_role(ProjectMemberRole::Owner)
    }

    pub fn get_manager(&self) -> Result<&ProjectMember, CoreError> {
        self.member_with_role(ProjectMemberRole::Manager)
    }

    /// Role of the account `caller`. Fails with `NotFound` for non-members.
    pub fn get_own_role(&self, caller: &str) -> Result<ProjectMemberRole, CoreError> {
        self.data()
            .members
            .iter()
            .find(|member| member.account_id == caller)
            .map(|member| member.role)
            .ok_or_else(|| CoreError::not_found("project member", caller))
    }

    /// Whether `caller` is a member holding one of `roles`.
    pub fn has_role(&self, caller: &str, roles: &[ProjectMemberRole]) -> bool {
        self.data()
            .members
            .iter()
            .any(|member| member.account_id == caller && roles.contains(&member.role))
    }
}

impl Identifiable for Project {
    fn id(&self) -> &str {
        self.document.id()
    }
}

impl Named for Project {
    fn name(&self) -> String {
        self.data().common.name.clone()
    }
}
