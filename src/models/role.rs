use super::document::{DocumentCommonData, DocumentData, DocumentMetaData, Named};
use super::enums::Permission;
use super::project_document::ProjectDocument;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleData {
    pub common: DocumentCommonData,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMetaData>,
}

impl RoleData {
    pub fn new(common: DocumentCommonData, permissions: Vec<Permission>) -> Self {
        Self {
            common,
            permissions,
            meta: None,
        }
    }
}

impl DocumentData for RoleData {
    fn meta(&self) -> Option<&DocumentMetaData> {
        self.meta.as_ref()
    }

    fn meta_slot(&mut self) -> Option<&mut Option<DocumentMetaData>> {
        Some(&mut self.meta)
    }
}

pub type Role = ProjectDocument<RoleData>;

impl Named for Role {
    fn name(&self) -> String {
        self.data().common.name.clone()
    }
}
