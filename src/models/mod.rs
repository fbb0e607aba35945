// Models module - documents, project aggregate and diagram node tree

pub mod account;
pub mod connection;
pub mod diagram;
pub mod document;
pub mod enums;
pub mod layer;
pub mod project;
pub mod project_document;
pub mod role;

pub use account::{Account, AccountData, AccountPreferences, AccountProfile, AccountState};
pub use connection::{
    Connection, ConnectionData, ConnectionProperties, ConnectionTestResult, ConnectionTestStatus,
    S3Properties, SnowflakeProperties,
};
pub use diagram::{Diagram, DiagramData, DiagramEdge, DiagramHandle, DiagramNode, Viewport};
pub use document::{
    extract_document_type, extract_parent_path, sort_by_name, AttributeValue, Document,
    DocumentAttribute, DocumentCommonData, DocumentData, DocumentMetaData, Identifiable,
    MetaStamp, Named,
};
pub use enums::*;
pub use layer::{Layer, LayerData};
pub use project::{
    create_access_list, validate_members, Project, ProjectData, ProjectEntity, ProjectMember,
};
pub use project_document::{Dimension, NodeEntity, Position, ProjectDocument, ProjectScope};
pub use role::{Role, RoleData};
