//! Unit tests for project membership rules and the project aggregate.

use cdwa_core::CoreError;
use cdwa_core::models::{
    Diagram, DiagramData, DiagramType, Document, DocumentCommonData, DocumentType, Layer,
    LayerData, LayerType, Project, ProjectData, ProjectEntity, ProjectMember, ProjectMemberRole,
    Role, RoleData, create_access_list, validate_members,
};

fn members() -> Vec<ProjectMember> {
    vec![
        ProjectMember::new("owner-1", "Olga Owner", ProjectMemberRole::Owner),
        ProjectMember::new("dev-1", "Dev One", ProjectMemberRole::Developer),
        ProjectMember::new("mgr-1", "Max Manager", ProjectMemberRole::Manager),
    ]
}

fn project() -> Project {
    let data = ProjectData::new(DocumentCommonData::new("Warehouse", None), members(), vec![]);
    Project::new(Document::new("p1", "project", data).unwrap())
}

fn diagram(project: &Project, id: &str, name: &str) -> Diagram {
    let data = DiagramData::new(DocumentCommonData::new(name, None), DiagramType::Architecture);
    let path = project.scope().collection_path(DocumentType::Diagram);
    Diagram::new(Document::new(id, path, data).unwrap(), project.id())
}

fn layer(project: &Project, id: &str, name: &str) -> Layer {
    let data = LayerData::new(DocumentCommonData::new(name, None), LayerType::FileStorage, vec![]);
    let path = project.scope().collection_path(DocumentType::Layer);
    Layer::new(Document::new(id, path, data).unwrap(), project.id())
}

fn role(project: &Project, id: &str, name: &str) -> Role {
    let data = RoleData::new(DocumentCommonData::new(name, None), vec![]);
    let path = project.scope().collection_path(DocumentType::Role);
    Role::new(Document::new(id, path, data).unwrap(), project.id())
}

#[test]
fn test_access_list_deduplicates_members() {
    let members = vec![
        ProjectMember::new("A", "Ann", ProjectMemberRole::Owner),
        ProjectMember::new("B", "Ben", ProjectMemberRole::Developer),
        ProjectMember::new("A", "Ann", ProjectMemberRole::Visitor),
    ];
    assert_eq!(create_access_list(&members), vec!["A", "B"]);

    let mut reversed = members.clone();
    reversed.reverse();
    let mut access = create_access_list(&reversed);
    access.sort();
    assert_eq!(access, vec!["A", "B"]);
}

#[test]
fn test_project_data_derives_access() {
    let mut data = ProjectData::new(DocumentCommonData::new("W", None), members(), vec![]);
    assert_eq!(data.access, vec!["owner-1", "dev-1", "mgr-1"]);

    data.members.push(ProjectMember::new("new-1", "Nia", ProjectMemberRole::Visitor));
    data.refresh_access();
    assert!(data.access.contains(&"new-1".to_string()));
}

#[test]
fn test_member_validation() {
    assert!(validate_members(&members()).is_ok());

    let no_owner = vec![ProjectMember::new("a", "A", ProjectMemberRole::Developer)];
    assert!(matches!(validate_members(&no_owner), Err(CoreError::InvalidMembers(_))));

    let two_owners = vec![
        ProjectMember::new("a", "A", ProjectMemberRole::Owner),
        ProjectMember::new("b", "B", ProjectMemberRole::Owner),
    ];
    assert!(matches!(validate_members(&two_owners), Err(CoreError::InvalidMembers(_))));
}

#[test]
fn test_owner_and_manager_lookup() {
    let project = project();
    assert_eq!(project.get_owner().unwrap().account_id, "owner-1");
    assert_eq!(project.get_manager().unwrap().account_id, "mgr-1");

    let data = ProjectData::new(
        DocumentCommonData::new("No manager", None),
        vec![ProjectMember::new("o", "O", ProjectMemberRole::Owner)],
        vec![],
    );
    let without_manager = Project::new(Document::new("p2", "project", data).unwrap());
    assert!(without_manager.get_manager().unwrap_err().is_not_found());
}

#[test]
fn test_own_role_and_has_role() {
    let project = project();
    assert_eq!(project.get_own_role("dev-1").unwrap(), ProjectMemberRole::Developer);
    assert!(project.get_own_role("stranger").unwrap_err().is_not_found());

    assert!(project.has_role("owner-1", &[ProjectMemberRole::Owner, ProjectMemberRole::Manager]));
    assert!(!project.has_role("dev-1", &[ProjectMemberRole::Owner, ProjectMemberRole::Manager]));
    assert!(!project.has_role("stranger", &[ProjectMemberRole::Visitor]));
}

#[test]
fn test_scope_and_paths() {
    let project = project();
    assert_eq!(project.full_path(), "project/p1/");
    let scope = project.scope();
    assert_eq!(scope.project_id, "p1");
    assert_eq!(scope.owner_id().unwrap(), "owner-1");
    assert_eq!(scope.collection_path(DocumentType::Connection), "project/p1/connection");
}

#[test]
fn test_add_document_registers_once() {
    let mut project = project();
    let first = diagram(&project, "d1", "Overview");
    project.add_document(first.clone()).unwrap();

    let mut renamed = first.clone();
    renamed.data_mut().common.name = "Replacement".to_string();
    let err = project.add_document(renamed).unwrap_err();
    assert!(err.is_conflict());

    // The originally registered document stays in place.
    assert_eq!(project.diagram("d1").unwrap().data().common.name, "Overview");
}

#[test]
fn test_same_id_in_different_kinds() {
    let mut project = project();
    project.add_document(diagram(&project, "x", "D")).unwrap();
    project.add_document(layer(&project, "x", "L")).unwrap();
    assert_eq!(project.documents(DocumentType::Diagram).len(), 1);
    assert_eq!(project.documents(DocumentType::Layer).len(), 1);
}

#[test]
fn test_add_document_of_another_project() {
    let mut project = project();
    let data = DiagramData::new(DocumentCommonData::new("D", None), DiagramType::Architecture);
    let foreign = Diagram::new(Document::new("d9", "project/p9/diagram", data).unwrap(), "p9");
    assert!(matches!(
        project.add_document(foreign),
        Err(CoreError::Precondition(_))
    ));
}

#[test]
fn test_get_and_remove_document() {
    let mut project = project();
    project.add_document(role(&project, "r1", "Visitor")).unwrap();

    match project.get_document(DocumentType::Role, "r1").unwrap() {
        ProjectEntity::Role(role) => assert_eq!(role.data().common.name, "Visitor"),
        other => panic!("unexpected entity {:?}", other),
    }
    assert!(project.get_document(DocumentType::Role, "r2").unwrap_err().is_not_found());
    assert!(project.layer("r1").unwrap_err().is_not_found());

    assert!(project.remove_document(DocumentType::Role, "r1").is_some());
    assert!(project.remove_document(DocumentType::Role, "r1").is_none());
    assert!(project.roles().is_empty());
}

#[test]
fn test_typed_accessors_sort_by_name() {
    let mut project = project();
    project.add_document(layer(&project, "l1", "staging")).unwrap();
    project.add_document(layer(&project, "l2", "Bronze")).unwrap();
    project.add_document(layer(&project, "l3", "raw")).unwrap();

    let names: Vec<String> = project
        .layers()
        .iter()
        .map(|layer| layer.data().common.name.clone())
        .collect();
    assert_eq!(names, vec!["Bronze", "raw", "staging"]);
}

#[test]
fn test_set_documents_replaces_one_kind() {
    let mut project = project();
    project.add_document(diagram(&project, "d1", "Old")).unwrap();
    project.add_document(role(&project, "r1", "Visitor")).unwrap();

    let loaded = vec![
        ProjectEntity::from(diagram(&project, "d2", "New A")),
        ProjectEntity::from(diagram(&project, "d3", "New B")),
    ];
    project.set_documents(DocumentType::Diagram, loaded).unwrap();
    assert!(project.diagram("d1").is_err());
    assert_eq!(project.diagrams().len(), 2);
    assert_eq!(project.roles().len(), 1);

    let wrong_kind = vec![ProjectEntity::from(role(&project, "r2", "Other"))];
    assert!(project.set_documents(DocumentType::Diagram, wrong_kind).is_err());
    assert_eq!(project.diagrams().len(), 2);
}

#[test]
fn test_project_wire_format() {
    let project = project();
    let value = serde_json::to_value(project.data()).unwrap();
    assert_eq!(value["members"][0]["accountId"], "owner-1");
    assert_eq!(value["members"][0]["role"], "owner");
    assert_eq!(value["access"][1], "dev-1");
}
