//! Integration tests for the project lifecycle and membership queries.

#[path = "../common/mod.rs"]
mod common;

use cdwa_core::CoreError;
use cdwa_core::models::{
    DiagramType, DocumentType, LayerType, ProjectMember, ProjectMemberRole,
};
use cdwa_core::services::{AuthError, ConnectionService, NewProject, ProjectService};
use common::Fixture;
use serde_json::json;

fn new_project(name: &str, owner: &str, others: &[(&str, ProjectMemberRole)]) -> NewProject {
    let mut members = vec![ProjectMember::new(owner, "Owner", ProjectMemberRole::Owner)];
    for (account, role) in others {
        members.push(ProjectMember::new(*account, *account, *role));
    }
    NewProject::new(name, Some(format!("{} project", name)), members, vec![])
}

#[tokio::test]
async fn test_create_project_derives_access() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();

    let project = projects
        .create_project(new_project(
            "Warehouse",
            &me,
            &[("bob", ProjectMemberRole::Developer), (me.as_str(), ProjectMemberRole::Visitor)],
        ))
        .await
        .unwrap();

    assert_eq!(project.data().access, vec![me.clone(), "bob".to_string()]);
    let raw = fixture.raw("project", project.id()).await;
    assert_eq!(raw["access"], json!([me, "bob"]));
    assert_eq!(raw["members"].as_array().unwrap().len(), 3);
    assert_eq!(project.full_path(), format!("project/{}/", project.id()));
}

#[tokio::test]
async fn test_create_project_validates_members() {
    let fixture = Fixture::new();
    fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();

    let no_owner = NewProject::new(
        "W",
        None,
        vec![ProjectMember::new("bob", "Bob", ProjectMemberRole::Developer)],
        vec![],
    );
    assert!(matches!(
        projects.create_project(no_owner).await,
        Err(CoreError::InvalidMembers(_))
    ));

    let two_managers = new_project(
        "W",
        "o",
        &[("m1", ProjectMemberRole::Manager), ("m2", ProjectMemberRole::Manager)],
    );
    assert!(matches!(
        projects.create_project(two_managers).await,
        Err(CoreError::InvalidMembers(_))
    ));
    assert_eq!(fixture.store.len("project").await, 0);
}

#[tokio::test]
async fn test_create_project_with_visitor_role() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();

    let project = projects
        .create_project(new_project("Warehouse", &me, &[]).with_visitor_role("Visitor", None))
        .await
        .unwrap();

    let roles = project.roles();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].data().common.name, "Visitor");
    assert!(roles[0].data().permissions.is_empty());
    let path = project.scope().collection_path(DocumentType::Role);
    assert_eq!(fixture.store.len(&path).await, 1);
}

#[tokio::test]
async fn test_update_project_recomputes_access() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();
    let mut project = projects
        .create_project(new_project("Warehouse", &me, &[("bob", ProjectMemberRole::Developer)]))
        .await
        .unwrap();

    {
        let data = project.data_mut();
        data.members.retain(|member| member.account_id != "bob");
        data.members
            .push(ProjectMember::new("carol", "Carol", ProjectMemberRole::Manager));
        // hand edits of the access list are discarded
        data.access.push("mallory".to_string());
    }
    projects.update_project(&mut project).await.unwrap();

    assert_eq!(project.data().access, vec![me.clone(), "carol".to_string()]);
    let raw = fixture.raw("project", project.id()).await;
    assert_eq!(raw["access"], json!([me, "carol"]));
    assert_eq!(raw["meta"]["altered"]["by"], "Ada");
}

#[tokio::test]
async fn test_update_project_validates_members() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();
    let mut project = projects
        .create_project(new_project("Warehouse", &me, &[]))
        .await
        .unwrap();

    project.data_mut().members.clear();
    assert!(matches!(
        projects.update_project(&mut project).await,
        Err(CoreError::InvalidMembers(_))
    ));
    let raw = fixture.raw("project", project.id()).await;
    assert_eq!(raw["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_load_projects_only_returns_accessible_ones() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();

    projects
        .create_project(new_project("zeta", &me, &[]))
        .await
        .unwrap();
    projects
        .create_project(new_project("Alpha", "someone-else", &[(me.as_str(), ProjectMemberRole::Visitor)]))
        .await
        .unwrap();
    projects
        .create_project(new_project("Hidden", "someone-else", &[]))
        .await
        .unwrap();

    let visible = projects.load_projects().await.unwrap();
    let names: Vec<&str> = visible
        .iter()
        .map(|project| project.data().common.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "zeta"]);
}

#[tokio::test]
async fn test_load_projects_needs_a_session() {
    let fixture = Fixture::new();
    fixture.sign_up("ada@example.com", "Ada").await;
    fixture.auth.sign_out().unwrap();
    assert!(matches!(
        fixture.state.projects().load_projects().await,
        Err(CoreError::Auth(AuthError::NoSession))
    ));
}

#[tokio::test]
async fn test_load_project_assembles_the_aggregate() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let mut project = fixture
        .state
        .projects()
        .create_project(new_project("Warehouse", &me, &[]).with_visitor_role("Visitor", None))
        .await
        .unwrap();
    fixture
        .state
        .diagrams()
        .create_diagram(&mut project, "Overview", None, DiagramType::Architecture)
        .await
        .unwrap();
    fixture
        .state
        .layers()
        .create_layer(&mut project, "raw", None, LayerType::FileStorage, vec![])
        .await
        .unwrap();

    let loaded = fixture.state.projects().load_project(project.id()).await.unwrap();
    assert_eq!(loaded.data(), project.data());
    assert_eq!(loaded.diagrams().len(), 1);
    assert_eq!(loaded.layers().len(), 1);
    assert_eq!(loaded.roles().len(), 1);
    assert!(loaded.connections().is_empty());
    assert_eq!(loaded.diagrams()[0], project.diagrams()[0]);
}

#[tokio::test]
async fn test_load_missing_project() {
    let fixture = Fixture::new();
    fixture.sign_up("ada@example.com", "Ada").await;
    let err = fixture.state.projects().load_project("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_own_role_and_has_role() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();
    let project = projects
        .create_project(new_project("W", "someone-else", &[(me.as_str(), ProjectMemberRole::Maintainer)]))
        .await
        .unwrap();

    assert_eq!(projects.own_role(&project).unwrap(), ProjectMemberRole::Maintainer);
    assert!(projects.has_role(&project, &[ProjectMemberRole::Maintainer, ProjectMemberRole::Owner]));
    assert!(!projects.has_role(&project, &[ProjectMemberRole::Owner]));

    fixture.auth.sign_out().unwrap();
    assert!(!projects.has_role(&project, &[ProjectMemberRole::Maintainer]));
    assert!(projects.own_role(&project).is_err());
}

#[tokio::test]
async fn test_delete_project_uses_the_privileged_procedure() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();
    let project = projects
        .create_project(new_project("W", &me, &[]))
        .await
        .unwrap();
    let id = project.id().to_string();

    projects.delete_project(project).await.unwrap();
    assert_eq!(*fixture.deleter.deleted.lock().unwrap(), vec![id]);
}

#[tokio::test]
async fn test_delete_project_without_deleter() {
    let fixture = Fixture::new();
    let me = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let projects = ProjectService::new(
        documents.clone(),
        ConnectionService::new(documents, fixture.cipher.clone(), None),
        None,
    );
    let project = projects
        .create_project(new_project("W", &me, &[]))
        .await
        .unwrap();
    assert!(matches!(
        projects.delete_project(project).await,
        Err(CoreError::Precondition(_))
    ));
}

#[tokio::test]
async fn test_owner_and_manager_see_their_own_roles() {
    let fixture = Fixture::new();
    let bob = fixture.sign_up("bob@example.com", "Bob").await;
    let ada = fixture.sign_up("ada@example.com", "Ada").await;
    let projects = fixture.state.projects();
    let members = vec![
        ProjectMember::new(ada.as_str(), "Ada", ProjectMemberRole::Owner),
        ProjectMember::new(bob.as_str(), "Bob", ProjectMemberRole::Manager),
    ];
    projects
        .create_project(NewProject::new("Lake", None, members, vec![]))
        .await
        .unwrap();

    let loaded = projects.load_projects().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].data().common.name, "Lake");
    let project = &loaded[0];
    assert!(projects.has_role(project, &[ProjectMemberRole::Owner]));

    fixture.auth.sign_in("bob@example.com", "secret-password").unwrap();
    assert!(!projects.has_role(project, &[ProjectMemberRole::Owner]));
    assert!(projects.has_role(project, &[ProjectMemberRole::Manager]));
    assert_eq!(projects.load_projects().await.unwrap().len(), 1);
}
