//! Integration tests for generic document persistence.

#[path = "../common/mod.rs"]
mod common;

use cdwa_core::CoreError;
use cdwa_core::models::{
    DiagramData, DiagramType, DocumentCommonData, DocumentType, Layer, LayerData, LayerType,
    Project, ProjectData, ProjectMember, ProjectMemberRole,
};
use cdwa_core::services::{AuthError, DocumentService};
use cdwa_core::storage::{DocumentStore, MemoryDocumentStore, QueryFilter};
use common::{FailingDeleteStore, Fixture};
use serde_json::json;
use std::sync::Arc;

fn project_data(name: &str, owner: &str) -> ProjectData {
    ProjectData::new(
        DocumentCommonData::new(name, None),
        vec![ProjectMember::new(owner, "Owner", ProjectMemberRole::Owner)],
        vec![],
    )
}

async fn create_project(documents: &DocumentService, owner: &str) -> Project {
    let document = documents
        .create_document("project", project_data("Warehouse", owner), None)
        .await
        .unwrap();
    Project::new(document)
}

#[tokio::test]
async fn test_create_stamps_creator() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada Lovelace").await;
    let documents = fixture.state.documents();

    let document = documents
        .create_document("project", project_data("Warehouse", &user), None)
        .await
        .unwrap();
    let meta = document.meta().unwrap();
    assert_eq!(meta.created.by, "Ada Lovelace");
    assert!(meta.altered.is_none());

    let raw = fixture.raw("project", document.id()).await;
    assert_eq!(raw["meta"]["created"]["by"], "Ada Lovelace");
    assert_eq!(raw["access"], json!([user]));
}

#[tokio::test]
async fn test_create_with_explicit_id() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();

    let document = documents
        .create_document("project", project_data("W", &user), Some("fixed-id"))
        .await
        .unwrap();
    assert_eq!(document.id(), "fixed-id");
    assert_eq!(document.record_path(), "project/fixed-id");
    assert!(fixture.store.get("project", "fixed-id").await.is_ok());
}

#[tokio::test]
async fn test_create_rejects_invalid_paths() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();

    let bad_type = documents
        .create_document("projects", project_data("W", &user), None)
        .await;
    assert!(matches!(bad_type, Err(CoreError::InvalidPath(_))));

    let bad_id = documents
        .create_document("project", project_data("W", &user), Some("a/b"))
        .await;
    assert!(matches!(bad_id, Err(CoreError::InvalidPath(_))));
}

#[tokio::test]
async fn test_stamping_needs_a_session() {
    let fixture = Fixture::new();
    let documents = fixture.state.documents();
    let result = documents
        .create_document("project", project_data("W", "someone"), None)
        .await;
    assert!(matches!(result, Err(CoreError::Auth(AuthError::NoSession))));
}

#[tokio::test]
async fn test_load_missing_document_is_not_found() {
    let fixture = Fixture::new();
    let documents = fixture.state.documents();
    let err = documents
        .load::<ProjectData>("project", "missing", None)
        .await
        .unwrap_err();
    match err {
        CoreError::NotFound {
            entity_type,
            entity_id,
        } => {
            assert_eq!(entity_type, "project");
            assert_eq!(entity_id, "missing");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_update_stamps_altered_and_runs_processor() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let mut project = create_project(&documents, &user).await;

    project.data_mut().members.push(ProjectMember::new(
        "bob",
        "Bob",
        ProjectMemberRole::Developer,
    ));
    documents
        .update(
            &mut project.document,
            Some(&|data: &mut ProjectData| data.refresh_access()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(project.data().access, vec![user.clone(), "bob".to_string()]);
    let altered = project.data().meta.as_ref().unwrap().altered.as_ref().unwrap();
    assert_eq!(altered.by, "Ada");

    let loaded = documents
        .load::<ProjectData>("project", project.id(), None)
        .await
        .unwrap();
    assert_eq!(loaded.data, project.document.data);
}

#[tokio::test]
async fn test_update_with_replacement_keeps_metadata() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let mut project = create_project(&documents, &user).await;

    let replacement = project_data("Renamed", &user);
    documents
        .update(&mut project.document, None, Some(&replacement))
        .await
        .unwrap();

    let raw = fixture.raw("project", project.id()).await;
    assert_eq!(raw["common"]["name"], "Renamed");
    assert_eq!(raw["meta"]["created"]["by"], "Ada");
    assert_eq!(raw["meta"]["altered"]["by"], "Ada");
}

#[tokio::test]
async fn test_update_and_delete_of_removed_record() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let mut project = create_project(&documents, &user).await;

    documents.delete(&project.document).await.unwrap();
    assert!(
        documents
            .load::<ProjectData>("project", project.id(), None)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(documents.delete(&project.document).await.unwrap_err().is_not_found());
    assert!(
        documents
            .update(&mut project.document, None, None)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_query_filters_by_array_membership() {
    let fixture = Fixture::new();
    fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();

    for (name, owner) in [("A", "u1"), ("B", "u2"), ("C", "u1")] {
        documents
            .create_document("project", project_data(name, owner), None)
            .await
            .unwrap();
    }

    let mine = documents
        .query::<ProjectData>(
            "project",
            &[QueryFilter::array_contains("access", "u1")],
            None,
        )
        .await
        .unwrap();
    let mut names: Vec<&str> = mine.iter().map(|p| p.data.common.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["A", "C"]);

    let all = documents.query::<ProjectData>("project", &[], None).await.unwrap();
    assert_eq!(all.len(), 3);
    let empty = documents
        .query::<LayerData>("project/x/layer", &[], None)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_project_documents_live_below_the_project() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let project = create_project(&documents, &user).await;
    let scope = project.scope();

    let data = LayerData::new(DocumentCommonData::new("raw", None), LayerType::FileStorage, vec![]);
    let layer: Layer = documents
        .create_project_document(&scope, DocumentType::Layer, data, None)
        .await
        .unwrap();
    assert_eq!(layer.path(), format!("project/{}/layer", project.id()));
    assert_eq!(layer.project_id(), project.id());
    assert_eq!(fixture.store.len(layer.path()).await, 1);

    let loaded = documents
        .load_project_document::<LayerData>(&scope, DocumentType::Layer, layer.id(), None)
        .await
        .unwrap();
    assert_eq!(loaded, layer);

    let all = documents
        .query_project_documents::<LayerData>(&scope, DocumentType::Layer, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_update_project_document_of_another_project() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let first = create_project(&documents, &user).await;
    let second = create_project(&documents, &user).await;

    let data = DiagramData::new(DocumentCommonData::new("D", None), DiagramType::Architecture);
    let mut diagram = documents
        .create_project_document(&first.scope(), DocumentType::Diagram, data, None)
        .await
        .unwrap();
    let result = documents
        .update_project_document(&mut diagram, &second.scope(), None, None)
        .await;
    assert!(matches!(result, Err(CoreError::Precondition(_))));
}

#[tokio::test]
async fn test_update_project_document_with_replacement() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let project = create_project(&documents, &user).await;
    let scope = project.scope();

    let data = LayerData::new(DocumentCommonData::new("raw", None), LayerType::FileStorage, vec![]);
    let mut layer: Layer = documents
        .create_project_document(&scope, DocumentType::Layer, data, None)
        .await
        .unwrap();

    let mut replacement = layer.data().clone();
    replacement.common.name = "curated".to_string();
    replacement.meta = None;
    documents
        .update_project_document(&mut layer, &scope, None, Some(&replacement))
        .await
        .unwrap();

    let raw = fixture.raw(layer.path(), layer.id()).await;
    assert_eq!(raw["common"]["name"], "curated");
    assert_eq!(raw["meta"]["created"]["by"], "Ada");
    assert_eq!(raw["meta"]["altered"]["by"], "Ada");
    // The document keeps its own payload and receives the stamp.
    assert_eq!(layer.data().common.name, "raw");
    assert!(layer.data().meta.as_ref().unwrap().altered.is_some());
}

#[tokio::test]
async fn test_delete_document_requires_registration() {
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = fixture.state.documents();
    let mut project = create_project(&documents, &user).await;

    let data = DiagramData::new(DocumentCommonData::new("D", None), DiagramType::Architecture);
    let diagram = documents
        .create_project_document(&project.scope(), DocumentType::Diagram, data, None)
        .await
        .unwrap();

    // Stored but not registered with the aggregate: nothing is deleted.
    let err = documents
        .delete_document(&mut project, DocumentType::Diagram, diagram.id())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(fixture.store.get(diagram.path(), diagram.id()).await.is_ok());

    project.add_document(diagram.clone()).unwrap();
    documents
        .delete_document(&mut project, DocumentType::Diagram, diagram.id())
        .await
        .unwrap();
    assert!(project.diagram(diagram.id()).is_err());
    assert!(fixture.store.get(diagram.path(), diagram.id()).await.is_err());
}

#[tokio::test]
async fn test_failed_store_delete_keeps_the_aggregate() {
    let store = Arc::new(FailingDeleteStore {
        inner: MemoryDocumentStore::new(),
    });
    let fixture = Fixture::new();
    let user = fixture.sign_up("ada@example.com", "Ada").await;
    let documents = DocumentService::new(store.clone(), fixture.auth.clone());
    let mut project = create_project(&documents, &user).await;

    let data = DiagramData::new(DocumentCommonData::new("D", None), DiagramType::Architecture);
    let diagram = documents
        .create_project_document(&project.scope(), DocumentType::Diagram, data, None)
        .await
        .unwrap();
    project.add_document(diagram.clone()).unwrap();

    let err = documents
        .delete_document(&mut project, DocumentType::Diagram, diagram.id())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));
    assert!(project.diagram(diagram.id()).is_ok());
}
