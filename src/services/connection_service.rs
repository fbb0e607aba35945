//! Connections of a project.

use super::document_service::DocumentService;
use super::secret_service::{ConnectionSecrets, SecretCipher};
use crate::error::CoreError;
use crate::models::{
    Connection, ConnectionData, ConnectionProperties, ConnectionTestResult, DocumentAttribute,
    DocumentCommonData, DocumentType, Project, ProjectEntity, ProjectScope,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Tests connectivity with plaintext connection properties.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    async fn test_connection(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<ConnectionTestResult, CoreError>;
}

#[derive(Clone)]
pub struct ConnectionService {
    documents: DocumentService,
    secrets: ConnectionSecrets,
    tester: Option<Arc<dyn ConnectionTester>>,
}

impl ConnectionService {
    pub fn new(
        documents: DocumentService,
        cipher: Arc<dyn SecretCipher>,
        tester: Option<Arc<dyn ConnectionTester>>,
    ) -> Self {
        Self {
            documents,
            secrets: ConnectionSecrets::new(cipher),
            tester,
        }
    }

    /// Creates a connection and registers it with `project`. Only ciphertext
    /// reaches the store; the returned connection holds plaintext.
    pub async fn create_connection(
        &self,
        project: &mut Project,
        name: &str,
        description: Option<String>,
        properties: ConnectionProperties,
        attributes: Vec<DocumentAttribute>,
    ) -> Result<Connection, CoreError> {
        let data = ConnectionData::new(
            DocumentCommonData::new(name, description),
            properties,
            attributes,
        );
        let connection = self
            .documents
            .create_project_document(
                &project.scope(),
                DocumentType::Connection,
                data,
                Some(&self.secrets),
            )
            .await?;
        project.add_document(connection.clone())?;
        info!(
            "Created {} connection {} in project {}",
            connection.data().application().as_str(),
            connection.id(),
            project.id()
        );
        Ok(connection)
    }

    /// Re-encrypts and writes a connection; `connection` keeps its plaintext.
    pub async fn update_connection(
        &self,
        connection: &mut Connection,
        scope: &ProjectScope,
    ) -> Result<(), CoreError> {
        self.documents
            .update_project_document(connection, scope, Some(&self.secrets), None)
            .await
    }

    /// Loads and decrypts one connection.
    pub async fn load_connection(
        &self,
        scope: &ProjectScope,
        id: &str,
    ) -> Result<Connection, CoreError> {
        self.documents
            .load_project_document::<ConnectionData>(
                scope,
                DocumentType::Connection,
                id,
                Some(&self.secrets),
            )
            .await
    }

    /// Loads and decrypts all connections into the aggregate of `project`.
    pub async fn load_connections(&self, project: &mut Project) -> Result<(), CoreError> {
        let connections: Vec<Connection> = self
            .documents
            .query_project_documents::<ConnectionData>(
                &project.scope(),
                DocumentType::Connection,
                Some(&self.secrets),
            )
            .await?;
        project.set_documents(
            DocumentType::Connection,
            connections.into_iter().map(ProjectEntity::from).collect(),
        )
    }

    pub async fn delete_connection(&self, project: &mut Project, id: &str) -> Result<(), CoreError> {
        self.documents
            .delete_document(project, DocumentType::Connection, id)
            .await
    }

    /// Runs the remote connection test with the plaintext properties.
    pub async fn test_connection(
        &self,
        connection: &Connection,
    ) -> Result<ConnectionTestResult, CoreError> {
        let tester = self.tester.as_ref().ok_or_else(|| {
            CoreError::Precondition("no connection tester is configured".to_string())
        })?;
        let result = tester.test_connection(&connection.data().properties).await?;
        info!(
            "Tested connection {}: {:?}",
            connection.id(),
            result.status
        );
        Ok(result)
    }
}
