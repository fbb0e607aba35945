//! Application state management.
//!
//! Holds the document store and the external collaborators, and hands out
//! the entity services built on top of them.

use crate::config::CoreConfig;
use crate::services::{
    AccountService, AuthProvider, ConnectionService, ConnectionTester, DiagramService,
    DocumentService, FunctionsClient, LayerService, ProjectDeleter, ProjectService, RoleService,
    SecretCipher,
};
use crate::storage::{
    DocumentStore, MemoryDocumentStore, PostgresDocumentStore, SqliteDocumentStore,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared state of one session of the document core.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub cipher: Arc<dyn SecretCipher>,
    pub tester: Option<Arc<dyn ConnectionTester>>,
    pub deleter: Option<Arc<dyn ProjectDeleter>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        cipher: Arc<dyn SecretCipher>,
    ) -> Self {
        Self {
            store,
            auth,
            cipher,
            tester: None,
            deleter: None,
        }
    }

    pub fn with_tester(mut self, tester: Arc<dyn ConnectionTester>) -> Self {
        self.tester = Some(tester);
        self
    }

    pub fn with_deleter(mut self, deleter: Arc<dyn ProjectDeleter>) -> Self {
        self.deleter = Some(deleter);
        self
    }

    /// Builds the state from configuration.
    ///
    /// Uses PostgreSQL if `database_url` is set, otherwise SQLite if
    /// `sqlite_path` is set, otherwise an in-memory store. The remote
    /// procedure client serves as cipher, connection tester and project
    /// deleter.
    pub async fn from_config(config: &CoreConfig, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        let store = Self::open_store(config).await?;

        let functions_url = config
            .functions_url
            .as_deref()
            .context("CDWA_FUNCTIONS_URL is not configured")?;
        let functions = Arc::new(
            FunctionsClient::new(
                functions_url,
                Duration::from_secs(config.http_timeout_secs),
                auth.clone(),
            )
            .context("Failed to create remote procedure client")?,
        );

        Ok(Self::new(store, auth, functions.clone())
            .with_tester(functions.clone())
            .with_deleter(functions))
    }

    async fn open_store(config: &CoreConfig) -> Result<Arc<dyn DocumentStore>> {
        if let Some(database_url) = config.database_url.as_deref() {
            let store = PostgresDocumentStore::connect(database_url)
                .await
                .context("Failed to open PostgreSQL document store")?;
            info!("Using PostgreSQL document store");
            return Ok(Arc::new(store));
        }
        if let Some(path) = config.sqlite_path.as_deref() {
            let store = SqliteDocumentStore::open(path).with_context(|| {
                format!("Failed to open SQLite document store {}", path.display())
            })?;
            info!("Using SQLite document store at {}", path.display());
            return Ok(Arc::new(store));
        }
        info!("Using in-memory document store");
        Ok(Arc::new(MemoryDocumentStore::new()))
    }

    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.store.clone(), self.auth.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.documents())
    }

    pub fn connections(&self) -> ConnectionService {
        ConnectionService::new(self.documents(), self.cipher.clone(), self.tester.clone())
    }

    pub fn diagrams(&self) -> DiagramService {
        DiagramService::new(self.documents())
    }

    pub fn layers(&self) -> LayerService {
        LayerService::new(self.documents())
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.documents())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.documents(), self.connections(), self.deleter.clone())
    }
}
