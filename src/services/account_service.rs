//! Accounts and the session watcher.
//!
//! An account is stored under the id of its authentication user. New
//! accounts are locked until an administrator activates them, and a locked
//! account is reported to session watchers exactly like a signed-out user.

use super::auth::{AuthProvider, SessionChange};
use super::document_service::DocumentService;
use crate::error::CoreError;
use crate::models::{
    Account, AccountData, AccountPreferences, AccountProfile, AccountState, DocumentType,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AccountService {
    documents: DocumentService,
}

impl AccountService {
    pub fn new(documents: DocumentService) -> Self {
        Self { documents }
    }

    fn auth(&self) -> &Arc<dyn AuthProvider> {
        self.documents.auth()
    }

    /// Registers the user, sets its display name and stores a locked account.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        preferences: AccountPreferences,
    ) -> Result<Account, CoreError> {
        let user_id = self.auth().register_user(email, password).await?;
        let data = AccountData {
            profile: AccountProfile {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
            },
            preferences,
            state: AccountState::default(),
        };
        self.auth()
            .update_display_name(&user_id, &data.display_name())
            .await?;
        let account = self
            .documents
            .create_document(DocumentType::Account.as_str(), data, Some(&user_id))
            .await?;
        info!("Created account {} (locked)", account.id());
        Ok(account)
    }

    pub async fn load_account(&self, id: &str) -> Result<Account, CoreError> {
        self.documents
            .load::<AccountData>(DocumentType::Account.as_str(), id, None)
            .await
    }

    /// Account of the signed-in user.
    pub async fn load_current_account(&self) -> Result<Account, CoreError> {
        let id = self.auth().current_user_id()?;
        self.load_account(&id).await
    }

    /// Writes profile, preference and state edits back.
    pub async fn update_account(&self, account: &mut Account) -> Result<(), CoreError> {
        self.documents.update(account, None, None).await
    }

    pub async fn record_login(&self, account: &mut Account) -> Result<(), CoreError> {
        let now = Utc::now();
        self.documents
            .update(
                account,
                Some(&move |data: &mut AccountData| data.state.last_login = Some(now)),
                None,
            )
            .await
    }

    pub async fn set_active_project(
        &self,
        account: &mut Account,
        project_id: Option<&str>,
    ) -> Result<(), CoreError> {
        let active = project_id.map(str::to_string);
        self.documents
            .update(
                account,
                Some(&move |data: &mut AccountData| data.state.active_project = active.clone()),
                None,
            )
            .await
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), CoreError> {
        self.auth().send_password_reset(email).await?;
        Ok(())
    }

    /// Account reported for a session change; `None` for signed out, locked
    /// or unloadable accounts.
    async fn account_for(&self, change: SessionChange) -> Option<Account> {
        let user = match change {
            SessionChange::SignedIn(user) => user,
            SessionChange::SignedOut => return None,
        };
        match self.load_account(&user.id).await {
            Ok(account) if account.data.state.locked => {
                debug!("Account {} is locked", account.id());
                None
            }
            Ok(account) => Some(account),
            Err(e) => {
                warn!("Failed to load account of user {}: {}", user.id, e);
                None
            }
        }
    }

    /// Calls `callback` on every session change until the provider goes away.
    pub fn watch_session<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(Option<Account>) + Send + Sync + 'static,
    {
        let mut changes = self.auth().subscribe();
        let service = self.clone();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => callback(service.account_for(change).await),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session watcher skipped {} change(s)", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
