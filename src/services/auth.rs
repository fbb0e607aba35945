//! Authentication collaborator.
//!
//! The document core only needs the identity of the current caller, session
//! change notifications, registration and password reset. [`AuthProvider`] is
//! that seam; [`LocalAuthProvider`] is an in-process implementation for local
//! development and tests.

use super::jwt_service::JwtService;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

/// Authentication failures, identified by stable `auth/*` codes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum AuthError {
    #[error("The e-mail address is not valid")]
    #[serde(rename = "auth/invalid-email")]
    InvalidEmail,
    #[error("The e-mail address is already in use")]
    #[serde(rename = "auth/email-already-in-use")]
    EmailAlreadyInUse,
    #[error("The password is too weak")]
    #[serde(rename = "auth/weak-password")]
    WeakPassword,
    #[error("Invalid credentials")]
    #[serde(rename = "auth/invalid-credential")]
    InvalidCredential,
    #[error("The account is locked")]
    #[serde(rename = "auth/account-locked")]
    AccountLocked,
    #[error("Too many requests, try again later")]
    #[serde(rename = "auth/too-many-requests")]
    TooManyRequests,
    /// No user is signed in
    #[error("No authenticated user")]
    #[serde(rename = "auth/no-session")]
    NoSession,
    #[error("Authentication error: {message}")]
    #[serde(rename = "auth/internal-error")]
    Other { message: String },
}

impl AuthError {
    pub fn other(message: impl Into<String>) -> Self {
        AuthError::Other {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::InvalidCredential => "auth/invalid-credential",
            AuthError::AccountLocked => "auth/account-locked",
            AuthError::TooManyRequests => "auth/too-many-requests",
            AuthError::NoSession => "auth/no-session",
            AuthError::Other { .. } => "auth/internal-error",
        }
    }
}

impl FromStr for AuthError {
    type Err = String;

    /// Parses a provider error code. Unknown codes become `Other`.
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Ok(match code {
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/email-already-in-use" => AuthError::EmailAlreadyInUse,
            "auth/weak-password" => AuthError::WeakPassword,
            "auth/invalid-credential" | "auth/wrong-password" | "auth/user-not-found" => {
                AuthError::InvalidCredential
            }
            "auth/account-locked" | "auth/user-disabled" => AuthError::AccountLocked,
            "auth/too-many-requests" => AuthError::TooManyRequests,
            "auth/no-session" => AuthError::NoSession,
            other if other.starts_with("auth/") => AuthError::other(other),
            other => return Err(format!("Not an authentication error code: {}", other)),
        })
    }
}

/// The authenticated user as seen by the document core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Display name, falling back to the e-mail address.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(AuthUser),
    SignedOut,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;

    fn current_user_id(&self) -> Result<String, AuthError> {
        self.current_user()
            .map(|user| user.id)
            .ok_or(AuthError::NoSession)
    }

    fn current_user_name(&self) -> Result<String, AuthError> {
        self.current_user()
            .map(|user| user.name().to_string())
            .ok_or(AuthError::NoSession)
    }

    /// A fresh bearer token of the current user.
    async fn id_token(&self) -> Result<String, AuthError>;

    /// Creates a user and signs it in. Returns the new user id.
    async fn register_user(&self, email: &str, password: &str) -> Result<String, AuthError>;

    async fn update_display_name(&self, user_id: &str, name: &str) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Session change notifications from now on.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_FAILED_SIGN_INS: u32 = 5;

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    match email_pattern() {
        Some(pattern) if pattern.is_match(email) => Ok(()),
        _ => Err(AuthError::InvalidEmail),
    }
}

struct LocalUser {
    user: AuthUser,
    password: String,
    disabled: bool,
    failed_sign_ins: u32,
}

#[derive(Default)]
struct LocalAuthState {
    // keyed by lower-case e-mail
    users: HashMap<String, LocalUser>,
    current: Option<String>,
    password_resets: Vec<String>,
}

/// In-process authentication provider. Users live in memory only.
pub struct LocalAuthProvider {
    state: RwLock<LocalAuthState>,
    jwt: JwtService,
    sessions: broadcast::Sender<SessionChange>,
}

impl LocalAuthProvider {
    pub fn new(jwt: JwtService) -> Self {
        let (sessions, _) = broadcast::channel(16);
        Self {
            state: RwLock::new(LocalAuthState::default()),
            jwt,
            sessions,
        }
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LocalAuthState>, AuthError> {
        self.state
            .write()
            .map_err(|_| AuthError::other("authentication state lock poisoned"))
    }

    fn notify(&self, change: SessionChange) {
        // No subscribers is fine.
        let _ = self.sessions.send(change);
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = {
            let mut state = self.write_state()?;
            let key = email.to_lowercase();
            let local = state
                .users
                .get_mut(&key)
                .ok_or(AuthError::InvalidCredential)?;
            if local.disabled {
                return Err(AuthError::AccountLocked);
            }
            if local.failed_sign_ins >= MAX_FAILED_SIGN_INS {
                return Err(AuthError::TooManyRequests);
            }
            if local.password != password {
                local.failed_sign_ins += 1;
                return Err(AuthError::InvalidCredential);
            }
            local.failed_sign_ins = 0;
            let user = local.user.clone();
            state.current = Some(key);
            user
        };
        info!("User {} signed in", user.id);
        self.notify(SessionChange::SignedIn(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        let was_signed_in = self.write_state()?.current.take().is_some();
        if was_signed_in {
            self.notify(SessionChange::SignedOut);
        }
        Ok(())
    }

    /// Disables or re-enables a user; disabled users cannot sign in.
    pub fn set_disabled(&self, email: &str, disabled: bool) -> Result<(), AuthError> {
        let mut state = self.write_state()?;
        let local = state
            .users
            .get_mut(&email.to_lowercase())
            .ok_or(AuthError::InvalidCredential)?;
        local.disabled = disabled;
        Ok(())
    }

    /// E-mail addresses a password reset was requested for.
    pub fn password_resets(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.password_resets.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn current_user(&self) -> Option<AuthUser> {
        let state = self.state.read().ok()?;
        let key = state.current.as_ref()?;
        state.users.get(key).map(|local| local.user.clone())
    }

    async fn id_token(&self) -> Result<String, AuthError> {
        let user = self.current_user().ok_or(AuthError::NoSession)?;
        self.jwt
            .generate_id_token(&user.id, &user.email, user.display_name.as_deref())
            .map_err(AuthError::other)
    }

    async fn register_user(&self, email: &str, password: &str) -> Result<String, AuthError> {
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        let user = {
            let mut state = self.write_state()?;
            let key = email.to_lowercase();
            if state.users.contains_key(&key) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            let user = AuthUser {
                id: Uuid::new_v4().simple().to_string(),
                email: email.to_string(),
                display_name: None,
            };
            state.users.insert(
                key.clone(),
                LocalUser {
                    user: user.clone(),
                    password: password.to_string(),
                    disabled: false,
                    failed_sign_ins: 0,
                },
            );
            state.current = Some(key);
            user
        };
        info!("Registered user {}", user.id);
        self.notify(SessionChange::SignedIn(user.clone()));
        Ok(user.id)
    }

    async fn update_display_name(&self, user_id: &str, name: &str) -> Result<(), AuthError> {
        let mut state = self.write_state()?;
        let local = state
            .users
            .values_mut()
            .find(|local| local.user.id == user_id)
            .ok_or_else(|| AuthError::other(format!("unknown user {}", user_id)))?;
        local.user.display_name = Some(name.to_string());
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        validate_email(email)?;
        let mut state = self.write_state()?;
        if !state.users.contains_key(&email.to_lowercase()) {
            // Unknown addresses are not revealed to the caller.
            warn!("Password reset requested for an unknown address");
            return Ok(());
        }
        state.password_resets.push(email.to_string());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.sessions.subscribe()
    }
}
