//! Encryption of connection credentials.
//!
//! Credential fields are encrypted with the project owner's account id as key
//! before every write and decrypted once after load. All secret fields of one
//! connection go to the cipher in a single call.

use super::document_service::{ReadProcessor, WriteProcessor};
use crate::error::CoreError;
use crate::models::{ConnectionData, ProjectScope};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Symmetric encryption of string arrays, keyed by an account id.
#[async_trait]
pub trait SecretCipher: Send + Sync {
    /// Returns one ciphertext per plaintext, in the same order.
    async fn encrypt(&self, key: &str, plain: Vec<String>) -> Result<Vec<String>, CoreError>;

    /// Returns one plaintext per ciphertext, in the same order.
    async fn decrypt(&self, key: &str, encrypted: Vec<String>) -> Result<Vec<String>, CoreError>;
}

/// Write and read processor for connection payloads.
#[derive(Clone)]
pub struct ConnectionSecrets {
    cipher: Arc<dyn SecretCipher>,
}

impl ConnectionSecrets {
    pub fn new(cipher: Arc<dyn SecretCipher>) -> Self {
        Self { cipher }
    }

    /// Returns an encrypted copy of `data`; `data` itself keeps its plaintext.
    pub async fn encrypt(
        &self,
        data: &ConnectionData,
        scope: &ProjectScope,
    ) -> Result<ConnectionData, CoreError> {
        let key = scope.owner_id()?;
        let mut copy = data.clone();
        let secrets = copy.properties.secrets();
        let count = secrets.len();
        let encrypted = self.cipher.encrypt(key, secrets).await?;
        copy.properties.replace_secrets(encrypted)?;
        debug!(
            "Encrypted {} secret(s) of a {} connection",
            count,
            copy.application().as_str()
        );
        Ok(copy)
    }

    /// Decrypts `data` in place. Needs the owning project.
    pub async fn decrypt(
        &self,
        data: &mut ConnectionData,
        scope: Option<&ProjectScope>,
    ) -> Result<(), CoreError> {
        let scope = scope.ok_or_else(|| {
            CoreError::Precondition("decrypting a connection requires its project".to_string())
        })?;
        let key = scope.owner_id()?;
        let secrets = data.properties.secrets();
        let count = secrets.len();
        let plain = self.cipher.decrypt(key, secrets).await?;
        data.properties.replace_secrets(plain)?;
        debug!(
            "Decrypted {} secret(s) of a {} connection",
            count,
            data.application().as_str()
        );
        Ok(())
    }
}

#[async_trait]
impl WriteProcessor<ConnectionData> for ConnectionSecrets {
    async fn before_write(
        &self,
        data: &ConnectionData,
        scope: &ProjectScope,
    ) -> Result<ConnectionData, CoreError> {
        self.encrypt(data, scope).await
    }
}

#[async_trait]
impl ReadProcessor<ConnectionData> for ConnectionSecrets {
    async fn after_read(
        &self,
        data: &mut ConnectionData,
        scope: Option<&ProjectScope>,
    ) -> Result<(), CoreError> {
        self.decrypt(data, scope).await
    }
}
