//! Client for the privileged remote procedures.
//!
//! Every procedure is an HTTP POST to the configured URL template with
//! `:function:` replaced by the procedure name, authorized with the current
//! user's id token.

use super::auth::AuthProvider;
use super::connection_service::ConnectionTester;
use super::project_service::ProjectDeleter;
use super::secret_service::SecretCipher;
use crate::error::CoreError;
use crate::models::{ConnectionApplication, ConnectionProperties, ConnectionTestResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Placeholder for the procedure name in the URL template.
pub const FUNCTION_PLACEHOLDER: &str = ":function:";

pub struct FunctionsClient {
    client: Client,
    url_template: String,
    auth: Arc<dyn AuthProvider>,
}

#[derive(Serialize)]
struct EncryptRequest<'a> {
    key: &'a str,
    plain: Vec<String>,
}

#[derive(Serialize)]
struct DecryptRequest<'a> {
    key: &'a str,
    encrypted: Vec<String>,
}

#[derive(Serialize)]
struct TestConnectionRequest {
    application: ConnectionApplication,
    properties: serde_json::Value,
}

/// Failed call, before it is mapped onto a `CoreError`.
enum CallError {
    Status(StatusCode, String),
    Other(CoreError),
}

impl From<CoreError> for CallError {
    fn from(error: CoreError) -> Self {
        CallError::Other(error)
    }
}

impl CallError {
    fn into_core(self, function: &str) -> CoreError {
        match self {
            CallError::Status(status, body) => CoreError::Functions(format!(
                "{} returned error {}: {}",
                function, status, body
            )),
            CallError::Other(error) => error,
        }
    }
}

impl FunctionsClient {
    /// Create a client for the given URL template.
    pub fn new(
        url_template: impl Into<String>,
        timeout: Duration,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, CoreError> {
        let url_template = url_template.into();
        if !url_template.contains(FUNCTION_PLACEHOLDER) {
            return Err(CoreError::Functions(format!(
                "functions URL \"{}\" has no {} placeholder",
                url_template, FUNCTION_PLACEHOLDER
            )));
        }
        Url::parse(&url_template.replace(FUNCTION_PLACEHOLDER, "probe")).map_err(|e| {
            CoreError::Functions(format!("invalid functions URL \"{}\": {}", url_template, e))
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Functions(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url_template,
            auth,
        })
    }

    /// URL of one procedure.
    pub fn function_url(&self, function: &str) -> String {
        self.url_template.replace(FUNCTION_PLACEHOLDER, function)
    }

    async fn call(
        &self,
        function: &str,
        payload: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, CallError> {
        let token = self.auth.id_token().await.map_err(CoreError::from)?;
        let url = self.function_url(function);
        debug!("Calling remote procedure {}", function);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                CoreError::Functions(format!("Failed to send request to {}: {}", function, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Remote procedure {} returned {}", function, status);
            return Err(CallError::Status(status, error_text));
        }
        Ok(response)
    }

    /// Calls a procedure and decodes its JSON response.
    pub async fn post<I: Serialize + Sync, O: DeserializeOwned>(
        &self,
        function: &str,
        payload: &I,
    ) -> Result<O, CoreError> {
        let response = self
            .call(function, payload)
            .await
            .map_err(|e| e.into_core(function))?;
        response.json::<O>().await.map_err(|e| {
            CoreError::Functions(format!("Failed to parse {} response: {}", function, e))
        })
    }
}

fn check_length(function: &str, sent: usize, received: &[String]) -> Result<(), CoreError> {
    if sent != received.len() {
        return Err(CoreError::Cipher(format!(
            "{} returned {} values for {} inputs",
            function,
            received.len(),
            sent
        )));
    }
    Ok(())
}

#[async_trait]
impl SecretCipher for FunctionsClient {
    async fn encrypt(&self, key: &str, plain: Vec<String>) -> Result<Vec<String>, CoreError> {
        let sent = plain.len();
        let encrypted: Vec<String> = self.post("encrypt", &EncryptRequest { key, plain }).await?;
        check_length("encrypt", sent, &encrypted)?;
        Ok(encrypted)
    }

    async fn decrypt(&self, key: &str, encrypted: Vec<String>) -> Result<Vec<String>, CoreError> {
        let sent = encrypted.len();
        let plain: Vec<String> = self
            .post("decrypt", &DecryptRequest { key, encrypted })
            .await?;
        check_length("decrypt", sent, &plain)?;
        Ok(plain)
    }
}

#[async_trait]
impl ConnectionTester for FunctionsClient {
    async fn test_connection(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<ConnectionTestResult, CoreError> {
        let request = TestConnectionRequest {
            application: properties.application(),
            properties: properties.to_value()?,
        };
        self.post("testConnection", &request).await
    }
}

#[async_trait]
impl ProjectDeleter for FunctionsClient {
    async fn delete_project(&self, project_id: &str) -> Result<(), CoreError> {
        let function = "deleteProject";
        match self.call(function, &json!({ "id": project_id })).await {
            Ok(_) => {
                info!("Deleted project {}", project_id);
                Ok(())
            }
            Err(CallError::Status(StatusCode::FORBIDDEN, _)) => Err(CoreError::Precondition(
                format!("only the owner may delete project \"{}\"", project_id),
            )),
            Err(CallError::Status(StatusCode::NOT_FOUND, _)) => {
                Err(CoreError::not_found("project", project_id))
            }
            Err(other) => Err(other.into_core(function)),
        }
    }
}
