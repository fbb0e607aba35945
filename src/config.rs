//! Configuration of the document core.
//!
//! Values come from the environment or from a YAML file; both start from
//! [`CoreConfig::default`].

use crate::services::jwt_service::JwtService;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format \"{}\"", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// URL template of the privileged remote procedures, with a `:function:`
    /// placeholder for the procedure name.
    pub functions_url: Option<String>,
    /// PostgreSQL document store
    pub database_url: Option<String>,
    /// SQLite document store file
    pub sqlite_path: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub jwt_secret: Option<String>,
    pub app_env: String,
    pub http_timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            functions_url: None,
            database_url: None,
            sqlite_path: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            jwt_secret: None,
            app_env: "production".to_string(),
            http_timeout_secs: 30,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl CoreConfig {
    /// Reads the configuration from `CDWA_*`, `DATABASE_URL`, `JWT_SECRET`
    /// and `APP_ENV`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.functions_url = non_empty("CDWA_FUNCTIONS_URL");
        config.database_url = non_empty("DATABASE_URL");
        config.sqlite_path = non_empty("CDWA_SQLITE_PATH").map(PathBuf::from);
        if let Some(level) = non_empty("CDWA_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(format) = non_empty("CDWA_LOG_FORMAT") {
            config.log_format = format
                .parse::<LogFormat>()
                .map_err(anyhow::Error::msg)
                .context("Invalid CDWA_LOG_FORMAT")?;
        }
        config.jwt_secret = non_empty("JWT_SECRET");
        if let Some(app_env) = non_empty("APP_ENV") {
            config.app_env = app_env;
        }
        if let Some(timeout) = non_empty("CDWA_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = timeout
                .parse::<u64>()
                .with_context(|| format!("Invalid CDWA_HTTP_TIMEOUT_SECS \"{}\"", timeout))?;
        }
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    /// Id token service of the local authentication provider.
    pub fn jwt_service(&self) -> Result<JwtService> {
        JwtService::from_secret(self.jwt_secret.as_deref(), self.is_development())
            .map_err(anyhow::Error::msg)
    }
}
