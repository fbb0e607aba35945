//! Connections to external applications (AWS S3, Snowflake).
//!
//! The credential fields of a connection are stored encrypted. In memory a
//! loaded connection holds plaintext; see `services::secret_service`.

use super::document::{
    DocumentAttribute, DocumentCommonData, DocumentData, DocumentMetaData, Named,
};
use super::enums::{ConnectionApplication, DocumentType};
use super::project_document::{Dimension, NodeEntity, ProjectDocument};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Properties {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowflakeProperties {
    pub account: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Application specific properties, discriminated by the application.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionProperties {
    S3(S3Properties),
    Snowflake(SnowflakeProperties),
}

impl ConnectionProperties {
    pub fn application(&self) -> ConnectionApplication {
        match self {
            ConnectionProperties::S3(_) => ConnectionApplication::S3,
            ConnectionProperties::Snowflake(_) => ConnectionApplication::Snowflake,
        }
    }

    /// Credential fields in a fixed order.
    pub fn secrets(&self) -> Vec<String> {
        match self {
            ConnectionProperties::S3(s3) => {
                vec![s3.access_key_id.clone(), s3.secret_access_key.clone()]
            }
            ConnectionProperties::Snowflake(snowflake) => vec![snowflake.password.clone()],
        }
    }

    /// Replaces the credential fields, in the order returned by [`Self::secrets`].
    pub fn replace_secrets(&mut self, values: Vec<String>) -> Result<(), CoreError> {
        let expected = self.secrets().len();
        if values.len() != expected {
            return Err(CoreError::Cipher(format!(
                "expected {} secret values for {}, got {}",
                expected,
                self.application().as_str(),
                values.len()
            )));
        }
        let mut values = values.into_iter();
        match self {
            ConnectionProperties::S3(s3) => {
                s3.access_key_id = values.next().unwrap_or_default();
                s3.secret_access_key = values.next().unwrap_or_default();
            }
            ConnectionProperties::Snowflake(snowflake) => {
                snowflake.password = values.next().unwrap_or_default();
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Result<serde_json::Value, CoreError> {
        let value = match self {
            ConnectionProperties::S3(s3) => serde_json::to_value(s3)?,
            ConnectionProperties::Snowflake(snowflake) => serde_json::to_value(snowflake)?,
        };
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ConnectionRecord", try_from = "ConnectionRecord")]
pub struct ConnectionData {
    pub common: DocumentCommonData,
    pub properties: ConnectionProperties,
    pub attributes: Vec<DocumentAttribute>,
    pub meta: Option<DocumentMetaData>,
}

impl ConnectionData {
    pub fn new(
        common: DocumentCommonData,
        properties: ConnectionProperties,
        attributes: Vec<DocumentAttribute>,
    ) -> Self {
        Self {
            common,
            properties,
            attributes,
            meta: None,
        }
    }

    pub fn application(&self) -> ConnectionApplication {
        self.properties.application()
    }
}

impl DocumentData for ConnectionData {
    fn meta(&self) -> Option<&DocumentMetaData> {
        self.meta.as_ref()
    }

    fn meta_slot(&mut self) -> Option<&mut Option<DocumentMetaData>> {
        Some(&mut self.meta)
    }
}

/// Persisted shape: `application` next to an untyped `properties` record.
#[derive(Serialize, Deserialize)]
struct ConnectionRecord {
    common: DocumentCommonData,
    application: ConnectionApplication,
    properties: serde_json::Value,
    #[serde(default)]
    attributes: Vec<DocumentAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<DocumentMetaData>,
}

impl From<ConnectionData> for ConnectionRecord {
    fn from(data: ConnectionData) -> Self {
        let application = data.properties.application();
        let properties = data
            .properties
            .to_value()
            .unwrap_or(serde_json::Value::Null);
        Self {
            common: data.common,
            application,
            properties,
            attributes: data.attributes,
            meta: data.meta,
        }
    }
}

impl TryFrom<ConnectionRecord> for ConnectionData {
    type Error = serde_json::Error;

    fn try_from(record: ConnectionRecord) -> Result<Self, Self::Error> {
        let properties = match record.application {
            ConnectionApplication::S3 => {
                ConnectionProperties::S3(serde_json::from_value(record.properties)?)
            }
            ConnectionApplication::Snowflake => {
                ConnectionProperties::Snowflake(serde_json::from_value(record.properties)?)
            }
        };
        Ok(Self {
            common: record.common,
            properties,
            attributes: record.attributes,
            meta: record.meta,
        })
    }
}

pub type Connection = ProjectDocument<ConnectionData>;

impl Named for Connection {
    fn name(&self) -> String {
        self.data().common.name.clone()
    }
}

impl NodeEntity for Connection {
    fn node_type(&self) -> DocumentType {
        DocumentType::Connection
    }

    fn default_dimension(&self) -> Dimension {
        Dimension {
            width: 200.0,
            height: 80.0,
        }
    }

    fn is_droppable(&self, target: Option<DocumentType>) -> bool {
        matches!(target, None | Some(DocumentType::Layer))
    }
}

/// Outcome of a connection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionTestStatus {
    Okay,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub status: ConnectionTestStatus,
    pub message: String,
}
