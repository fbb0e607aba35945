use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection segment of every persisted document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Account,
    Project,
    Role,
    Connection,
    Diagram,
    Layer,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Account => "account",
            DocumentType::Project => "project",
            DocumentType::Role => "role",
            DocumentType::Connection => "connection",
            DocumentType::Diagram => "diagram",
            DocumentType::Layer => "layer",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account" => Ok(DocumentType::Account),
            "project" => Ok(DocumentType::Project),
            "role" => Ok(DocumentType::Role),
            "connection" => Ok(DocumentType::Connection),
            "diagram" => Ok(DocumentType::Diagram),
            "layer" => Ok(DocumentType::Layer),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectMemberRole {
    Owner,
    Manager,
    Maintainer,
    Deployer,
    Developer,
    Visitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerType {
    FileStorage,
    #[serde(rename = "database3NF")]
    Database3Nf,
    DatabaseVault,
    DatabaseMart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Architecture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionApplication {
    S3,
    Snowflake,
}

impl ConnectionApplication {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionApplication::S3 => "s3",
            ConnectionApplication::Snowflake => "snowflake",
        }
    }
}

/// Side of a diagram node an edge is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePosition {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UiLanguage {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "de-DE")]
    DeDe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Boolean,
}

/// Project role permissions. No permission has been defined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {}
