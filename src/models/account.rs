use super::document::{Document, DocumentData, Named};
use super::enums::{UiLanguage, UiMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPreferences {
    pub ui_mode: UiMode,
    pub ui_language: UiLanguage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub locked: bool,
    pub active_project: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Default for AccountState {
    /// New accounts stay locked until activated by an administrator.
    fn default() -> Self {
        Self {
            locked: true,
            active_project: None,
            last_login: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub profile: AccountProfile,
    pub preferences: AccountPreferences,
    pub state: AccountState,
}

impl DocumentData for AccountData {}

impl AccountData {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.profile.first_name, self.profile.last_name)
    }
}

/// Account document, stored under the id of its authentication user.
pub type Account = Document<AccountData>;

impl Named for Account {
    fn name(&self) -> String {
        self.data.display_name()
    }
}
