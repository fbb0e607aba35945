//! Unit tests for documents, paths and payload mixins.

use cdwa_core::CoreError;
use cdwa_core::models::{
    Account, AccountData, AccountPreferences, AccountProfile, AccountState, AttributeValue,
    Document, DocumentAttribute, DocumentCommonData, DocumentType, Named, UiLanguage, UiMode,
    extract_document_type, extract_parent_path, sort_by_name,
};
use serde_json::json;

fn account_data() -> AccountData {
    AccountData {
        profile: AccountProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        },
        preferences: AccountPreferences::default(),
        state: AccountState::default(),
    }
}

#[test]
fn test_document_paths() {
    let account = Account::new("u1", "account", account_data()).unwrap();
    assert_eq!(account.id(), "u1");
    assert_eq!(account.path(), "account");
    assert_eq!(account.document_type(), DocumentType::Account);
    assert_eq!(account.record_path(), "account/u1");
    assert_eq!(account.full_path(), "account/u1/");
}

#[test]
fn test_document_type_is_last_path_segment() {
    assert_eq!(extract_document_type("project/p1/diagram"), "diagram");
    assert_eq!(extract_document_type("project"), "project");
    assert_eq!(extract_parent_path("project/p1/diagram"), "project/p1");
    assert_eq!(extract_parent_path("project"), "");
}

#[test]
fn test_document_rejects_bad_ids_and_paths() {
    assert!(matches!(
        Account::new("", "account", account_data()),
        Err(CoreError::InvalidPath(_))
    ));
    assert!(matches!(
        Account::new("a/b", "account", account_data()),
        Err(CoreError::InvalidPath(_))
    ));
    assert!(matches!(
        Account::new("u1", "project/p1/widget", account_data()),
        Err(CoreError::InvalidPath(_))
    ));
}

#[test]
fn test_document_from_record_path() {
    let document: Document<AccountData> =
        Document::from_record_path("account/u7", account_data()).unwrap();
    assert_eq!(document.id(), "u7");
    assert_eq!(document.path(), "account");
}

#[test]
fn test_document_type_strings() {
    for document_type in [
        DocumentType::Account,
        DocumentType::Project,
        DocumentType::Role,
        DocumentType::Connection,
        DocumentType::Diagram,
        DocumentType::Layer,
    ] {
        let parsed: DocumentType = document_type.as_str().parse().unwrap();
        assert_eq!(parsed, document_type);
        assert_eq!(
            serde_json::to_value(document_type).unwrap(),
            json!(document_type.as_str())
        );
    }
    assert!("widget".parse::<DocumentType>().is_err());
}

#[test]
fn test_account_display_name_and_defaults() {
    let account = Account::new("u1", "account", account_data()).unwrap();
    assert_eq!(account.name(), "Ada Lovelace");
    assert!(account.data.state.locked);
    assert_eq!(account.data.state.active_project, None);
    assert_eq!(account.data.preferences.ui_mode, UiMode::Light);
    assert_eq!(account.data.preferences.ui_language, UiLanguage::EnUs);
}

#[test]
fn test_account_wire_format() {
    let value = serde_json::to_value(account_data()).unwrap();
    assert_eq!(value["profile"]["firstName"], "Ada");
    assert_eq!(value["preferences"]["uiMode"], "light");
    assert_eq!(value["preferences"]["uiLanguage"], "en-US");
    assert_eq!(value["state"]["locked"], true);
    assert!(value["state"]["activeProject"].is_null());
}

#[test]
fn test_attribute_values() {
    let attributes = vec![
        DocumentAttribute::string("team", "core"),
        DocumentAttribute::number("tier", 2.0),
        DocumentAttribute::boolean("pii", true),
    ];
    let value = serde_json::to_value(&attributes).unwrap();
    assert_eq!(value[0], json!({"key": "team", "type": "string", "value": "core"}));
    assert_eq!(value[1]["value"], json!(2.0));
    assert_eq!(value[2]["type"], "boolean");

    let parsed: Vec<DocumentAttribute> = serde_json::from_value(value).unwrap();
    assert_eq!(parsed[2].value, AttributeValue::Boolean(true));
    assert_eq!(parsed, attributes);
}

struct Item(&'static str);

impl Named for Item {
    fn name(&self) -> String {
        self.0.to_string()
    }
}

#[test]
fn test_sort_by_name_ignores_case() {
    let mut items = vec![Item("beta"), Item("Alpha"), Item("alpha"), Item("Gamma")];
    sort_by_name(&mut items);
    let names: Vec<&str> = items.iter().map(|item| item.0).collect();
    assert_eq!(names, vec!["Alpha", "alpha", "beta", "Gamma"]);
}

#[test]
fn test_sort_by_name_ignores_accents() {
    let mut items = vec![Item("Zeta"), Item("Émile"), Item("alpha"), Item("emu")];
    sort_by_name(&mut items);
    let names: Vec<&str> = items.iter().map(|item| item.0).collect();
    assert_eq!(names, vec!["alpha", "Émile", "emu", "Zeta"]);
}

#[test]
fn test_common_data_description_is_optional() {
    let common = DocumentCommonData::new("Sales", None);
    let value = serde_json::to_value(&common).unwrap();
    assert_eq!(value, json!({"name": "Sales", "description": null}));
}
