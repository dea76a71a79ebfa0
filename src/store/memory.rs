//! In-memory storage doubles for unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::{Map, Value};

use super::{ConfigStore, KeyValueStore};
use crate::pointer::{ConfigurationTarget, ScopeToken};
use crate::resolve::Inspection;
use crate::{Error, Result};

fn language_section(language_id: &str) -> String {
    format!("[{}]", language_id)
}

/// In-memory [`ConfigStore`] with the same document model as the file store.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Map<String, Value>>>,
    defaults: BTreeMap<String, Value>,
    /// When set, every update returns this error message.
    fail_updates: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: BTreeMap<String, Value>) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Make subsequent updates fail, for exercising write-failure paths.
    pub fn fail_updates(&self, message: &str) {
        *self.fail_updates.lock().unwrap() = Some(message.to_string());
    }

    fn document_key(
        target: ConfigurationTarget,
        scope: Option<&ScopeToken>,
    ) -> Option<String> {
        match target {
            ConfigurationTarget::Global => Some("global".to_string()),
            ConfigurationTarget::Workspace => Some("workspace".to_string()),
            ConfigurationTarget::WorkspaceFolder => {
                let location = scope?.location.as_ref()?;
                Some(format!("folder:{}", location))
            }
        }
    }

    /// Direct read of a document key, for test assertions.
    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents
            .lock()
            .unwrap()
            .get(key)
            .map(|map| Value::Object(map.clone()))
    }
}

impl ConfigStore for MemoryStore {
    fn inspect(&self, id: &str, scope: Option<&ScopeToken>) -> Result<Inspection> {
        let documents = self.documents.lock().unwrap();
        let language_id = scope.and_then(|s| s.language_id.as_deref());
        let lookup = |target: ConfigurationTarget| -> (Option<Value>, Option<Value>) {
            let Some(document) =
                Self::document_key(target, scope).and_then(|key| documents.get(&key))
            else {
                return (None, None);
            };
            let plain = document.get(id).cloned();
            let language = language_id
                .and_then(|lang| document.get(&language_section(lang)))
                .and_then(Value::as_object)
                .and_then(|section| section.get(id))
                .cloned();
            (plain, language)
        };
        let (global_value, global_language_value) = lookup(ConfigurationTarget::Global);
        let (workspace_value, workspace_language_value) = lookup(ConfigurationTarget::Workspace);
        let (workspace_folder_value, workspace_folder_language_value) =
            lookup(ConfigurationTarget::WorkspaceFolder);
        Ok(Inspection {
            default_value: self.defaults.get(id).cloned(),
            global_value,
            workspace_value,
            workspace_folder_value,
            default_language_value: None,
            global_language_value,
            workspace_language_value,
            workspace_folder_language_value,
        })
    }

    fn update(
        &self,
        id: &str,
        value: Option<&Value>,
        target: ConfigurationTarget,
        override_in_language: bool,
        scope: Option<&ScopeToken>,
    ) -> Result<()> {
        if let Some(message) = self.fail_updates.lock().unwrap().clone() {
            return Err(Error::Other(message));
        }
        let key = Self::document_key(target, scope).ok_or_else(|| {
            Error::InvalidInput(format!(
                "no workspace folder available for writing '{}'",
                id
            ))
        })?;
        let mut documents = self.documents.lock().unwrap();
        let document = documents.entry(key).or_default();
        let language_id = scope.and_then(|s| s.language_id.as_deref());
        match (override_in_language, language_id) {
            (true, Some(language_id)) => {
                let section_key = language_section(language_id);
                let mut section = match document.remove(&section_key) {
                    Some(Value::Object(section)) => section,
                    _ => Map::new(),
                };
                match value {
                    Some(value) => {
                        section.insert(id.to_string(), value.clone());
                    }
                    None => {
                        section.remove(id);
                    }
                }
                if !section.is_empty() {
                    document.insert(section_key, Value::Object(section));
                }
            }
            _ => match value {
                Some(value) => {
                    document.insert(id.to_string(), value.clone());
                }
                None => {
                    document.remove(id);
                }
            },
        }
        Ok(())
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Default)]
pub struct MemoryKv {
    state: Mutex<BTreeMap<String, Value>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.state.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.state.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().keys().cloned().collect())
    }
}
