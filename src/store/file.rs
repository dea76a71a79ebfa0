//! File-backed storage defaults.
//!
//! Settings documents are flat JSON objects keyed by full setting id, one
//! document per scope: `global.json`, `workspace.json`, and one
//! `folder-<hash>.json` per workspace folder location. Language overrides
//! nest inside a document under a `[languageId]` key. The key-value store is
//! a single `state.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::{ConfigStore, KeyValueStore};
use crate::pointer::{ConfigurationTarget, ScopeToken};
use crate::resolve::Inspection;
use crate::{Error, Result};

/// Per-workspace data directory.
///
/// `TT_DATA_DIR` overrides the root for tests and scripting; otherwise data
/// lives under the platform data dir, one subdirectory per workspace named
/// by a truncated hash of the canonical workspace path.
pub fn get_data_dir(workspace_root: &Path) -> Result<PathBuf> {
    let root = match std::env::var("TT_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::data_dir()
            .ok_or_else(|| Error::Other("cannot determine data directory".to_string()))?
            .join("trimtab"),
    };
    let canonical = workspace_root
        .canonicalize()
        .unwrap_or_else(|_| workspace_root.to_path_buf());
    Ok(root.join(path_hash(&canonical.to_string_lossy())))
}

/// First 12 hex chars of the sha256 of a path string.
fn path_hash(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..12].to_string()
}

/// Language override section key inside a settings document.
fn language_section(language_id: &str) -> String {
    format!("[{}]", language_id)
}

/// File-backed [`ConfigStore`].
pub struct FileStore {
    dir: PathBuf,
    defaults: BTreeMap<String, Value>,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self::with_defaults(data_dir, BTreeMap::new())
    }

    /// A store whose default slots are populated from schema defaults.
    pub fn with_defaults(data_dir: &Path, defaults: BTreeMap<String, Value>) -> Self {
        Self {
            dir: data_dir.join("settings"),
            defaults,
        }
    }

    fn document_path(
        &self,
        target: ConfigurationTarget,
        scope: Option<&ScopeToken>,
    ) -> Option<PathBuf> {
        match target {
            ConfigurationTarget::Global => Some(self.dir.join("global.json")),
            ConfigurationTarget::Workspace => Some(self.dir.join("workspace.json")),
            ConfigurationTarget::WorkspaceFolder => {
                let location = scope?.location.as_ref()?;
                Some(self.dir.join(format!("folder-{}.json", path_hash(location))))
            }
        }
    }

    fn read_document(&self, path: &Path) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Other(format!(
                "settings document '{}' is not an object",
                path.display()
            ))),
        }
    }

    fn write_document(&self, path: &Path, document: &Map<String, Value>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let rendered = serde_json::to_string_pretty(&Value::Object(document.clone()))?;
        fs::write(path, rendered)?;
        Ok(())
    }

}

impl ConfigStore for FileStore {
    fn inspect(&self, id: &str, scope: Option<&ScopeToken>) -> Result<Inspection> {
        let language_id = scope.and_then(|s| s.language_id.as_deref());
        let lookup = |target: ConfigurationTarget| -> Result<(Option<Value>, Option<Value>)> {
            let Some(path) = self.document_path(target, scope) else {
                return Ok((None, None));
            };
            let document = self.read_document(&path)?;
            let plain = document.get(id).cloned();
            let language = language_id
                .and_then(|lang| document.get(&language_section(lang)))
                .and_then(Value::as_object)
                .and_then(|section| section.get(id))
                .cloned();
            Ok((plain, language))
        };
        let (global_value, global_language_value) = lookup(ConfigurationTarget::Global)?;
        let (workspace_value, workspace_language_value) = lookup(ConfigurationTarget::Workspace)?;
        let (workspace_folder_value, workspace_folder_language_value) =
            lookup(ConfigurationTarget::WorkspaceFolder)?;
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
        let path = self.document_path(target, scope).ok_or_else(|| {
            Error::InvalidInput(format!(
                "no workspace folder available for writing '{}'",
                id
            ))
        })?;
        let mut document = self.read_document(&path)?;
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
                // A drained override section disappears from the document.
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
        self.write_document(&path, &document)
    }
}

/// File-backed [`KeyValueStore`]: a single JSON object in `state.json`.
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("state.json"),
        }
    }

    fn read_state(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Other(format!(
                "state file '{}' is not an object",
                self.path.display()
            ))),
        }
    }

    fn write_state(&self, state: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(&Value::Object(state.clone()))?)?;
        Ok(())
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_state()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let mut state = self.read_state()?;
        state.insert(key.to_string(), value.clone());
        self.write_state(&state)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.read_state()?;
        if state.remove(key).is_some() {
            self.write_state(&state)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_state()?.keys().cloned().collect())
    }
}
