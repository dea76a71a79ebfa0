//! Schema document sources.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{Error, Result};

/// Provider of raw schema documents, keyed by URI.
///
/// The default source reads JSON files from the schemas directory; tests
/// substitute an in-memory map.
pub trait SchemaSource {
    /// Load the raw document at `uri`.
    fn load(&self, uri: &str) -> Result<Value>;

    /// URIs of every settings contribution document, in stable order.
    fn contributions(&self) -> Result<Vec<String>>;
}

/// File-backed schema source: each contribution is a `.json` file directly
/// under the schemas directory, and its URI is its file name.
pub struct FileSchemaSource {
    dir: PathBuf,
}

impl FileSchemaSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, uri: &str) -> Result<PathBuf> {
        // URIs are bare file names; anything path-like is rejected rather
        // than resolved outside the schemas directory.
        if uri.contains("..") || uri.starts_with('/') {
            return Err(Error::Schema(format!("invalid schema uri '{}'", uri)));
        }
        Ok(self.dir.join(uri))
    }
}

impl SchemaSource for FileSchemaSource {
    fn load(&self, uri: &str) -> Result<Value> {
        let path = self.path_for(uri)?;
        let raw = fs::read_to_string(&path).map_err(|e| {
            Error::Schema(format!("cannot read schema '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Schema(format!("malformed schema '{}': {}", path.display(), e)))
    }

    fn contributions(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            // A missing schemas directory means no settings are contributed.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(Error::Io(e)),
        };
        for entry in entries {
            let entry = entry.map_err(Error::Io)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory schema source for unit tests.
pub struct MemorySchemaSource {
    docs: Vec<(String, Value)>,
}

impl MemorySchemaSource {
    pub fn new(docs: Vec<(String, Value)>) -> Self {
        Self { docs }
    }
}

impl SchemaSource for MemorySchemaSource {
    fn load(&self, uri: &str) -> Result<Value> {
        self.docs
            .iter()
            .find(|(name, _)| name == uri)
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| Error::Schema(format!("unknown schema uri '{}'", uri)))
    }

    fn contributions(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.docs.iter().map(|(name, _)| name.clone()).collect();
        names.sort();
        Ok(names)
    }
}

/// Default schemas directory under the workspace data dir, overridable with
/// `TT_SCHEMA_DIR`.
pub fn get_schema_dir(data_dir: &Path) -> PathBuf {
    if let Ok(dir) = std::env::var("TT_SCHEMA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    data_dir.join("schemas")
}
