//! Schema document caching and `$ref` resolution.
//!
//! References use the `uri#/slash/separated/path` form. An empty URI before
//! the `#` refers back to the containing document. Resolution is recursive,
//! so a referenced schema may itself carry references; a fixed depth cap
//! turns reference cycles into an error instead of a hang.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::source::SchemaSource;
use super::{SettingsDocument, SettingsEntry};
use crate::{Error, Result};

/// URI of the virtual document aggregating every contribution file.
pub const DEFAULT_SETTINGS_URI: &str = "settings/default";

/// References nested deeper than this indicate a cycle.
const MAX_REF_DEPTH: usize = 16;

/// Per-invocation cache of loaded schema documents.
pub struct SchemaCache<'a> {
    source: &'a dyn SchemaSource,
    docs: HashMap<String, Value>,
}

impl<'a> SchemaCache<'a> {
    pub fn new(source: &'a dyn SchemaSource) -> Self {
        Self {
            source,
            docs: HashMap::new(),
        }
    }

    /// The raw document at `uri`, loading it on first use.
    ///
    /// The [`DEFAULT_SETTINGS_URI`] document is synthesized by merging the
    /// `properties` tables of every contribution file, in file-name order.
    pub fn document(&mut self, uri: &str) -> Result<Value> {
        if let Some(doc) = self.docs.get(uri) {
            return Ok(doc.clone());
        }
        let doc = if uri == DEFAULT_SETTINGS_URI {
            self.aggregate_default()?
        } else {
            self.source.load(uri)?
        };
        self.docs.insert(uri.to_string(), doc.clone());
        Ok(doc)
    }

    /// Each contribution is resolved against its own URI before its
    /// `properties` are merged, so empty-URI references reach the
    /// contribution's local fragments.
    fn aggregate_default(&mut self) -> Result<Value> {
        let mut properties = serde_json::Map::new();
        for name in self.source.contributions()? {
            let doc = self.document(&name)?;
            let resolved = self.resolve(&name, doc, 0)?;
            if let Some(Value::Object(props)) = resolved.get("properties") {
                for (id, schema) in props {
                    properties.insert(id.clone(), schema.clone());
                }
            }
        }
        Ok(serde_json::json!({ "properties": properties }))
    }

    /// All contributed settings as entries, references resolved, in id order.
    pub fn entries(&mut self) -> Result<Vec<SettingsEntry>> {
        let resolved = self.document(DEFAULT_SETTINGS_URI)?;
        let document: SettingsDocument = serde_json::from_value(resolved)
            .map_err(|e| Error::Schema(format!("malformed settings document: {}", e)))?;
        Ok(document
            .properties
            .into_iter()
            .map(|(id, property)| SettingsEntry::new(id, property))
            .collect())
    }

    /// One setting's entry, or `None` when no contribution declares it.
    pub fn entry(&mut self, id: &str) -> Result<Option<SettingsEntry>> {
        Ok(self.entries()?.into_iter().find(|entry| entry.id == id))
    }

    /// Entries as an id-keyed map.
    pub fn entry_map(&mut self) -> Result<BTreeMap<String, SettingsEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect())
    }

    /// Replace every `$ref` node in `value` by its resolved target.
    ///
    /// Sibling keys on the referring node override keys of the target, so a
    /// reference may refine e.g. the description or default of a shared
    /// schema fragment. `depth` counts `$ref` hops only; plain structural
    /// nesting is unbounded.
    fn resolve(&mut self, base_uri: &str, value: Value, depth: usize) -> Result<Value> {
        if depth > MAX_REF_DEPTH {
            return Err(Error::Schema(format!(
                "schema reference depth exceeded in '{}'",
                base_uri
            )));
        }
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    let reference = reference.clone();
                    let (uri, pointer) = split_reference(&reference)?;
                    let target_uri = if uri.is_empty() { base_uri } else { uri };
                    let doc = self.document(target_uri)?;
                    let target = lookup_pointer(&doc, pointer).ok_or_else(|| {
                        Error::Schema(format!("unresolved schema reference '{}'", reference))
                    })?;
                    let mut resolved = match self.resolve(target_uri, target, depth + 1)? {
                        Value::Object(resolved) => resolved,
                        other => return Ok(other),
                    };
                    for (key, sibling) in map {
                        if key == "$ref" {
                            continue;
                        }
                        resolved.insert(key, self.resolve(base_uri, sibling, depth)?);
                    }
                    Ok(Value::Object(resolved))
                } else {
                    let mut resolved = serde_json::Map::new();
                    for (key, child) in map {
                        resolved.insert(key, self.resolve(base_uri, child, depth)?);
                    }
                    Ok(Value::Object(resolved))
                }
            }
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|item| self.resolve(base_uri, item, depth))
                    .collect::<Result<_>>()?,
            )),
            other => Ok(other),
        }
    }
}

/// Split `uri#/a/b` into `("uri", ["a", "b"])`.
fn split_reference(reference: &str) -> Result<(&str, Vec<&str>)> {
    let (uri, fragment) = reference
        .split_once('#')
        .ok_or_else(|| Error::Schema(format!("schema reference '{}' has no fragment", reference)))?;
    let pointer = fragment
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    Ok((uri, pointer))
}

fn lookup_pointer(doc: &Value, pointer: Vec<&str>) -> Option<Value> {
    let mut current = doc;
    for segment in pointer {
        current = current.get(segment)?;
    }
    Some(current.clone())
}
