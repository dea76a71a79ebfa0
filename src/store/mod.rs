//! Storage interfaces: the external configuration store and the durable
//! key-value store.
//!
//! The engine only ever talks to these traits. The file-backed defaults live
//! in [`file`]; in-memory doubles for unit tests live in [`memory`].

pub mod file;
pub mod memory;

pub use file::{FileKv, FileStore};
pub use memory::{MemoryKv, MemoryStore};

use serde_json::Value;

use crate::pointer::{ConfigurationTarget, ScopeToken};
use crate::resolve::Inspection;
use crate::Result;

/// The host's configuration store.
///
/// `id` is always the full dotted setting id; values are whole-setting
/// values. Detail paths are patched by the caller before the write reaches
/// the store.
pub trait ConfigStore: Send + Sync {
    /// Report the value of `id` in every slot, resolved against `scope`.
    fn inspect(&self, id: &str, scope: Option<&ScopeToken>) -> Result<Inspection>;

    /// Write (`Some`) or unset (`None`) the value of `id` at `target`.
    ///
    /// When `override_in_language` is set and the scope carries a language
    /// id, the write lands in that language's override section.
    fn update(
        &self,
        id: &str,
        value: Option<&Value>,
        target: ConfigurationTarget,
        override_in_language: bool,
        scope: Option<&ScopeToken>,
    ) -> Result<()>;
}

/// Durable key-value storage for recency lists and persisted history.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// All stored keys, for prefix-scoped clearing.
    fn keys(&self) -> Result<Vec<String>>;
}
