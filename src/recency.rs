//! Recently-used tracking.
//!
//! Four bounded most-recent-first lists, persisted in the key-value store:
//! setting ids (global), detail paths (per setting), whole values (per
//! pointer), and array items (per pointer). Updates happen only when an edit
//! actually commits; previews and undo/redo replay leave recency untouched.
//!
//! Values and array items are stored in serialized form so that deduping is
//! by serialized equality, which keeps `1` and `1.0` distinct.

use serde_json::Value;

use crate::pointer::SettingsPointer;
use crate::store::KeyValueStore;
use crate::Result;

const ENTRIES_KEY: &str = "recent/entries";
const DETAILS_PREFIX: &str = "recent/details/";
const VALUES_PREFIX: &str = "recent/values/";
const ITEMS_PREFIX: &str = "recent/items/";

const ENTRIES_CAP: usize = 128;
const DETAILS_CAP: usize = 32;
const VALUES_CAP: usize = 8;
const ITEMS_CAP: usize = 32;

/// Recency lists over a key-value store.
pub struct Recency<'a> {
    kv: &'a dyn KeyValueStore,
}

impl<'a> Recency<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self { kv }
    }

    /// Recently edited setting ids, most recent first.
    pub fn entries(&self) -> Result<Vec<String>> {
        self.list(ENTRIES_KEY)
    }

    /// Move `id` to the front of the entry list.
    pub fn note_entry(&self, id: &str) -> Result<()> {
        self.push(ENTRIES_KEY, id, ENTRIES_CAP)
    }

    /// Recently edited detail paths of the setting `id`, most recent first.
    pub fn details(&self, id: &str) -> Result<Vec<Vec<String>>> {
        Ok(self
            .list(&format!("{}{}", DETAILS_PREFIX, id))?
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect())
    }

    /// Recently committed values at `pointer`, most recent first.
    pub fn values(&self, pointer: &SettingsPointer) -> Result<Vec<Value>> {
        Ok(self
            .list(&format!("{}{}", VALUES_PREFIX, pointer.storage_key()))?
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect())
    }

    /// Recently added or removed array items at `pointer`, most recent first.
    pub fn array_items(&self, pointer: &SettingsPointer) -> Result<Vec<Value>> {
        Ok(self
            .list(&format!("{}{}", ITEMS_PREFIX, pointer.storage_key()))?
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect())
    }

    /// Record one committed edit across all four lists.
    pub fn record(
        &self,
        pointer: &SettingsPointer,
        old_value: Option<&Value>,
        new_value: Option<&Value>,
    ) -> Result<()> {
        self.note_entry(&pointer.id)?;

        if !pointer.detail_id.is_empty() {
            let serialized = serde_json::to_string(&pointer.detail_id)?;
            self.push(
                &format!("{}{}", DETAILS_PREFIX, pointer.id),
                &serialized,
                DETAILS_CAP,
            )?;
        }

        // Old before new, so the value just written ends up in front.
        let values_key = format!("{}{}", VALUES_PREFIX, pointer.storage_key());
        for value in [old_value, new_value].into_iter().flatten() {
            self.push(&values_key, &serde_json::to_string(value)?, VALUES_CAP)?;
        }

        // Items that appear on exactly one side of the edit were just added
        // or removed; both directions are worth offering again.
        if matches!(old_value, Some(Value::Array(_))) || matches!(new_value, Some(Value::Array(_)))
        {
            let items_key = format!("{}{}", ITEMS_PREFIX, pointer.storage_key());
            for item in symmetric_difference(old_value, new_value)? {
                self.push(&items_key, &item, ITEMS_CAP)?;
            }
        }
        Ok(())
    }

    /// Forget everything.
    pub fn clear(&self) -> Result<()> {
        for key in self.kv.keys()? {
            if key == ENTRIES_KEY
                || key.starts_with(DETAILS_PREFIX)
                || key.starts_with(VALUES_PREFIX)
                || key.starts_with(ITEMS_PREFIX)
            {
                self.kv.remove(&key)?;
            }
        }
        Ok(())
    }

    fn list(&self, key: &str) -> Result<Vec<String>> {
        Ok(match self.kv.get(key)? {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    fn push(&self, key: &str, item: &str, cap: usize) -> Result<()> {
        let mut list = self.list(key)?;
        list.retain(|existing| existing != item);
        list.insert(0, item.to_string());
        list.truncate(cap);
        self.kv.set(key, &serde_json::to_value(list)?)
    }
}

/// Serialized items present in exactly one of the two array values.
///
/// A non-array (or absent) side contributes no items.
fn symmetric_difference(
    old_value: Option<&Value>,
    new_value: Option<&Value>,
) -> Result<Vec<String>> {
    let serialize = |value: Option<&Value>| -> Result<Vec<String>> {
        match value {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| Ok(serde_json::to_string(item)?))
                .collect(),
            _ => Ok(Vec::new()),
        }
    };
    let old_items = serialize(old_value)?;
    let new_items = serialize(new_value)?;
    let mut difference: Vec<String> = old_items
        .iter()
        .filter(|item| !new_items.contains(item))
        .cloned()
        .collect();
    difference.extend(
        new_items
            .iter()
            .filter(|item| !old_items.contains(item))
            .cloned(),
    );
    difference.dedup();
    Ok(difference)
}
