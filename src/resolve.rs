//! Value resolution across scopes.
//!
//! An [`Inspection`] reports a setting's value in each of the eight slots
//! the store distinguishes. Slot access is exact; [`Inspection::effective`]
//! applies the narrow-to-wide fallback chain the host uses for display.

use serde_json::Value;

use crate::pointer::{ConfigurationTarget, SettingsPointer};
use crate::schema::SettingsEntry;
use crate::store::ConfigStore;
use crate::{patch, Result};

/// A setting's value in every slot: default/global/workspace/folder, each
/// plain and under the inspected language override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inspection {
    pub default_value: Option<Value>,
    pub global_value: Option<Value>,
    pub workspace_value: Option<Value>,
    pub workspace_folder_value: Option<Value>,
    pub default_language_value: Option<Value>,
    pub global_language_value: Option<Value>,
    pub workspace_language_value: Option<Value>,
    pub workspace_folder_language_value: Option<Value>,
}

impl Inspection {
    /// The value in exactly one slot, with no fallback.
    pub fn value_at(
        &self,
        target: ConfigurationTarget,
        override_in_language: bool,
    ) -> Option<&Value> {
        match (target, override_in_language) {
            (ConfigurationTarget::Global, false) => self.global_value.as_ref(),
            (ConfigurationTarget::Workspace, false) => self.workspace_value.as_ref(),
            (ConfigurationTarget::WorkspaceFolder, false) => {
                self.workspace_folder_value.as_ref()
            }
            (ConfigurationTarget::Global, true) => self.global_language_value.as_ref(),
            (ConfigurationTarget::Workspace, true) => self.workspace_language_value.as_ref(),
            (ConfigurationTarget::WorkspaceFolder, true) => {
                self.workspace_folder_language_value.as_ref()
            }
        }
    }

    /// The value the host would apply: narrowest populated slot wins, with
    /// language-override slots ahead of their plain counterparts.
    pub fn effective(&self) -> Option<&Value> {
        self.workspace_folder_language_value
            .as_ref()
            .or(self.workspace_language_value.as_ref())
            .or(self.global_language_value.as_ref())
            .or(self.default_language_value.as_ref())
            .or(self.workspace_folder_value.as_ref())
            .or(self.workspace_value.as_ref())
            .or(self.global_value.as_ref())
            .or(self.default_value.as_ref())
    }

    /// The inspected default, preferring the language-specific one.
    pub fn inspected_default(&self) -> Option<&Value> {
        self.default_language_value
            .as_ref()
            .or(self.default_value.as_ref())
    }
}

/// Default for an entry: inspected default, then schema default, then the
/// type-driven zero value.
pub fn default_value(inspection: &Inspection, entry: &SettingsEntry) -> Value {
    match inspection.inspected_default() {
        Some(value) => value.clone(),
        None => entry.default_value(),
    }
}

/// The whole-setting value currently stored in the pointer's exact slot.
pub fn slot_value(store: &dyn ConfigStore, pointer: &SettingsPointer) -> Result<Option<Value>> {
    let inspection = store.inspect(&pointer.id, pointer.scope.as_ref())?;
    Ok(inspection
        .value_at(pointer.target, pointer.override_in_language)
        .cloned())
}

/// The value at the pointer's detail path within its exact slot.
///
/// A missing intermediate yields `None`, never an error.
pub fn pointer_value(store: &dyn ConfigStore, pointer: &SettingsPointer) -> Result<Option<Value>> {
    let whole = slot_value(store, pointer)?;
    Ok(patch::get_detail_value(whole.as_ref(), &pointer.detail_id).cloned())
}

/// The effective value at the pointer's detail path, across all slots.
pub fn effective_value(
    store: &dyn ConfigStore,
    pointer: &SettingsPointer,
) -> Result<Option<Value>> {
    let inspection = store.inspect(&pointer.id, pointer.scope.as_ref())?;
    Ok(patch::get_detail_value(inspection.effective(), &pointer.detail_id).cloned())
}
