//! Command implementations for the trimtab CLI.
//!
//! Each command opens a [`Workbench`] (stores, schema entries, environment
//! snapshot) against the workspace's data directory, runs the engine, and
//! returns a result that renders as JSON or human-readable text.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::history::{NoopUiState, Session, UndoEntry};
use crate::menu::console::{ConsoleInput, ConsolePicker};
use crate::menu::Menu;
use crate::pointer::{ConfigurationTarget, SettingsPointer};
use crate::queue::{WriteDisposition, WriteQueue};
use crate::recency::Recency;
use crate::resolve;
use crate::schema::source::get_schema_dir;
use crate::schema::{render_value, FileSchemaSource, SchemaCache, SettingsEntry};
use crate::scope::Environment;
use crate::store::file::get_data_dir;
use crate::store::{ConfigStore, FileKv, FileStore};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Everything a command needs: environment snapshot, stores, and the
/// contributed settings.
pub struct Workbench {
    pub workspace: PathBuf,
    pub env: Environment,
    pub store: FileStore,
    pub kv: FileKv,
    pub entries: Vec<SettingsEntry>,
}

impl Workbench {
    pub fn open(
        workspace: &Path,
        doc: Option<&str>,
        language: Option<&str>,
        extra_folders: &[String],
    ) -> Result<Self> {
        let data_dir = get_data_dir(workspace)?;
        let source = FileSchemaSource::new(get_schema_dir(&data_dir));
        let entries = SchemaCache::new(&source).entries()?;
        let mut defaults = BTreeMap::new();
        for entry in &entries {
            if let Some(default) = &entry.property.default {
                defaults.insert(entry.id.clone(), default.clone());
            }
        }
        Ok(Self {
            workspace: workspace.to_path_buf(),
            env: Environment::detect(workspace, doc, language, extra_folders),
            store: FileStore::with_defaults(&data_dir, defaults),
            kv: FileKv::new(&data_dir),
            entries,
        })
    }

    fn entry(&self, id: &str) -> Result<&SettingsEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| Error::UnknownSetting(id.to_string()))
    }

    fn pointer(
        &self,
        id: &str,
        target: &str,
        in_language: bool,
        detail: &[String],
    ) -> Result<SettingsPointer> {
        let entry = self.entry(id)?;
        let target = ConfigurationTarget::parse(target)
            .ok_or_else(|| Error::InvalidInput(format!("unknown target '{}'", target)))?;
        let mut pointer = self.env.pointer(entry, target, in_language);
        pointer.detail_id = detail.to_vec();
        Ok(pointer)
    }

    fn session(&self) -> Result<Session<'_>> {
        Session::open(&self.store, &self.kv, &NoopUiState, WriteQueue::new())
    }
}

/// One scope slot of a `get` result.
#[derive(Debug, Serialize)]
pub struct SlotValue {
    pub slot: String,
    pub value: Value,
}

/// Result of `tt get`.
#[derive(Debug, Serialize)]
pub struct GetResult {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<String>,
    #[serde(rename = "type")]
    pub display_type: String,
    pub default: Value,
    pub effective: Value,
    /// Slots holding an explicit value, narrowest last.
    pub configured: Vec<SlotValue>,
}

impl Output for GetResult {
    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{}: {}", self.id, self.display_type),
            format!("  effective = {}", render_value(&self.effective)),
            format!("  default   = {}", render_value(&self.default)),
        ];
        for slot in &self.configured {
            lines.push(format!("  {} = {}", slot.slot, render_value(&slot.value)));
        }
        lines.join("\n")
    }
}

/// Show a setting's resolved values.
pub fn get(workbench: &Workbench, id: &str, detail: &[String]) -> Result<GetResult> {
    let entry = workbench.entry(id)?;
    // Inspect under the widest scope so folder and language slots resolve.
    let scope = workbench
        .env
        .resolve_scope(ConfigurationTarget::WorkspaceFolder, true);
    let inspection = workbench.store.inspect(id, scope.as_ref())?;
    let default = resolve::default_value(&inspection, entry);
    let effective = inspection.effective().cloned().unwrap_or(default.clone());

    let mut configured = Vec::new();
    let slots: [(&str, Option<&Value>); 6] = [
        ("global", inspection.global_value.as_ref()),
        ("workspace", inspection.workspace_value.as_ref()),
        ("folder", inspection.workspace_folder_value.as_ref()),
        ("global[language]", inspection.global_language_value.as_ref()),
        (
            "workspace[language]",
            inspection.workspace_language_value.as_ref(),
        ),
        (
            "folder[language]",
            inspection.workspace_folder_language_value.as_ref(),
        ),
    ];
    for (slot, value) in slots {
        if let Some(value) = value {
            configured.push(SlotValue {
                slot: slot.to_string(),
                value: value.clone(),
            });
        }
    }

    let project = |value: &Value| {
        crate::patch::get_detail_value(Some(value), detail)
            .cloned()
            .unwrap_or(Value::Null)
    };
    Ok(GetResult {
        id: id.to_string(),
        detail: detail.to_vec(),
        display_type: entry.display_type(),
        default: project(&default),
        effective: project(&effective),
        configured: configured
            .into_iter()
            .map(|slot| SlotValue {
                value: project(&slot.value),
                slot: slot.slot,
            })
            .collect(),
    })
}

/// Result of `tt set` / `tt unset`.
#[derive(Debug, Serialize)]
pub struct SetResult {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<String>,
    pub target: String,
    pub in_language: bool,
    pub old_value: Value,
    pub new_value: Value,
    pub disposition: String,
}

impl Output for SetResult {
    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        format!(
            "{} @ {}: {} -> {} ({})",
            self.id,
            self.target,
            render_value(&self.old_value),
            render_value(&self.new_value),
            self.disposition
        )
    }
}

/// Set or unset a value without the picker.
pub fn set(
    workbench: &Workbench,
    id: &str,
    value: Option<Value>,
    target: &str,
    in_language: bool,
    detail: &[String],
) -> Result<SetResult> {
    let pointer = workbench.pointer(id, target, in_language, detail)?;
    let old_value = resolve::pointer_value(&workbench.store, &pointer)?;
    let mut session = workbench.session()?;
    let ticket = session.commit(UndoEntry {
        pointer: pointer.clone(),
        old_value: old_value.clone(),
        new_value: value.clone(),
    })?;
    session.settle();
    let disposition = match ticket.wait() {
        WriteDisposition::Committed => "committed".to_string(),
        WriteDisposition::Superseded => "superseded".to_string(),
        WriteDisposition::Failed(message) => return Err(Error::Other(message)),
    };
    Ok(SetResult {
        id: id.to_string(),
        detail: detail.to_vec(),
        target: pointer.target.to_string(),
        in_language: pointer.override_in_language,
        old_value: old_value.unwrap_or(Value::Null),
        new_value: value.unwrap_or(Value::Null),
        disposition,
    })
}

/// Summary of one history entry.
#[derive(Debug, Serialize)]
pub struct ChangeSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<String>,
    pub target: String,
    pub old_value: Value,
    pub new_value: Value,
}

impl ChangeSummary {
    fn of(entry: &UndoEntry) -> Self {
        Self {
            id: entry.pointer.id.clone(),
            detail: entry.pointer.detail_id.clone(),
            target: entry.pointer.target.to_string(),
            old_value: entry.old_value.clone().unwrap_or(Value::Null),
            new_value: entry.new_value.clone().unwrap_or(Value::Null),
        }
    }
}

/// Result of `tt undo` / `tt redo` / `tt history clear`.
#[derive(Debug, Serialize)]
pub struct HistoryAction {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeSummary>,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl Output for HistoryAction {
    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        match &self.change {
            Some(change) => format!(
                "{} {}: {} -> {}",
                self.action,
                change.id,
                render_value(&change.old_value),
                render_value(&change.new_value)
            ),
            None => format!("nothing to {}", self.action),
        }
    }
}

/// Revert the most recent change.
pub fn undo(workbench: &Workbench) -> Result<HistoryAction> {
    let mut session = workbench.session()?;
    let change = session.last_change().map(ChangeSummary::of);
    let reverted = session.undo()?.is_some();
    session.settle();
    Ok(HistoryAction {
        action: "undo".to_string(),
        change: change.filter(|_| reverted),
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
    })
}

/// Replay the most recently undone change.
pub fn redo(workbench: &Workbench) -> Result<HistoryAction> {
    let mut session = workbench.session()?;
    let change = session.next_redo().map(ChangeSummary::of);
    let replayed = session.redo()?.is_some();
    session.settle();
    Ok(HistoryAction {
        action: "redo".to_string(),
        change: change.filter(|_| replayed),
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
    })
}

/// Clear history and recency.
pub fn history_clear(workbench: &Workbench) -> Result<HistoryAction> {
    let mut session = workbench.session()?;
    session.clear_history()?;
    Recency::new(&workbench.kv).clear()?;
    Ok(HistoryAction {
        action: "clear".to_string(),
        change: None,
        can_undo: false,
        can_redo: false,
    })
}

/// Result of `tt history show`.
#[derive(Debug, Serialize)]
pub struct HistoryShow {
    /// Most recent first.
    pub undo: Vec<ChangeSummary>,
    /// Next to replay first.
    pub redo: Vec<ChangeSummary>,
    pub recent_settings: Vec<String>,
}

impl Output for HistoryShow {
    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("undo ({}):", self.undo.len()));
        for change in &self.undo {
            lines.push(format!(
                "  {} @ {}: {} -> {}",
                change.id,
                change.target,
                render_value(&change.old_value),
                render_value(&change.new_value)
            ));
        }
        lines.push(format!("redo ({}):", self.redo.len()));
        for change in &self.redo {
            lines.push(format!(
                "  {} @ {}: {} -> {}",
                change.id,
                change.target,
                render_value(&change.old_value),
                render_value(&change.new_value)
            ));
        }
        lines.push("recent:".to_string());
        for id in &self.recent_settings {
            lines.push(format!("  {}", id));
        }
        lines.join("\n")
    }
}

/// Show history stacks and recently edited settings.
pub fn history_show(workbench: &Workbench) -> Result<HistoryShow> {
    let session = workbench.session()?;
    Ok(HistoryShow {
        undo: session
            .undo_stack()
            .iter()
            .rev()
            .map(ChangeSummary::of)
            .collect(),
        redo: session
            .redo_stack()
            .iter()
            .rev()
            .map(ChangeSummary::of)
            .collect(),
        recent_settings: Recency::new(&workbench.kv).entries()?,
    })
}

/// One row of `tt list`.
#[derive(Debug, Serialize)]
pub struct ListItem {
    pub id: String,
    #[serde(rename = "type")]
    pub display_type: String,
    pub value: Value,
    /// True when the effective value differs from the default.
    pub changed: bool,
}

/// Result of `tt list`.
#[derive(Debug, Serialize)]
pub struct ListResult {
    pub settings: Vec<ListItem>,
}

impl Output for ListResult {
    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        self.settings
            .iter()
            .map(|item| {
                format!(
                    "{}{}: {} = {}",
                    if item.changed { "* " } else { "  " },
                    item.id,
                    item.display_type,
                    render_value(&item.value)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List every contributed setting, recently edited ones first.
pub fn list(workbench: &Workbench) -> Result<ListResult> {
    let recent = Recency::new(&workbench.kv).entries()?;
    let scope = workbench
        .env
        .resolve_scope(ConfigurationTarget::WorkspaceFolder, true);
    let mut ordered: Vec<&SettingsEntry> = Vec::with_capacity(workbench.entries.len());
    for id in &recent {
        if let Some(entry) = workbench.entries.iter().find(|e| &e.id == id) {
            ordered.push(entry);
        }
    }
    for entry in &workbench.entries {
        if !recent.contains(&entry.id) {
            ordered.push(entry);
        }
    }
    let mut settings = Vec::with_capacity(ordered.len());
    for entry in ordered {
        let inspection = workbench.store.inspect(&entry.id, scope.as_ref())?;
        let default = resolve::default_value(&inspection, entry);
        let value = inspection.effective().cloned().unwrap_or(default.clone());
        settings.push(ListItem {
            id: entry.id.clone(),
            display_type: entry.display_type(),
            changed: value != default,
            value,
        });
    }
    Ok(ListResult { settings })
}

/// Run the interactive settings picker.
pub fn edit(workbench: &Workbench) -> Result<HistoryAction> {
    let mut session = workbench.session()?;
    let mut picker = ConsolePicker;
    let mut input = ConsoleInput;
    Menu::new(&mut session, &workbench.env, &mut picker, &mut input)
        .run(&workbench.entries)?;
    session.settle();
    Ok(HistoryAction {
        action: "edit".to_string(),
        change: session.last_change().map(ChangeSummary::of),
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
    })
}

/// Parse a CLI value argument: JSON when it parses, bare string otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
