//! Interactive settings menus.
//!
//! The picker and input box are traits so the flows can run against the
//! console, a host UI, or a script in tests. The picker reports an explicit
//! outcome; highlight events only ever drive previews, and it is the flow
//! here, not the picker, that decides to preview, commit, or roll back.

pub mod console;
pub mod values;

use serde_json::Value;

use crate::history::{Session, UndoEntry};
use crate::pointer::{ConfigurationTarget, SettingsPointer};
use crate::recency::Recency;
use crate::resolve;
use crate::schema::{render_value, PrimitiveType, PropertySchema, SettingScope, SettingsEntry};
use crate::scope::Environment;
use crate::{Error, Result};

/// One row of a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            detail: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }
}

/// How a picker interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// The item at this index was confirmed.
    Confirmed(usize),
    /// The picker was closed without confirming.
    Dismissed,
}

/// List selection surface.
pub trait Picker {
    /// Show `items`; call `on_highlight` as the selection moves; return the
    /// final outcome.
    fn pick(
        &mut self,
        title: &str,
        items: &[MenuItem],
        on_highlight: &mut dyn FnMut(usize),
    ) -> Result<PickOutcome>;
}

/// Free-text input surface with inline validation.
pub trait InputBox {
    /// Prompt for text. `validate` returns a message for invalid input,
    /// which must be surfaced and must keep the box open. `None` means the
    /// box was dismissed.
    fn input(
        &mut self,
        prompt: &str,
        initial: &str,
        validate: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Result<Option<String>>;
}

/// What confirming an edit-menu row does.
enum EditAction {
    Reset,
    Candidate(Value),
    InputText,
    InputNumber { integer: bool },
    InputJson(PrimitiveType),
    AddItem,
    RemoveItem,
    Drill(String),
}

/// The interactive flows, generic over picker and input implementations.
pub struct Menu<'s, 'a> {
    session: &'s mut Session<'a>,
    env: &'s Environment,
    picker: &'s mut dyn Picker,
    input: &'s mut dyn InputBox,
}

impl<'s, 'a> Menu<'s, 'a> {
    pub fn new(
        session: &'s mut Session<'a>,
        env: &'s Environment,
        picker: &'s mut dyn Picker,
        input: &'s mut dyn InputBox,
    ) -> Self {
        Self {
            session,
            env,
            picker,
            input,
        }
    }

    /// Top-level settings list: undo/redo rows first, then every entry,
    /// recently edited ones in front.
    pub fn run(&mut self, entries: &[SettingsEntry]) -> Result<()> {
        loop {
            let ordered = self.order_by_recency(entries)?;
            let mut items = Vec::new();
            // Row indices below `first_entry` are history actions.
            let mut history_rows = 0;
            if let Some(last) = self.session.last_change() {
                items.push(
                    MenuItem::new("undo")
                        .description(format!("revert the last change to {}", last.pointer.id)),
                );
                history_rows += 1;
            }
            if let Some(next) = self.session.next_redo() {
                items.push(
                    MenuItem::new("redo")
                        .description(format!("replay the change to {}", next.pointer.id)),
                );
                history_rows += 1;
            }
            for entry in &ordered {
                items.push(self.entry_item(entry)?);
            }
            let outcome = self.picker.pick("Settings", &items, &mut |_| {})?;
            let PickOutcome::Confirmed(index) = outcome else {
                return Ok(());
            };
            if index < history_rows {
                let undo_row = self.session.can_undo() && index == 0;
                if undo_row {
                    self.session.undo()?;
                } else {
                    self.session.redo()?;
                }
                self.session.settle();
                continue;
            }
            let entry = &ordered[index - history_rows];
            self.edit_entry(entry)?;
        }
    }

    /// Context selection followed by the edit menu for one setting.
    pub fn edit_entry(&mut self, entry: &SettingsEntry) -> Result<()> {
        let Some((target, override_in_language)) = self.select_context(entry)? else {
            return Ok(());
        };
        let pointer = self.env.pointer(entry, target, override_in_language);
        self.edit_menu(entry, &pointer)
    }

    fn entry_item(&self, entry: &SettingsEntry) -> Result<MenuItem> {
        // The widest scope, so the displayed value is the one the host
        // actually applies to the active document.
        let scope = self
            .env
            .resolve_scope(ConfigurationTarget::WorkspaceFolder, true);
        let inspection = self.session.store().inspect(&entry.id, scope.as_ref())?;
        let default = resolve::default_value(&inspection, entry);
        let effective = inspection.effective().cloned().unwrap_or(default.clone());
        let marker = if effective == default { "" } else { "* " };
        Ok(MenuItem::new(setting_label(&entry.id)).description(format!(
            "{}{}: {} = {}",
            marker,
            entry.id,
            entry.display_type(),
            render_value(&effective)
        )))
    }

    fn order_by_recency(&self, entries: &[SettingsEntry]) -> Result<Vec<SettingsEntry>> {
        let recent = Recency::new(self.session.kv()).entries()?;
        let mut ordered = Vec::with_capacity(entries.len());
        for id in &recent {
            if let Some(entry) = entries.iter().find(|e| &e.id == id) {
                ordered.push(entry.clone());
            }
        }
        for entry in entries {
            if !recent.contains(&entry.id) {
                ordered.push(entry.clone());
            }
        }
        Ok(ordered)
    }

    /// Offer the contexts the setting's scope classification admits.
    ///
    /// Workspace needs an open workspace and a non-application, non-machine
    /// setting; a folder context additionally needs more than one folder and
    /// a non-window setting. Language variants need an active language and a
    /// language-overridable (or unclassified) setting.
    fn select_context(
        &mut self,
        entry: &SettingsEntry,
    ) -> Result<Option<(ConfigurationTarget, bool)>> {
        let scope = entry.property.scope;
        let folders = self.env.workspace_folders.len();
        let workspace_ok = folders >= 1
            && !matches!(
                scope,
                Some(SettingScope::Application) | Some(SettingScope::Machine)
            );
        let folder_ok = folders > 1
            && workspace_ok
            && !matches!(scope, Some(SettingScope::Window));
        let language_ok = self.env.language_id().is_some()
            && (entry.property.overridable.unwrap_or(false)
                || scope.is_none()
                || scope == Some(SettingScope::LanguageOverridable));

        let mut contexts = vec![(ConfigurationTarget::Global, false)];
        if workspace_ok {
            contexts.push((ConfigurationTarget::Workspace, false));
        }
        if folder_ok {
            contexts.push((ConfigurationTarget::WorkspaceFolder, false));
        }
        if language_ok {
            let plain: Vec<_> = contexts.clone();
            for (target, _) in plain {
                contexts.push((target, true));
            }
        }
        if contexts.len() == 1 {
            return Ok(Some(contexts[0]));
        }
        let items: Vec<MenuItem> = contexts
            .iter()
            .map(|&(target, override_in_language)| {
                MenuItem::new(context_label(
                    target,
                    override_in_language,
                    self.env.language_id(),
                ))
            })
            .collect();
        let title = format!("Where should {} apply?", entry.id);
        match self.picker.pick(&title, &items, &mut |_| {})? {
            PickOutcome::Confirmed(index) => Ok(Some(contexts[index])),
            PickOutcome::Dismissed => Ok(None),
        }
    }

    /// The per-setting edit menu. Loops after each committed edit so the
    /// refreshed current value is visible; dismissing rolls back any
    /// highlight preview and returns.
    fn edit_menu(&mut self, entry: &SettingsEntry, pointer: &SettingsPointer) -> Result<()> {
        loop {
            let property = detail_property(entry, pointer)?;
            let current = resolve::pointer_value(self.session.store(), pointer)?;
            let inspection = self
                .session
                .store()
                .inspect(&pointer.id, pointer.scope.as_ref())?;
            let default = if pointer.detail_id.is_empty() {
                resolve::default_value(&inspection, entry)
            } else {
                property.default.clone().unwrap_or_else(|| {
                    SettingsEntry::new(pointer.id.as_str(), property.clone()).default_value()
                })
            };
            let recency = Recency::new(self.session.kv());
            let recents = recency.values(pointer)?;
            let scoped_entry = SettingsEntry::new(pointer.id.clone(), property.clone());
            let candidates =
                values::enumerate(&scoped_entry, current.as_ref(), &default, &recents);

            let mut items = Vec::new();
            let mut actions = Vec::new();
            items.push(
                MenuItem::new("reset")
                    .description(format!(
                        "remove the value from {}",
                        context_label(
                            pointer.target,
                            pointer.override_in_language,
                            pointer.language_id()
                        )
                    ))
                    .detail(Some(scoped_entry.full_description())),
            );
            actions.push(EditAction::Reset);

            if property.has_type(PrimitiveType::String) && property.enum_values.is_none() {
                items.push(MenuItem::new("enter a string...").description("typed input"));
                actions.push(EditAction::InputText);
            }
            if property.has_type(PrimitiveType::Integer) {
                items.push(MenuItem::new("enter an integer...").description("typed input"));
                actions.push(EditAction::InputNumber { integer: true });
            } else if property.has_type(PrimitiveType::Number) {
                items.push(MenuItem::new("enter a number...").description("typed input"));
                actions.push(EditAction::InputNumber { integer: false });
            }
            if property.has_type(PrimitiveType::Array) {
                items.push(MenuItem::new("enter a JSON array...").description("typed input"));
                actions.push(EditAction::InputJson(PrimitiveType::Array));
                items.push(MenuItem::new("add an item...").description("append to the array"));
                actions.push(EditAction::AddItem);
                if matches!(current, Some(Value::Array(ref a)) if !a.is_empty()) {
                    items.push(MenuItem::new("remove an item...").description("pick one to drop"));
                    actions.push(EditAction::RemoveItem);
                }
            }
            if property.has_type(PrimitiveType::Object) {
                let properties = property.merged_properties();
                if properties.is_empty() {
                    items.push(
                        MenuItem::new("enter a JSON object...").description("typed input"),
                    );
                    actions.push(EditAction::InputJson(PrimitiveType::Object));
                } else {
                    for key in ordered_detail_keys(&recency, pointer, &properties)? {
                        let child = &properties[&key];
                        items.push(
                            MenuItem::new(format!("edit {}...", key))
                                .description("nested property")
                                .detail(child.plain_description()),
                        );
                        actions.push(EditAction::Drill(key));
                    }
                }
            }
            for candidate in &candidates {
                items.push(
                    MenuItem::new(render_value(&candidate.value))
                        .description(candidate.description.clone())
                        .detail(candidate.detail.clone()),
                );
                actions.push(EditAction::Candidate(candidate.value.clone()));
            }

            let title = format!(
                "{} ({})",
                setting_label(&pointer_display_id(pointer)),
                context_label(
                    pointer.target,
                    pointer.override_in_language,
                    pointer.language_id()
                )
            );
            let session = &mut *self.session;
            let outcome = {
                let preview = &mut |index: usize| {
                    // Only candidate rows preview on highlight.
                    if let Some(EditAction::Candidate(value)) = actions.get(index) {
                        session.preview(pointer.clone(), Some(value.clone()));
                    }
                };
                self.picker.pick(&title, &items, preview)?
            };
            let index = match outcome {
                PickOutcome::Confirmed(index) => index,
                PickOutcome::Dismissed => {
                    // Cancel any in-flight preview by restoring the value
                    // the menu opened with.
                    self.session.preview(pointer.clone(), current.clone());
                    return Ok(());
                }
            };
            match &actions[index] {
                EditAction::Reset => {
                    self.commit(pointer, current.clone(), None)?;
                }
                EditAction::Candidate(value) => {
                    self.commit(pointer, current.clone(), Some(value.clone()))?;
                }
                EditAction::InputText => {
                    if let Some(text) = self.input_string(&property, current.as_ref())? {
                        self.commit(pointer, current.clone(), Some(Value::String(text)))?;
                    }
                }
                EditAction::InputNumber { integer } => {
                    if let Some(value) =
                        self.input_number(&property, current.as_ref(), *integer)?
                    {
                        self.commit(pointer, current.clone(), Some(value))?;
                    }
                }
                EditAction::InputJson(expected) => {
                    if let Some(value) = self.input_json(current.as_ref(), *expected)? {
                        self.commit(pointer, current.clone(), Some(value))?;
                    }
                }
                EditAction::AddItem => {
                    self.add_array_item(pointer, &property, current.clone())?;
                }
                EditAction::RemoveItem => {
                    self.remove_array_item(pointer, current.clone())?;
                }
                EditAction::Drill(key) => {
                    let child = pointer.detail(key.clone());
                    self.edit_menu(entry, &child)?;
                }
            }
        }
    }

    /// Commit a confirmed edit and wait for it to land, so the menu loop
    /// reads back the refreshed value. Only previews stay debounced.
    fn commit(
        &mut self,
        pointer: &SettingsPointer,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Result<()> {
        self.session.commit(UndoEntry {
            pointer: pointer.clone(),
            old_value,
            new_value,
        })?;
        self.session.settle();
        Ok(())
    }

    fn input_string(
        &mut self,
        property: &PropertySchema,
        current: Option<&Value>,
    ) -> Result<Option<String>> {
        let pattern = match &property.pattern {
            Some(raw) => Some(
                regex::Regex::new(raw)
                    .map_err(|e| Error::Schema(format!("bad string pattern: {}", e)))?,
            ),
            None => None,
        };
        let initial = match current {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        self.input.input("string value", &initial, &mut |text| {
            match &pattern {
                Some(re) if !re.is_match(text) => {
                    Some(format!("value must match pattern {}", re.as_str()))
                }
                _ => None,
            }
        })
    }

    fn input_number(
        &mut self,
        property: &PropertySchema,
        current: Option<&Value>,
        integer: bool,
    ) -> Result<Option<Value>> {
        let minimum = property.minimum;
        let maximum = property.maximum;
        let initial = match current {
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let prompt = if integer { "integer value" } else { "number value" };
        let text = self.input.input(prompt, &initial, &mut |text| {
            let parsed: f64 = match text.trim().parse() {
                Ok(parsed) => parsed,
                Err(_) => return Some("not a number".to_string()),
            };
            if integer && parsed.fract() != 0.0 {
                return Some("not an integer".to_string());
            }
            if let Some(minimum) = minimum {
                if parsed < minimum {
                    return Some(format!("must be at least {}", minimum));
                }
            }
            if let Some(maximum) = maximum {
                if parsed > maximum {
                    return Some(format!("must be at most {}", maximum));
                }
            }
            None
        })?;
        Ok(match text {
            Some(text) => {
                let parsed: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidInput(format!("not a number: '{}'", text)))?;
                if integer {
                    Some(Value::Number((parsed as i64).into()))
                } else {
                    serde_json::Number::from_f64(parsed).map(Value::Number)
                }
            }
            None => None,
        })
    }

    fn input_json(
        &mut self,
        current: Option<&Value>,
        expected: PrimitiveType,
    ) -> Result<Option<Value>> {
        let initial = current.map(|v| v.to_string()).unwrap_or_default();
        let text = self.input.input("JSON value", &initial, &mut |text| {
            match serde_json::from_str::<Value>(text) {
                Ok(parsed) if PrimitiveType::of_value(&parsed) == expected => None,
                Ok(_) => Some(format!("expected {} JSON", expected)),
                Err(e) => Some(format!("invalid JSON: {}", e)),
            }
        })?;
        Ok(match text {
            Some(text) => Some(serde_json::from_str(&text)?),
            None => None,
        })
    }

    /// Append one item: recent array items are offered first, with a typed
    /// input escape hatch.
    fn add_array_item(
        &mut self,
        pointer: &SettingsPointer,
        property: &PropertySchema,
        current: Option<Value>,
    ) -> Result<()> {
        let recents = Recency::new(self.session.kv()).array_items(pointer)?;
        let mut items = vec![MenuItem::new("enter a new item...").description("typed input")];
        for recent in &recents {
            items.push(MenuItem::new(render_value(recent)).description("recently used"));
        }
        let outcome = self.picker.pick("Add item", &items, &mut |_| {})?;
        let PickOutcome::Confirmed(index) = outcome else {
            return Ok(());
        };
        let item = if index == 0 {
            let item_is_string = property
                .items
                .as_ref()
                .map(|items| items.has_type(PrimitiveType::String))
                .unwrap_or(true);
            let Some(text) = self.input.input("new item", "", &mut |text| {
                if item_is_string {
                    None
                } else {
                    serde_json::from_str::<Value>(text)
                        .err()
                        .map(|e| format!("invalid JSON: {}", e))
                }
            })?
            else {
                return Ok(());
            };
            if item_is_string {
                Value::String(text)
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            recents[index - 1].clone()
        };
        let mut array = match &current {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        array.push(item);
        self.commit(pointer, current, Some(Value::Array(array)))
    }

    fn remove_array_item(
        &mut self,
        pointer: &SettingsPointer,
        current: Option<Value>,
    ) -> Result<()> {
        let Some(Value::Array(existing)) = &current else {
            return Ok(());
        };
        let items: Vec<MenuItem> = existing
            .iter()
            .map(|item| MenuItem::new(render_value(item)))
            .collect();
        let outcome = self.picker.pick("Remove item", &items, &mut |_| {})?;
        let PickOutcome::Confirmed(index) = outcome else {
            return Ok(());
        };
        let mut remaining = existing.clone();
        remaining.remove(index);
        let new_value = if remaining.is_empty() {
            None
        } else {
            Some(Value::Array(remaining))
        };
        self.commit(pointer, current, new_value)
    }
}

/// Keys of an object property, recently edited detail paths first.
fn ordered_detail_keys(
    recency: &Recency,
    pointer: &SettingsPointer,
    properties: &std::collections::BTreeMap<String, PropertySchema>,
) -> Result<Vec<String>> {
    let depth = pointer.detail_id.len();
    let mut ordered = Vec::new();
    for path in recency.details(&pointer.id)? {
        // Only paths extending this pointer by exactly one segment apply.
        if path.len() == depth + 1 && path[..depth] == pointer.detail_id[..] {
            let key = &path[depth];
            if properties.contains_key(key) && !ordered.contains(key) {
                ordered.push(key.clone());
            }
        }
    }
    for key in properties.keys() {
        if !ordered.contains(key) {
            ordered.push(key.clone());
        }
    }
    Ok(ordered)
}

/// Schema for the value at the pointer's detail path, walking nested
/// `properties` and `items` declarations.
fn detail_property(entry: &SettingsEntry, pointer: &SettingsPointer) -> Result<PropertySchema> {
    let mut property = entry.property.clone();
    for segment in &pointer.detail_id {
        if segment.parse::<usize>().is_ok() {
            if let Some(items) = &property.items {
                property = (**items).clone();
                continue;
            }
        }
        let merged = property.merged_properties();
        property = merged.get(segment).cloned().unwrap_or_default();
    }
    Ok(property)
}

fn pointer_display_id(pointer: &SettingsPointer) -> String {
    let mut id = pointer.id.clone();
    for segment in &pointer.detail_id {
        id.push('.');
        id.push_str(segment);
    }
    id
}

/// Human label for a setting id: `editor.tabSize` becomes
/// `Editor › Tab Size`.
pub fn setting_label(id: &str) -> String {
    id.split('.')
        .map(camel_to_title)
        .collect::<Vec<_>>()
        .join(" › ")
}

fn camel_to_title(segment: &str) -> String {
    let mut words = String::new();
    for (index, ch) in segment.chars().enumerate() {
        if index == 0 {
            words.extend(ch.to_uppercase());
        } else {
            if ch.is_uppercase() {
                words.push(' ');
            }
            words.push(ch);
        }
    }
    words
}

/// Human label for an edit context: `Workspace[rust]`, `Global`.
pub fn context_label(
    target: ConfigurationTarget,
    override_in_language: bool,
    language_id: Option<&str>,
) -> String {
    match (override_in_language, language_id) {
        (true, Some(language_id)) => format!("{}[{}]", target, language_id),
        _ => target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoopUiState;
    use crate::queue::WriteQueue;
    use crate::store::{ConfigStore, MemoryKv, MemoryStore};
    use crate::test_utils::{ScriptedInput, ScriptedPicker};
    use serde_json::json;
    use std::time::Duration;

    fn entry(id: &str, raw: Value) -> SettingsEntry {
        SettingsEntry::new(id, serde_json::from_value(raw).unwrap())
    }

    fn session<'a>(store: &'a MemoryStore, kv: &'a MemoryKv) -> Session<'a> {
        Session::open(
            store,
            kv,
            &NoopUiState,
            WriteQueue::with_debounce(Duration::ZERO),
        )
        .unwrap()
    }

    fn global_value(store: &MemoryStore, id: &str) -> Option<Value> {
        store
            .inspect(id, None)
            .unwrap()
            .value_at(ConfigurationTarget::Global, false)
            .cloned()
    }

    #[test]
    fn test_setting_label() {
        assert_eq!(setting_label("editor.tabSize"), "Editor › Tab Size");
        assert_eq!(setting_label("telemetry"), "Telemetry");
    }

    #[test]
    fn test_context_label() {
        assert_eq!(
            context_label(ConfigurationTarget::Global, false, None),
            "Global"
        );
        assert_eq!(
            context_label(ConfigurationTarget::Workspace, true, Some("rust")),
            "Workspace[rust]"
        );
    }

    #[test]
    fn test_detail_property_walks_objects_and_arrays() {
        let e = entry(
            "foo.obj",
            json!({
                "type": "object",
                "properties": {
                    "list": {"type": "array", "items": {"type": "integer", "minimum": 1}}
                }
            }),
        );
        let pointer = SettingsPointer {
            id: "foo.obj".to_string(),
            detail_id: vec!["list".to_string(), "0".to_string()],
            target: ConfigurationTarget::Global,
            override_in_language: false,
            scope: None,
        };
        let property = detail_property(&e, &pointer).unwrap();
        assert_eq!(property.minimum, Some(1.0));
    }

    #[test]
    fn test_pick_candidate_commits_and_allows_undo() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let env = Environment::default();
        let e = entry("editor.wordWrap", json!({"type": "boolean", "default": false}));
        // Candidates for a boolean: [false, true]; confirm "true" then
        // dismiss the refreshed menu.
        let mut picker = ScriptedPicker::new(vec![Some("true"), None]);
        let mut input = ScriptedInput::new(vec![]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        s.settle();
        assert_eq!(global_value(&store, "editor.wordWrap"), Some(json!(true)));
        assert!(s.can_undo());
    }

    #[test]
    fn test_reset_unsets_value() {
        let store = MemoryStore::new();
        store
            .update(
                "a.b",
                Some(&json!(3)),
                ConfigurationTarget::Global,
                false,
                None,
            )
            .unwrap();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let env = Environment::default();
        let e = entry("a.b", json!({"type": "integer", "default": 1}));
        let mut picker = ScriptedPicker::new(vec![Some("reset"), None]);
        let mut input = ScriptedInput::new(vec![]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        s.settle();
        assert_eq!(global_value(&store, "a.b"), None);
    }

    #[test]
    fn test_typed_number_input_respects_bounds() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let env = Environment::default();
        let e = entry(
            "editor.tabSize",
            json!({"type": "integer", "minimum": 1, "maximum": 16, "default": 4}),
        );
        // "0" and "x" are rejected by validation; "8" goes through.
        let mut picker = ScriptedPicker::new(vec![Some("enter an integer..."), None]);
        let mut input = ScriptedInput::new(vec![vec!["0", "x", "8"]]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        s.settle();
        assert_eq!(global_value(&store, "editor.tabSize"), Some(json!(8)));
        assert_eq!(input.rejections(), 2);
    }

    #[test]
    fn test_dismissal_rolls_back_preview() {
        let store = MemoryStore::new();
        store
            .update(
                "editor.wordWrap",
                Some(&json!(false)),
                ConfigurationTarget::Global,
                false,
                None,
            )
            .unwrap();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let env = Environment::default();
        let e = entry("editor.wordWrap", json!({"type": "boolean", "default": false}));
        // Highlight "true" (previewing it), then dismiss.
        let mut picker = ScriptedPicker::new(vec![None]).highlighting("true");
        let mut input = ScriptedInput::new(vec![]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        s.settle();
        assert_eq!(global_value(&store, "editor.wordWrap"), Some(json!(false)));
        assert!(!s.can_undo());
    }

    #[test]
    fn test_object_drill_down_edits_nested_key() {
        let store = MemoryStore::new();
        store
            .update(
                "foo.obj",
                Some(&json!({"keep": 1, "x": false})),
                ConfigurationTarget::Global,
                false,
                None,
            )
            .unwrap();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let env = Environment::default();
        let e = entry(
            "foo.obj",
            json!({
                "type": "object",
                "properties": {
                    "keep": {"type": "integer"},
                    "x": {"type": "boolean", "default": false}
                }
            }),
        );
        // Drill into "x", confirm "true", dismiss the nested menu, dismiss
        // the outer menu.
        let mut picker = ScriptedPicker::new(vec![Some("edit x..."), Some("true"), None, None]);
        let mut input = ScriptedInput::new(vec![]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        s.settle();
        assert_eq!(
            global_value(&store, "foo.obj"),
            Some(json!({"keep": 1, "x": true}))
        );
    }

    #[test]
    fn test_array_add_and_remove() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let env = Environment::default();
        let e = entry(
            "foo.list",
            json!({"type": "array", "items": {"type": "string"}, "default": []}),
        );
        // Add "alpha", add "beta", then remove "alpha".
        let mut picker = ScriptedPicker::new(vec![
            Some("add an item..."),
            Some("enter a new item..."),
            Some("add an item..."),
            Some("enter a new item..."),
            Some("remove an item..."),
            Some("alpha"),
            None,
        ]);
        let mut input = ScriptedInput::new(vec![vec!["alpha"], vec!["beta"]]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        s.settle();
        assert_eq!(global_value(&store, "foo.list"), Some(json!(["beta"])));
    }

    #[test]
    fn test_context_selection_gating() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        // One folder, no language: an application setting gets Global only,
        // so no context picker appears.
        let env = Environment {
            active_document: None,
            workspace_file: None,
            workspace_folders: vec!["/ws".to_string()],
        };
        let e = entry(
            "update.channel",
            json!({"type": "string", "scope": "application", "default": "stable"}),
        );
        let mut picker = ScriptedPicker::new(vec![None]);
        let mut input = ScriptedInput::new(vec![]);
        Menu::new(&mut s, &env, &mut picker, &mut input)
            .edit_entry(&e)
            .unwrap();
        // The single pick consumed was the edit menu dismissal, not a
        // context picker.
        assert_eq!(picker.picks_seen(), 1);
    }
}
