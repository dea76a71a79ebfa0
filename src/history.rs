//! Undo/redo over committed setting edits.
//!
//! A [`Session`] owns the two history stacks and the write queue, and talks
//! to the configuration store, the key-value store, and the UI-state channel
//! through their traits. History is linear: committing a fresh edit clears
//! the redo stack. Previews bypass history entirely.
//!
//! The stacks are persisted in the key-value store so undo and redo work
//! across invocations, not just within one session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pointer::SettingsPointer;
use crate::queue::{WriteQueue, WriteTicket};
use crate::recency::Recency;
use crate::store::{ConfigStore, KeyValueStore};
use crate::Result;

const UNDO_KEY: &str = "history/undo";
const REDO_KEY: &str = "history/redo";

/// One committed edit, replayable in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub pointer: SettingsPointer,
    /// Value before the edit; `None` = the setting was unset.
    pub old_value: Option<Value>,
    /// Value after the edit; `None` = the edit unset the setting.
    pub new_value: Option<Value>,
}

/// Channel for undo/redo availability, driven after every stack mutation.
pub trait UiState {
    fn history_changed(&self, can_undo: bool, can_redo: bool);
}

/// Default sink for hosts with no history UI.
pub struct NoopUiState;

impl UiState for NoopUiState {
    fn history_changed(&self, _can_undo: bool, _can_redo: bool) {}
}

/// An editing session: history stacks plus the debounced write queue.
pub struct Session<'a> {
    store: &'a dyn ConfigStore,
    kv: &'a dyn KeyValueStore,
    ui: &'a dyn UiState,
    queue: WriteQueue,
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
}

impl<'a> Session<'a> {
    /// Open a session, restoring persisted history.
    pub fn open(
        store: &'a dyn ConfigStore,
        kv: &'a dyn KeyValueStore,
        ui: &'a dyn UiState,
        queue: WriteQueue,
    ) -> Result<Self> {
        let undo_stack = load_stack(kv, UNDO_KEY)?;
        let redo_stack = load_stack(kv, REDO_KEY)?;
        Ok(Self {
            store,
            kv,
            ui,
            queue,
            undo_stack,
            redo_stack,
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_stack(&self) -> &[UndoEntry] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[UndoEntry] {
        &self.redo_stack
    }

    /// The edit that `undo()` would revert.
    pub fn last_change(&self) -> Option<&UndoEntry> {
        self.undo_stack.last()
    }

    /// The edit that `redo()` would replay.
    pub fn next_redo(&self) -> Option<&UndoEntry> {
        self.redo_stack.last()
    }

    /// Commit an edit: enqueue the write, and when the value actually
    /// changed, push history, clear redo, and record recency.
    ///
    /// An edit whose old and new values are equal still reaches the store
    /// (the slot may hold a redundant explicit value worth normalizing) but
    /// leaves history and recency untouched.
    pub fn commit(&mut self, entry: UndoEntry) -> Result<WriteTicket> {
        let ticket = self
            .queue
            .enqueue(entry.pointer.clone(), entry.new_value.clone());
        if entry.old_value != entry.new_value {
            Recency::new(self.kv).record(
                &entry.pointer,
                entry.old_value.as_ref(),
                entry.new_value.as_ref(),
            )?;
            self.redo_stack.clear();
            self.undo_stack.push(entry);
            self.after_stack_change()?;
        }
        Ok(ticket)
    }

    /// Write a value without touching history or recency.
    pub fn preview(&self, pointer: SettingsPointer, value: Option<Value>) -> WriteTicket {
        self.queue.enqueue(pointer, value)
    }

    /// Revert the most recent edit. `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<WriteTicket>> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let ticket = self
            .queue
            .enqueue(entry.pointer.clone(), entry.old_value.clone());
        self.redo_stack.push(entry);
        self.after_stack_change()?;
        Ok(Some(ticket))
    }

    /// Replay the most recently undone edit. `None` when there is nothing
    /// to redo.
    pub fn redo(&mut self) -> Result<Option<WriteTicket>> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let ticket = self
            .queue
            .enqueue(entry.pointer.clone(), entry.new_value.clone());
        self.undo_stack.push(entry);
        self.after_stack_change()?;
        Ok(Some(ticket))
    }

    /// Drop all history, persisted included.
    pub fn clear_history(&mut self) -> Result<()> {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.after_stack_change()
    }

    /// Block until every queued write has committed or failed.
    pub fn settle(&self) {
        self.queue.settle(self.store);
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    pub fn store(&self) -> &'a dyn ConfigStore {
        self.store
    }

    pub fn kv(&self) -> &'a dyn KeyValueStore {
        self.kv
    }

    fn after_stack_change(&self) -> Result<()> {
        save_stack(self.kv, UNDO_KEY, &self.undo_stack)?;
        save_stack(self.kv, REDO_KEY, &self.redo_stack)?;
        self.ui.history_changed(self.can_undo(), self.can_redo());
        Ok(())
    }
}

fn load_stack(kv: &dyn KeyValueStore, key: &str) -> Result<Vec<UndoEntry>> {
    Ok(match kv.get(key)? {
        Some(raw) => serde_json::from_value(raw).unwrap_or_default(),
        None => Vec::new(),
    })
}

fn save_stack(kv: &dyn KeyValueStore, key: &str, stack: &[UndoEntry]) -> Result<()> {
    kv.set(key, &serde_json::to_value(stack)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::ConfigurationTarget;
    use crate::queue::WriteDisposition;
    use crate::recency::Recency;
    use crate::store::{MemoryKv, MemoryStore};
    use serde_json::json;
    use std::cell::RefCell;
    use std::time::Duration;

    fn pointer(id: &str) -> SettingsPointer {
        SettingsPointer {
            id: id.to_string(),
            detail_id: Vec::new(),
            target: ConfigurationTarget::Global,
            override_in_language: false,
            scope: None,
        }
    }

    fn edit(id: &str, old: Option<Value>, new: Option<Value>) -> UndoEntry {
        UndoEntry {
            pointer: pointer(id),
            old_value: old,
            new_value: new,
        }
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
    fn test_commit_undo_redo_cycle() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);

        s.commit(edit("editor.tabSize", Some(json!(4)), Some(json!(2))))
            .unwrap();
        s.settle();
        assert_eq!(global_value(&store, "editor.tabSize"), Some(json!(2)));
        assert!(s.can_undo());
        assert!(!s.can_redo());

        s.undo().unwrap().unwrap();
        s.settle();
        assert_eq!(global_value(&store, "editor.tabSize"), Some(json!(4)));
        assert!(!s.can_undo());
        assert!(s.can_redo());

        s.redo().unwrap().unwrap();
        s.settle();
        assert_eq!(global_value(&store, "editor.tabSize"), Some(json!(2)));
        assert!(s.can_undo());
        assert!(!s.can_redo());
    }

    #[test]
    fn test_undo_of_first_set_unsets() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        s.commit(edit("a.b", None, Some(json!(1)))).unwrap();
        s.undo().unwrap().unwrap();
        s.settle();
        assert_eq!(global_value(&store, "a.b"), None);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        assert!(s.undo().unwrap().is_none());
        assert!(s.redo().unwrap().is_none());
    }

    #[test]
    fn test_commit_clears_redo() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        s.commit(edit("a.b", None, Some(json!(1)))).unwrap();
        s.undo().unwrap();
        assert!(s.can_redo());
        s.commit(edit("a.b", None, Some(json!(2)))).unwrap();
        assert!(!s.can_redo());
        assert_eq!(s.undo_stack().len(), 1);
    }

    #[test]
    fn test_noop_commit_writes_but_skips_history() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        let ticket = s
            .commit(edit("a.b", Some(json!(1)), Some(json!(1))))
            .unwrap();
        s.settle();
        assert_eq!(ticket.wait(), WriteDisposition::Committed);
        assert_eq!(global_value(&store, "a.b"), Some(json!(1)));
        assert!(!s.can_undo());
        assert!(Recency::new(&kv).entries().unwrap().is_empty());
    }

    #[test]
    fn test_preview_skips_history_and_recency() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let s = session(&store, &kv);
        s.preview(pointer("a.b"), Some(json!(9)));
        s.settle();
        assert_eq!(global_value(&store, "a.b"), Some(json!(9)));
        assert!(!s.can_undo());
        assert!(Recency::new(&kv).entries().unwrap().is_empty());
    }

    #[test]
    fn test_commit_records_recency() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let mut s = session(&store, &kv);
        s.commit(edit("editor.tabSize", Some(json!(4)), Some(json!(2))))
            .unwrap();
        let recency = Recency::new(&kv);
        assert_eq!(recency.entries().unwrap(), vec!["editor.tabSize"]);
        assert_eq!(
            recency.values(&pointer("editor.tabSize")).unwrap(),
            vec![json!(2), json!(4)]
        );
    }

    #[test]
    fn test_history_persists_across_sessions() {
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        {
            let mut s = session(&store, &kv);
            s.commit(edit("a.b", None, Some(json!(1)))).unwrap();
            s.settle();
        }
        let mut reopened = session(&store, &kv);
        assert!(reopened.can_undo());
        reopened.undo().unwrap().unwrap();
        reopened.settle();
        assert_eq!(global_value(&store, "a.b"), None);
    }

    #[test]
    fn test_ui_state_notified_on_stack_changes() {
        struct Recorder(RefCell<Vec<(bool, bool)>>);
        impl UiState for Recorder {
            fn history_changed(&self, can_undo: bool, can_redo: bool) {
                self.0.borrow_mut().push((can_undo, can_redo));
            }
        }
        let store = MemoryStore::new();
        let kv = MemoryKv::new();
        let recorder = Recorder(RefCell::new(Vec::new()));
        let mut s = Session::open(
            &store,
            &kv,
            &recorder,
            WriteQueue::with_debounce(Duration::ZERO),
        )
        .unwrap();
        s.commit(edit("a.b", None, Some(json!(1)))).unwrap();
        s.undo().unwrap();
        s.redo().unwrap();
        assert_eq!(
            *recorder.0.borrow(),
            vec![(true, false), (false, true), (true, false)]
        );
    }
}
