//! Debounced, coalescing write queue.
//!
//! Configuration writes are expensive and edits arrive in bursts (picker
//! highlight previews in particular), so writes are held for a debounce
//! window and a newer write to the same pointer supersedes the older one.
//! Supersession is an expected outcome, not an error; each enqueued write
//! hands back a [`WriteTicket`] that resolves to its final disposition.
//!
//! The queue never spawns threads of its own. Callers drive it with
//! [`WriteQueue::flush_due`] (deterministic, for tests) or
//! [`WriteQueue::settle`] (sleeps until drained, for the CLI).

use std::sync::mpsc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::pointer::SettingsPointer;
use crate::store::ConfigStore;
use crate::{patch, resolve, Result};

/// Default debounce window.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Final outcome of an enqueued write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteDisposition {
    /// The value reached the store.
    Committed,
    /// A newer write to the same pointer replaced this one.
    Superseded,
    /// The store rejected the write; siblings are unaffected, no retry.
    Failed(String),
}

/// Receipt for one enqueued write.
pub struct WriteTicket {
    receiver: mpsc::Receiver<WriteDisposition>,
}

impl WriteTicket {
    /// Block until the write is committed, superseded, or failed.
    pub fn wait(self) -> WriteDisposition {
        self.receiver
            .recv()
            .unwrap_or_else(|_| WriteDisposition::Failed("queue dropped".to_string()))
    }

    /// The disposition, if already decided.
    pub fn try_wait(&self) -> Option<WriteDisposition> {
        self.receiver.try_recv().ok()
    }
}

struct QueueEntry {
    pointer: SettingsPointer,
    value: Option<Value>,
    deadline: Instant,
    sender: mpsc::Sender<WriteDisposition>,
}

/// The debounced write queue. At most one live entry per pointer equality
/// class.
pub struct WriteQueue {
    entries: Mutex<Vec<QueueEntry>>,
    debounce: Duration,
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::with_debounce(DEBOUNCE)
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            debounce,
        }
    }

    /// Queue a write of `value` (`None` = unset) at `pointer`.
    ///
    /// Any pending write with an equal pointer is superseded, and the new
    /// entry gets a fresh full debounce window.
    pub fn enqueue(&self, pointer: SettingsPointer, value: Option<Value>) -> WriteTicket {
        let (sender, receiver) = mpsc::channel();
        let entry = QueueEntry {
            pointer,
            value,
            deadline: Instant::now() + self.debounce,
            sender,
        };
        let mut entries = self.entries.lock().unwrap();
        if let Some(index) = entries.iter().position(|e| e.pointer == entry.pointer) {
            let superseded = entries.remove(index);
            let _ = superseded.sender.send(WriteDisposition::Superseded);
        }
        entries.push(entry);
        WriteTicket { receiver }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Commit every entry whose deadline has passed; returns how many were
    /// attempted. Store I/O happens outside the queue lock. A failed commit
    /// resolves its own ticket and leaves the rest of the queue alone.
    pub fn flush_due(&self, store: &dyn ConfigStore, now: Instant) -> usize {
        let due: Vec<QueueEntry> = {
            let mut entries = self.entries.lock().unwrap();
            let mut due = Vec::new();
            let mut index = 0;
            while index < entries.len() {
                if entries[index].deadline <= now {
                    due.push(entries.remove(index));
                } else {
                    index += 1;
                }
            }
            due
        };
        let attempted = due.len();
        for entry in due {
            let disposition = match commit(store, &entry.pointer, entry.value.as_ref()) {
                Ok(()) => WriteDisposition::Committed,
                Err(e) => WriteDisposition::Failed(e.to_string()),
            };
            // The ticket may already be dropped; that is fine.
            let _ = entry.sender.send(disposition);
        }
        attempted
    }

    /// Sleep-and-flush until the queue drains.
    pub fn settle(&self, store: &dyn ConfigStore) {
        loop {
            let next_deadline = {
                let entries = self.entries.lock().unwrap();
                match entries.iter().map(|e| e.deadline).min() {
                    Some(deadline) => deadline,
                    None => return,
                }
            };
            let now = Instant::now();
            if next_deadline > now {
                std::thread::sleep(next_deadline - now);
            }
            self.flush_due(store, Instant::now());
        }
    }
}

/// Write `value` at `pointer`, patching through the detail path.
///
/// A pointer with a non-empty detail path is committed read-modify-write:
/// the current whole-setting value in the pointer's slot is patched at the
/// detail path and written back in full.
pub fn commit(
    store: &dyn ConfigStore,
    pointer: &SettingsPointer,
    value: Option<&Value>,
) -> Result<()> {
    let whole = if pointer.detail_id.is_empty() {
        value.cloned()
    } else {
        let current = resolve::slot_value(store, pointer)?;
        patch::set_detail_value(current, &pointer.detail_id, value.cloned())
    };
    store.update(
        &pointer.id,
        whole.as_ref(),
        pointer.target,
        pointer.override_in_language,
        pointer.scope.as_ref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::ConfigurationTarget;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn pointer(id: &str, detail: &[&str]) -> SettingsPointer {
        SettingsPointer {
            id: id.to_string(),
            detail_id: detail.iter().map(|s| s.to_string()).collect(),
            target: ConfigurationTarget::Global,
            override_in_language: false,
            scope: None,
        }
    }

    fn instant_queue() -> WriteQueue {
        WriteQueue::with_debounce(Duration::ZERO)
    }

    fn global_value(store: &MemoryStore, id: &str) -> Option<Value> {
        store
            .inspect(id, None)
            .unwrap()
            .value_at(ConfigurationTarget::Global, false)
            .cloned()
    }

    #[test]
    fn test_newer_write_supersedes_older() {
        let store = MemoryStore::new();
        let queue = instant_queue();
        let first = queue.enqueue(pointer("editor.tabSize", &[]), Some(json!(2)));
        let second = queue.enqueue(pointer("editor.tabSize", &[]), Some(json!(8)));
        assert_eq!(first.wait(), WriteDisposition::Superseded);
        queue.flush_due(&store, Instant::now());
        assert_eq!(second.wait(), WriteDisposition::Committed);
        assert_eq!(global_value(&store, "editor.tabSize"), Some(json!(8)));
    }

    #[test]
    fn test_distinct_pointers_do_not_coalesce() {
        let store = MemoryStore::new();
        let queue = instant_queue();
        let a = queue.enqueue(pointer("a.x", &[]), Some(json!(1)));
        let b = queue.enqueue(pointer("b.y", &[]), Some(json!(2)));
        queue.flush_due(&store, Instant::now());
        assert_eq!(a.wait(), WriteDisposition::Committed);
        assert_eq!(b.wait(), WriteDisposition::Committed);
        assert_eq!(global_value(&store, "a.x"), Some(json!(1)));
        assert_eq!(global_value(&store, "b.y"), Some(json!(2)));
    }

    #[test]
    fn test_detail_pointers_coalesce_per_path() {
        let queue = instant_queue();
        let whole = queue.enqueue(pointer("foo.obj", &[]), Some(json!({})));
        let nested = queue.enqueue(pointer("foo.obj", &["x"]), Some(json!(1)));
        // Different detail paths are different pointers.
        assert_eq!(whole.try_wait(), None);
        assert_eq!(nested.try_wait(), None);
    }

    #[test]
    fn test_flush_respects_deadline() {
        let store = MemoryStore::new();
        let queue = WriteQueue::with_debounce(Duration::from_secs(60));
        let ticket = queue.enqueue(pointer("a.x", &[]), Some(json!(1)));
        assert_eq!(queue.flush_due(&store, Instant::now()), 0);
        assert!(!queue.is_empty());
        assert_eq!(ticket.try_wait(), None);
        assert_eq!(
            queue.flush_due(&store, Instant::now() + Duration::from_secs(61)),
            1
        );
        assert_eq!(ticket.wait(), WriteDisposition::Committed);
    }

    #[test]
    fn test_detail_commit_patches_current_value() {
        let store = MemoryStore::new();
        store
            .update(
                "foo.obj",
                Some(&json!({"keep": true, "x": 1})),
                ConfigurationTarget::Global,
                false,
                None,
            )
            .unwrap();
        let queue = instant_queue();
        queue.enqueue(pointer("foo.obj", &["x"]), Some(json!(2)));
        queue.settle(&store);
        assert_eq!(
            global_value(&store, "foo.obj"),
            Some(json!({"keep": true, "x": 2}))
        );
    }

    #[test]
    fn test_detail_delete_prunes_to_unset() {
        let store = MemoryStore::new();
        store
            .update(
                "foo.obj",
                Some(&json!({"x": {"y": 1}})),
                ConfigurationTarget::Global,
                false,
                None,
            )
            .unwrap();
        let queue = instant_queue();
        queue.enqueue(pointer("foo.obj", &["x", "y"]), None);
        queue.settle(&store);
        assert_eq!(global_value(&store, "foo.obj"), None);
    }

    #[test]
    fn test_failed_commit_resolves_only_its_ticket() {
        let store = MemoryStore::new();
        let queue = instant_queue();
        store.fail_updates("disk full");
        let failing = queue.enqueue(pointer("a.x", &[]), Some(json!(1)));
        queue.flush_due(&store, Instant::now());
        assert!(matches!(failing.wait(), WriteDisposition::Failed(_)));

        let recovered = MemoryStore::new();
        let ok = queue.enqueue(pointer("a.x", &[]), Some(json!(1)));
        queue.settle(&recovered);
        assert_eq!(ok.wait(), WriteDisposition::Committed);
    }
}
