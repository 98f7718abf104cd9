//! Ephemeral per-chat data

use crate::state_machine::Scratch;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory scratch keyed by chat id. Entries that return to the default
/// are dropped so the map only holds chats mid-flow.
#[derive(Default)]
pub struct ScratchStore {
    entries: Mutex<HashMap<i64, Scratch>>,
}

impl ScratchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: i64) -> Scratch {
        self.entries
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update(&self, chat_id: i64, f: impl FnOnce(&mut Scratch)) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(chat_id).or_default();
        f(entry);
        if entry.is_empty() {
            entries.remove(&chat_id);
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
