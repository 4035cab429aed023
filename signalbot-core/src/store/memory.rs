//! In-memory backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{decode, encode, RecordStore};
use crate::domain::UserTable;
use crate::error::StoreError;

/// Keeps the encoded table in memory.
///
/// Goes through the same JSON encoding as the file store, and can be told to
/// fail writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously persisted JSON text.
    pub fn with_contents(text: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(text.into())),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Last persisted JSON text, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> UserTable {
        self.contents()
            .and_then(|text| decode(&text).ok())
            .unwrap_or_default()
    }

    fn save_all(&self, table: &UserTable) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is failing writes".into()));
        }
        let text = encode(table)?;
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
