//! Record store — durable mapping from user id to user record.
//!
//! The whole table is loaded once at startup and rewritten in full on every
//! mutation. On disk it is a pretty-printed JSON object keyed by the
//! string-encoded user id:
//!
//! ```json
//! {
//!   "42": { "signals": 3, "paid_until": "2026-11-18 09:30:00", "history": [...] }
//! }
//! ```

pub mod json_file;
pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::domain::{UserId, UserRecord, UserTable};
use crate::error::StoreError;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Persistence backend for the user table.
pub trait RecordStore: Send + Sync {
    /// Read the full table. Missing or corrupt backing data yields an empty table.
    fn load(&self) -> UserTable;

    /// Replace the persisted table with `table`.
    fn save_all(&self, table: &UserTable) -> Result<(), StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn load(&self) -> UserTable {
        (**self).load()
    }

    fn save_all(&self, table: &UserTable) -> Result<(), StoreError> {
        (**self).save_all(table)
    }
}

/// Encode the table in its persisted JSON layout.
pub fn encode(table: &UserTable) -> Result<String, serde_json::Error> {
    let wire: BTreeMap<String, &UserRecord> = table
        .iter()
        .map(|(id, record)| (id.to_string(), record))
        .collect();
    serde_json::to_string_pretty(&wire)
}

/// Decode a persisted table.
///
/// Fails only when the text is not a JSON object. Entries with a non-integer
/// key or a malformed record are skipped one by one, so a single bad entry
/// never drops the rest of the table.
pub fn decode(text: &str) -> Result<UserTable, serde_json::Error> {
    let wire: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;
    let mut table = UserTable::new();
    for (key, value) in wire {
        let Ok(id) = key.parse::<UserId>() else {
            warn!(key = %key, "skipping user entry with non-integer id");
            continue;
        };
        match serde_json::from_value::<UserRecord>(value) {
            Ok(record) => {
                table.insert(id, record);
            }
            Err(err) => warn!(user = %id, error = %err, "skipping malformed user record"),
        }
    }
    Ok(table)
}
