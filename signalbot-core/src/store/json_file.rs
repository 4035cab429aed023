//! JSON file backend.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{decode, encode, RecordStore};
use crate::domain::UserTable;
use crate::error::StoreError;

/// Stores the table as one JSON file, replaced atomically on each save.
///
/// Saves write a sibling `*.tmp` file and rename it over the target, so a
/// crash mid-write leaves the previous table intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("users_data.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> UserTable {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no user table on disk, starting empty");
                return UserTable::new();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "cannot read user table, starting empty"
                );
                return UserTable::new();
            }
        };
        match decode(&content) {
            Ok(table) => {
                info!(path = %self.path.display(), users = table.len(), "loaded user table");
                table
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "user table is corrupt, starting empty"
                );
                UserTable::new()
            }
        }
    }

    fn save_all(&self, table: &UserTable) -> Result<(), StoreError> {
        let json = encode(table)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io_error(&self.path))?;
        debug!(path = %self.path.display(), users = table.len(), "saved user table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserId, UserRecord};

    #[test]
    fn missing_file_loads_empty() {
        let store = JsonFileStore::new("/nonexistent/dir/users_data.json");
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_data.json");
        fs::write(&path, "not valid json {{{").unwrap();
        assert!(JsonFileStore::new(&path).load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("users_data.json"));

        let mut table = UserTable::new();
        let mut record = UserRecord::new();
        record.free_uses_consumed = 11;
        table.insert(UserId(1001), record);

        store.save_all(&table).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, table);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn save_is_byte_stable_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_data.json");
        let store = JsonFileStore::new(&path);

        let mut table = UserTable::new();
        table.insert(UserId(3), UserRecord::new());
        table.insert(UserId(12), UserRecord::new());
        store.save_all(&table).unwrap();
        let first = fs::read(&path).unwrap();

        store.save_all(&store.load()).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unwritable_location_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let store = JsonFileStore::new(blocker.join("users_data.json"));

        let err = store.save_all(&UserTable::new()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
