//! Local key/value persistence.
//!
//! RULE: the ledger only ever sees `KeyValueStore`. Whether the blobs land
//! in SQLite or in memory is decided once, where the store is built.

use crate::error::{LedgerError, LedgerResult};
use std::collections::HashMap;
use std::sync::Mutex;

mod sqlite;

pub use sqlite::SqliteKvStore;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> LedgerResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> LedgerResult<()>;
    fn remove(&self, key: &str) -> LedgerResult<()>;
}

/// Process-local store. Used in tests and when no database path is given.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> LedgerResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| LedgerError::LockPoisoned(e.to_string()))
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> LedgerResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LedgerResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
