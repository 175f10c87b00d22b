//! Process-local session storage.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::ports::{SessionStorage, SessionStorageError, StorageKey};

/// Keeps session values in a map; nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    values: Mutex<BTreeMap<StorageKey, String>>,
}

impl InMemorySessionStorage {
    /// Storage pre-populated with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (StorageKey, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(key, value)| (key, value.to_owned()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Copy of every stored entry.
    pub fn snapshot(&self) -> BTreeMap<StorageKey, String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, SessionStorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), SessionStorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), SessionStorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(&key);
        Ok(())
    }
}
