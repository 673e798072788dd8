use std::collections::HashMap;
use std::sync::RwLock;

use crate::store::CredentialStore;

/// In-memory credential store. The default for tests and for embedders that
/// keep the session alive only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("credential store lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .expect("credential store lock poisoned")
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .expect("credential store lock poisoned")
            .remove(key);
    }

    fn clear(&self) {
        self.entries
            .write()
            .expect("credential store lock poisoned")
            .clear();
    }
}
