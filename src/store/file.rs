use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::store::CredentialStore;

/// Credential store persisted as a single JSON document on disk, the
/// counterpart of the browser profile's local storage. Every operation is a
/// full read-modify-write of the document; concurrent writers (two portal
/// processes sharing one profile) can interleave, matching the storage
/// guarantees the portals already live with.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                warn!(%err, path = %self.path.display(), "failed to read credential store");
                return HashMap::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(%err, path = %self.path.display(), "credential store is not valid JSON, starting empty");
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let body = match serde_json::to_vec_pretty(entries) {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, "failed to serialize credential store");
                return;
            }
        };

        if let Err(err) = fs::write(&self.path, body) {
            warn!(%err, path = %self.path.display(), "failed to write credential store");
        }
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.load();
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }

    fn clear(&self) {
        self.persist(&HashMap::new());
    }
}
