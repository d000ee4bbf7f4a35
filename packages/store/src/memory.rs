use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::credentials::CredentialStore;

/// In-memory CredentialStore for testing and short-lived sessions.
///
/// Clones share the same entries, so a test can keep a handle and inspect
/// what the session layer persisted.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds consistent strings.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    async fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    async fn set(&self, name: &str, value: &str) {
        self.lock().insert(name.to_string(), value.to_string());
    }

    async fn remove(&self, name: &str) {
        self.lock().remove(name);
    }
}
