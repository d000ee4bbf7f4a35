//! # Filesystem-backed credential store
//!
//! [`FileStore`] is a [`CredentialStore`] implementation that persists each
//! credential entry as a small file under a base directory, so a login
//! survives restarts of the command-line client.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── access_token       # raw access credential
//! └── refresh_token      # raw refresh credential
//! ```
//!
//! ## Platform data directories
//!
//! Callers typically pass `dirs::data_dir().join("notes-client")`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/notes-client/` |
//! | Linux | `~/.local/share/notes-client/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\notes-client\` |

use std::path::PathBuf;

use tracing::warn;

use crate::credentials::CredentialStore;

/// Filesystem-backed CredentialStore for persistence across runs.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &std::path::Path {
        &self.base
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

impl CredentialStore for FileStore {
    async fn get(&self, name: &str) -> Option<String> {
        let content = std::fs::read_to_string(self.entry_path(name)).ok()?;
        let value = content.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    async fn set(&self, name: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.base) {
            warn!("failed to create credentials dir {}: {e}", self.base.display());
            return;
        }
        if let Err(e) = std::fs::write(self.entry_path(name), value) {
            warn!("failed to persist credential entry \"{name}\": {e}");
        }
    }

    async fn remove(&self, name: &str) {
        match std::fs::remove_file(self.entry_path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove credential entry \"{name}\": {e}"),
        }
    }
}
