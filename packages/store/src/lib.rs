pub mod credentials;

mod memory;
pub use memory::MemoryStore;

mod file_store;
pub use file_store::FileStore;

pub use credentials::{CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN};
