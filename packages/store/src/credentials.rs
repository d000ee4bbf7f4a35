//! # Credential persistence: named entries on an abstract store
//!
//! The notes client keeps exactly two durable values between runs: the
//! short-lived access credential and the longer-lived refresh credential.
//! Both are stored as bare strings under well-known entry names, with no
//! envelope around them:
//!
//! | Entry | Constant | Written by |
//! |-------|----------|------------|
//! | `access_token` | [`ACCESS_TOKEN`] | login, successful refresh |
//! | `refresh_token` | [`REFRESH_TOKEN`] | login |
//!
//! All reads and writes go through the [`CredentialStore`] trait so the
//! session layer works the same against the in-memory store
//! ([`crate::MemoryStore`]) used by tests and the filesystem store
//! ([`crate::FileStore`]) used by the command-line client.
//!
//! ## Failure model
//!
//! The trait is infallible. A backend that cannot persist an entry logs the
//! problem and carries on; a backend that cannot read an entry reports it as
//! absent. Losing a credential only ever forces a fresh login, never a crash.

/// Entry name of the access credential.
pub const ACCESS_TOKEN: &str = "access_token";

/// Entry name of the refresh credential.
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Async trait for storing and retrieving named credential entries.
pub trait CredentialStore {
    fn get(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Option<String>>;
    fn set(
        &self,
        name: &str,
        value: &str,
    ) -> impl std::future::Future<Output = ()>;
    fn remove(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = ()>;
}

