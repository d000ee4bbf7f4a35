//! # Session store: the process-wide credential pair
//!
//! [`SessionStore`] owns the access/refresh credential pair for one running
//! client. It keeps an in-memory copy for synchronous reads and mirrors every
//! change into a [`CredentialStore`] so the pair survives restarts.
//!
//! ## Refresh is single-flight
//!
//! Several requests can hit an expired access credential at once. Each of
//! them calls [`SessionStore::refresh`] with the credential it was sent with
//! (`stale`). Refreshes are serialised behind an async gate; whoever gets the
//! gate first performs the exchange, and every later caller notices that the
//! stored credential no longer matches its `stale` one and reuses it without
//! another round trip.
//!
//! ## Status channel
//!
//! Every transition is published as a [`SessionStatus`] on a
//! [`tokio::sync::watch`] channel. [`SessionStatus::Expired`] is the signal
//! for the embedding application to drop what it shows and ask the user to
//! log in again; the store itself never navigates anywhere.

use std::sync::Mutex;

use store::{CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::user::{AccessToken, RefreshRequest};
use crate::transport::{ApiRequest, Transport};

pub const REFRESH_PATH: &str = "/token/refresh/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// No credentials: never logged in, or logged out.
    Anonymous,
    Authenticated,
    /// Credentials were torn down after an irrecoverable auth failure.
    Expired,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
    /// Bumped whenever the pair is replaced or dropped. A refresh only
    /// commits if the generation it started from is still current.
    generation: u64,
}

/// Holder of the current access/refresh credential pair.
pub struct SessionStore<S: CredentialStore> {
    store: S,
    tokens: Mutex<Tokens>,
    refresh_gate: tokio::sync::Mutex<()>,
    status: watch::Sender<SessionStatus>,
}

impl<S: CredentialStore> SessionStore<S> {
    /// Create an empty session on top of `store`, ignoring anything it holds.
    pub fn new(store: S) -> Self {
        Self::with_tokens(store, Tokens::default())
    }

    /// Create a session seeded from the entries persisted in `store`.
    pub async fn load(store: S) -> Self {
        let tokens = Tokens {
            access: store.get(ACCESS_TOKEN).await,
            refresh: store.get(REFRESH_TOKEN).await,
            generation: 0,
        };
        debug!(
            "loaded session (access: {}, refresh: {})",
            tokens.access.is_some(),
            tokens.refresh.is_some(),
        );
        Self::with_tokens(store, tokens)
    }

    fn with_tokens(store: S, tokens: Tokens) -> Self {
        let initial = if tokens.access.is_some() || tokens.refresh.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        };
        let (status, _) = watch::channel(initial);
        Self {
            store,
            tokens: Mutex::new(tokens),
            refresh_gate: tokio::sync::Mutex::new(()),
            status,
        }
    }

    fn tokens(&self) -> std::sync::MutexGuard<'_, Tokens> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace both credentials.
    pub async fn set_tokens(&self, access: &str, refresh: &str) {
        {
            let mut tokens = self.tokens();
            tokens.access = Some(access.to_string());
            tokens.refresh = Some(refresh.to_string());
            tokens.generation += 1;
        }
        self.store.set(ACCESS_TOKEN, access).await;
        self.store.set(REFRESH_TOKEN, refresh).await;
        self.status.send_replace(SessionStatus::Authenticated);
    }

    /// Current access credential, if any.
    pub fn access(&self) -> Option<String> {
        self.tokens().access.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens().refresh.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().access.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Destroy both credentials. Idempotent.
    pub async fn clear(&self) {
        self.drop_tokens().await;
        self.status.send_replace(SessionStatus::Anonymous);
    }

    /// Tear the session down after an irrecoverable auth failure.
    pub(crate) async fn expire(&self) {
        self.drop_tokens().await;
        self.status.send_replace(SessionStatus::Expired);
    }

    async fn drop_tokens(&self) {
        {
            let mut tokens = self.tokens();
            tokens.access = None;
            tokens.refresh = None;
            tokens.generation += 1;
        }
        self.store.remove(ACCESS_TOKEN).await;
        self.store.remove(REFRESH_TOKEN).await;
    }

    /// Exchange the refresh credential for a new access credential.
    ///
    /// `stale` is the access credential the caller's rejected request carried.
    /// If another caller already replaced it, that newer credential is
    /// returned without a second exchange. Any failure clears the session.
    ///
    /// If the pair is replaced or cleared while the exchange is in flight,
    /// the result is discarded: the newer session (or its absence) wins.
    pub async fn refresh<T: Transport>(
        &self,
        transport: &T,
        stale: Option<&str>,
    ) -> Result<String, AuthError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.access() {
            if stale != Some(current.as_str()) {
                debug!("access credential already refreshed by a concurrent caller");
                return Ok(current);
            }
        }

        let (refresh, generation) = {
            let tokens = self.tokens();
            (tokens.refresh.clone(), tokens.generation)
        };
        let Some(refresh) = refresh else {
            warn!("no refresh credential available, expiring session");
            self.expire().await;
            return Err(AuthError::RefreshFailed);
        };

        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh });
        let access = match transport.execute(&request, None).await {
            Ok(response) if response.is_success() => match response.json::<AccessToken>() {
                Ok(AccessToken { access }) => access,
                Err(e) => {
                    warn!("malformed refresh response: {e}");
                    return self.fail_refresh(generation).await;
                }
            },
            Ok(response) => {
                warn!("refresh rejected with status {}", response.status);
                return self.fail_refresh(generation).await;
            }
            Err(e) => {
                warn!("refresh call failed: {e}");
                return self.fail_refresh(generation).await;
            }
        };

        let superseded = {
            let mut tokens = self.tokens();
            if tokens.generation == generation {
                tokens.access = Some(access.clone());
                None
            } else {
                Some(tokens.access.clone())
            }
        };
        if let Some(current) = superseded {
            debug!("session replaced during refresh, discarding exchanged credential");
            return current.ok_or(AuthError::RefreshFailed);
        }

        self.store.set(ACCESS_TOKEN, &access).await;
        self.status.send_replace(SessionStatus::Authenticated);
        info!("access credential refreshed");
        Ok(access)
    }

    /// Expire the session a failed refresh started from, unless it has
    /// since been replaced or cleared.
    async fn fail_refresh(&self, generation: u64) -> Result<String, AuthError> {
        let current = self.tokens().generation == generation;
        if current {
            self.expire().await;
        } else {
            debug!("session replaced during failed refresh, leaving it in place");
        }
        Err(AuthError::RefreshFailed)
    }
}
