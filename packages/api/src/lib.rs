//! # API crate: session-authenticated client for the notes backend
//!
//! Every outbound call goes through one [`RequestPipeline`], which attaches
//! the current access credential, refreshes it once on a 401 and reports an
//! expired session as a value instead of redirecting anywhere.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Login, registration-then-login, logout |
//! | [`error`] | One `thiserror` enum per layer |
//! | [`memory`] | In-process backend serving the whole endpoint table |
//! | [`models`] | Wire models for notes, history, tags and accounts |
//! | [`notes`] | Create, update, vote, history and restore for a note |
//! | [`pipeline`] | Bearer attachment, single refresh-and-retry, timeout, cancellation |
//! | [`session`] | Credential pair, single-flight refresh, status channel |
//! | [`settings`] | `config`-based settings with `NOTES_*` overrides |
//! | [`transport`] | `Transport` seam and the `reqwest` implementation |
//!
//! ## Wiring
//!
//! [`Client`] bundles a pipeline with the two operation groups that share it:
//!
//! ```ignore
//! let session = Arc::new(SessionStore::load(FileStore::new(dir)).await);
//! let client = Client::new(HttpTransport::new(base_url), session);
//! client.auth().login("ann@example.com", "password1").await?;
//! let note = client.notes().create(&NoteDraft::new(1, "Title", "Body")).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use store::CredentialStore;

pub mod auth;
pub mod error;
pub mod memory;
pub mod models;
pub mod notes;
pub mod pipeline;
pub mod session;
pub mod settings;
pub mod transport;

pub use auth::AuthClient;
pub use error::{AuthError, NoteError, PipelineError, SettingsError, TransportError};
pub use memory::MemoryBackend;
pub use models::{
    AccountInfo, HistorySnapshot, Note, NoteDraft, NotePatch, NoteSummary, NoteType,
    PublicOrdering, Registration, Tag, TokenPair, VoteType,
};
pub use notes::NoteVersionWorkflow;
pub use pipeline::{Attempt, CancelHandle, CancelSignal, RequestPipeline};
pub use session::{SessionStatus, SessionStore};
pub use settings::Settings;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

/// One session, one pipeline, and the operations that run through it.
pub struct Client<T: Transport, S: CredentialStore> {
    pipeline: Arc<RequestPipeline<T, S>>,
    auth: AuthClient<T, S>,
    notes: NoteVersionWorkflow<T, S>,
}

impl<T: Transport, S: CredentialStore> Client<T, S> {
    pub fn new(transport: T, session: Arc<SessionStore<S>>) -> Self {
        Self::from_pipeline(RequestPipeline::new(transport, session))
    }

    pub fn with_timeout(transport: T, session: Arc<SessionStore<S>>, timeout: Duration) -> Self {
        Self::from_pipeline(RequestPipeline::new(transport, session).with_timeout(timeout))
    }

    fn from_pipeline(pipeline: RequestPipeline<T, S>) -> Self {
        let pipeline = Arc::new(pipeline);
        Self {
            auth: AuthClient::new(pipeline.clone()),
            notes: NoteVersionWorkflow::new(pipeline.clone()),
            pipeline,
        }
    }

    pub fn auth(&self) -> &AuthClient<T, S> {
        &self.auth
    }

    pub fn notes(&self) -> &NoteVersionWorkflow<T, S> {
        &self.notes
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline<T, S>> {
        &self.pipeline
    }

    pub fn session(&self) -> &Arc<SessionStore<S>> {
        self.pipeline.session()
    }
}
