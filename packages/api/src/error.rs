//! Error taxonomy for the notes client, one enum per layer.

use thiserror::Error;

/// Failure to get any HTTP response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request url: {0}")]
    Url(String),

    #[error("http transport failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session refresh failed")]
    RefreshFailed,

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The retry budget is spent or the refresh credential was rejected.
    /// The caller must clear the session and send the user to log in.
    #[error("session expired, authentication required")]
    SessionExpired,

    /// Any other non-2xx response, passed through verbatim.
    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PipelineError {
    /// Status code of a pass-through failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            PipelineError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("can only vote on public published notes")]
    VoteNotAllowed,

    #[error("history entry {0} not found for this note")]
    HistoryNotFound(u64),

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}
