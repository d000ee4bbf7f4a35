//! # Request pipeline: authenticated calls with one refresh retry
//!
//! Every protected API call goes through [`RequestPipeline::send`]:
//!
//! 1. attach the current access credential as a bearer credential (or send
//!    anonymously when there is none);
//! 2. execute the exchange, bounded by a timeout and a [`CancelSignal`];
//! 3. on `401` for a first attempt, run a single-flight
//!    [`SessionStore::refresh`] and re-send the *same* request with the new
//!    credential;
//! 4. on `401` for the retried attempt, or when the refresh fails, tear the
//!    session down and return [`PipelineError::SessionExpired`];
//! 5. pass every other non-2xx response through as
//!    [`PipelineError::RequestFailed`].
//!
//! The retry budget lives in an immutable [`Attempt`] value local to one
//! `send` call, so nothing about one request can leak into another.
//!
//! The timeout is a single deadline for the whole logical request: the
//! first exchange, the refresh and the retry all share it.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use store::CredentialStore;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One execution of a logical request. Retrying yields a new value.
#[derive(Clone, Copy, Debug)]
pub struct Attempt<'r> {
    request: &'r ApiRequest,
    number: u8,
}

impl<'r> Attempt<'r> {
    /// Attempts allowed per logical request: the original plus one retry.
    pub const BUDGET: u8 = 2;

    pub fn first(request: &'r ApiRequest) -> Self {
        Self { request, number: 1 }
    }

    pub fn retried(self) -> Self {
        Self {
            request: self.request,
            number: self.number + 1,
        }
    }

    pub fn request(&self) -> &'r ApiRequest {
        self.request
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn budget_spent(&self) -> bool {
        self.number >= Self::BUDGET
    }
}

/// Sending half of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by in-flight requests; once triggered, they are abandoned.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn new() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = Self::new();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pending forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

pub struct RequestPipeline<T: Transport, S: CredentialStore> {
    transport: T,
    session: Arc<SessionStore<S>>,
    timeout: Duration,
}

impl<T: Transport, S: CredentialStore> RequestPipeline<T, S> {
    pub fn new(transport: T, session: Arc<SessionStore<S>>) -> Self {
        Self {
            transport,
            session,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Deadline for each logical request, refresh and retry included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore<S>> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send an authenticated request; see the module docs for the algorithm.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, PipelineError> {
        self.send_with_cancel(request, &CancelSignal::never()).await
    }

    pub async fn send_with_cancel(
        &self,
        request: &ApiRequest,
        cancel: &CancelSignal,
    ) -> Result<ApiResponse, PipelineError> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + timeout;
        let mut attempt = Attempt::first(request);
        let mut bearer = self.session.access();

        loop {
            let response = self
                .bounded(cancel, deadline, timeout, async {
                    debug!(
                        "{} {} (attempt {}, authenticated: {})",
                        request.method,
                        request.path,
                        attempt.number(),
                        bearer.is_some(),
                    );
                    self.transport
                        .execute(attempt.request(), bearer.as_deref())
                        .await
                        .map_err(PipelineError::from)
                })
                .await?;

            if !response.is_unauthorized() {
                return pass_through(response);
            }

            if attempt.budget_spent() {
                warn!(
                    "{} {} still unauthorized after refresh, expiring session",
                    request.method, request.path,
                );
                self.session.expire().await;
                return Err(PipelineError::SessionExpired);
            }

            let refreshed = self
                .bounded(cancel, deadline, timeout, async {
                    Ok::<_, PipelineError>(
                        self.session.refresh(&self.transport, bearer.as_deref()).await,
                    )
                })
                .await?;
            match refreshed {
                Ok(access) => {
                    bearer = Some(access);
                    attempt = attempt.retried();
                }
                Err(e) => {
                    warn!("{} {}: {e}", request.method, request.path);
                    return Err(PipelineError::SessionExpired);
                }
            }
        }
    }

    /// Send without credentials and without the refresh cycle. Used for the
    /// login and registration endpoints, where `401` means bad input.
    pub async fn send_anonymous(&self, request: &ApiRequest) -> Result<ApiResponse, PipelineError> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + timeout;
        let response = self
            .bounded(&CancelSignal::never(), deadline, timeout, async {
                self.transport
                    .execute(request, None)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;
        pass_through(response)
    }

    /// [`send`](Self::send) and decode the 2xx body.
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<R, PipelineError> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// [`send`](Self::send) and discard the 2xx body.
    pub async fn send_unit(&self, request: &ApiRequest) -> Result<(), PipelineError> {
        self.send(request).await.map(|_| ())
    }

    async fn bounded<F, R>(
        &self,
        cancel: &CancelSignal,
        deadline: Instant,
        timeout: Duration,
        call: F,
    ) -> Result<R, PipelineError>
    where
        F: std::future::Future<Output = Result<R, PipelineError>>,
    {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = tokio::time::timeout_at(deadline, call) => match result {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Timeout(timeout)),
            },
        }
    }
}

fn pass_through(response: ApiResponse) -> Result<ApiResponse, PipelineError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(PipelineError::RequestFailed {
            status: response.status,
            body: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::session::{SessionStatus, REFRESH_PATH};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use store::MemoryStore;

    /// Replays canned responses for data calls and records every exchange.
    #[derive(Default)]
    struct Scripted {
        data: Mutex<VecDeque<ApiResponse>>,
        refresh: Mutex<VecDeque<ApiResponse>>,
        log: Mutex<Vec<(String, Option<String>)>>,
    }

    impl Scripted {
        fn data(self, status: u16, body: &str) -> Self {
            self.data.lock().unwrap().push_back(ApiResponse::new(status, body));
            self
        }

        fn refresh(self, status: u16, body: &str) -> Self {
            self.refresh
                .lock()
                .unwrap()
                .push_back(ApiResponse::new(status, body));
            self
        }

        fn calls_to(&self, path: &str) -> Vec<Option<String>> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p == path)
                .map(|(_, bearer)| bearer.clone())
                .collect()
        }
    }

    impl Transport for Scripted {
        async fn execute(
            &self,
            request: &ApiRequest,
            bearer: Option<&str>,
        ) -> Result<ApiResponse, TransportError> {
            self.log
                .lock()
                .unwrap()
                .push((request.path.clone(), bearer.map(str::to_string)));
            tokio::task::yield_now().await;
            let queue = if request.path == REFRESH_PATH {
                &self.refresh
            } else {
                &self.data
            };
            queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::Unavailable("script exhausted".to_string()))
        }
    }

    /// Never answers.
    struct Silent;

    impl Transport for Silent {
        async fn execute(
            &self,
            _request: &ApiRequest,
            _bearer: Option<&str>,
        ) -> Result<ApiResponse, TransportError> {
            std::future::pending().await
        }
    }

    /// Rejects every data call; the refresh exchange never answers.
    struct StalledRefresh;

    impl Transport for StalledRefresh {
        async fn execute(
            &self,
            request: &ApiRequest,
            _bearer: Option<&str>,
        ) -> Result<ApiResponse, TransportError> {
            if request.path == REFRESH_PATH {
                std::future::pending().await
            } else {
                Ok(ApiResponse::new(401, "{}"))
            }
        }
    }

    /// Takes `delay` per exchange before answering from a script.
    struct Slow {
        delay: Duration,
        script: Scripted,
    }

    impl Transport for Slow {
        async fn execute(
            &self,
            request: &ApiRequest,
            bearer: Option<&str>,
        ) -> Result<ApiResponse, TransportError> {
            tokio::time::sleep(self.delay).await;
            self.script.execute(request, bearer).await
        }
    }

    async fn pipeline<T: Transport>(transport: T) -> RequestPipeline<T, MemoryStore> {
        let session = Arc::new(SessionStore::new(MemoryStore::new()));
        session.set_tokens("expired", "R").await;
        RequestPipeline::new(transport, session)
    }

    #[test]
    fn test_attempt_budget() {
        let request = ApiRequest::get("/notes/1/");
        let first = Attempt::first(&request);
        assert_eq!(first.number(), 1);
        assert!(!first.budget_spent());
        let second = first.retried();
        assert!(second.budget_spent());
        // The original value is untouched.
        assert_eq!(first.number(), 1);
    }

    #[tokio::test]
    async fn test_success_attaches_bearer() {
        let pipeline = pipeline(Scripted::default().data(200, "{}")).await;

        let response = pipeline.send(&ApiRequest::get("/notes/1/")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            pipeline.transport().calls_to("/notes/1/"),
            vec![Some("expired".to_string())]
        );
    }

    #[tokio::test]
    async fn test_refresh_and_retry_once() {
        let transport = Scripted::default()
            .data(401, "{}")
            .data(200, r#"{"ok": true}"#)
            .refresh(200, r#"{"access": "fresh"}"#);
        let pipeline = pipeline(transport).await;

        let response = pipeline.send(&ApiRequest::get("/notes/1/")).await.unwrap();

        assert_eq!(response.body, r#"{"ok": true}"#);
        assert_eq!(pipeline.transport().calls_to(REFRESH_PATH).len(), 1);
        assert_eq!(
            pipeline.transport().calls_to("/notes/1/"),
            vec![Some("expired".to_string()), Some("fresh".to_string())]
        );
        assert_eq!(pipeline.session().access().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_second_unauthorized_expires_session() {
        let transport = Scripted::default()
            .data(401, "{}")
            .data(401, "{}")
            .data(401, "{}")
            .refresh(200, r#"{"access": "fresh"}"#)
            .refresh(200, r#"{"access": "fresher"}"#);
        let pipeline = pipeline(transport).await;

        let result = pipeline.send(&ApiRequest::get("/notes/1/")).await;

        assert!(matches!(result, Err(PipelineError::SessionExpired)));
        assert_eq!(pipeline.transport().calls_to(REFRESH_PATH).len(), 1);
        assert_eq!(pipeline.transport().calls_to("/notes/1/").len(), 2);
        assert_eq!(pipeline.session().access(), None);
        assert_eq!(pipeline.session().status(), SessionStatus::Expired);
    }

    #[tokio::test]
    async fn test_failed_refresh_expires_session() {
        let transport = Scripted::default()
            .data(401, "{}")
            .refresh(401, r#"{"detail": "Token is blacklisted"}"#);
        let pipeline = pipeline(transport).await;

        let result = pipeline.send(&ApiRequest::get("/notes/1/")).await;

        assert!(matches!(result, Err(PipelineError::SessionExpired)));
        assert_eq!(pipeline.transport().calls_to("/notes/1/").len(), 1);
        assert_eq!(pipeline.session().refresh_token(), None);
    }

    #[tokio::test]
    async fn test_other_failures_pass_through() {
        let body = r#"{"title": ["Title cannot be empty"]}"#;
        let pipeline = pipeline(Scripted::default().data(400, body)).await;

        let result = pipeline.send(&ApiRequest::post("/notes/")).await;

        match result {
            Err(PipelineError::RequestFailed { status, body: got }) => {
                assert_eq!(status, 400);
                assert_eq!(got, body);
            }
            other => panic!("expected pass-through failure, got {other:?}"),
        }
        assert!(pipeline.transport().calls_to(REFRESH_PATH).is_empty());
    }

    #[tokio::test]
    async fn test_cleared_session_sends_anonymously() {
        let pipeline = pipeline(Scripted::default().data(200, "[]")).await;
        pipeline.session().clear().await;

        pipeline
            .send(&ApiRequest::get("/notes/public_notes/"))
            .await
            .unwrap();

        assert_eq!(
            pipeline.transport().calls_to("/notes/public_notes/"),
            vec![None]
        );
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_share_one_refresh() {
        let transport = Scripted::default()
            .data(401, "{}")
            .data(401, "{}")
            .data(200, "{}")
            .data(200, "{}")
            .refresh(200, r#"{"access": "fresh"}"#);
        let pipeline = pipeline(transport).await;
        let a = ApiRequest::get("/notes/1/");
        let b = ApiRequest::get("/notes/2/");

        let (ra, rb) = tokio::join!(pipeline.send(&a), pipeline.send(&b));

        assert!(ra.is_ok());
        assert!(rb.is_ok());
        assert_eq!(pipeline.transport().calls_to(REFRESH_PATH).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_retried() {
        let pipeline = pipeline(Silent).await;
        let request = ApiRequest::get("/notes/1/").timeout(Duration::from_secs(5));

        let result = pipeline.send(&request).await;

        assert!(matches!(result, Err(PipelineError::Timeout(t)) if t == Duration::from_secs(5)));
        assert_eq!(pipeline.session().access().as_deref(), Some("expired"));
    }

    #[tokio::test]
    async fn test_cancel_abandons_request() {
        let pipeline = pipeline(Silent).await;
        let (handle, signal) = CancelSignal::new();
        let request = ApiRequest::get("/notes/1/");

        let (result, _) = tokio::join!(pipeline.send_with_cancel(&request, &signal), async {
            tokio::task::yield_now().await;
            handle.cancel();
        });

        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_during_refresh_keeps_pair() {
        let pipeline = pipeline(StalledRefresh).await;
        let request = ApiRequest::get("/notes/1/").timeout(Duration::from_secs(5));

        let result = pipeline.send(&request).await;

        assert!(matches!(result, Err(PipelineError::Timeout(_))));
        assert_eq!(pipeline.session().access().as_deref(), Some("expired"));
        assert_eq!(pipeline.session().refresh_token().as_deref(), Some("R"));
        assert_eq!(pipeline.session().status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_cancel_during_refresh_keeps_pair() {
        let pipeline = pipeline(StalledRefresh).await;
        let (handle, signal) = CancelSignal::new();
        let request = ApiRequest::get("/notes/1/");

        let (result, _) = tokio::join!(pipeline.send_with_cancel(&request, &signal), async {
            tokio::task::yield_now().await;
            handle.cancel();
        });

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(pipeline.session().access().as_deref(), Some("expired"));
        assert_eq!(pipeline.session().refresh_token().as_deref(), Some("R"));
        assert_eq!(pipeline.session().status(), SessionStatus::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_spans_refresh_and_retry() {
        let script = Scripted::default()
            .data(401, "{}")
            .data(200, "{}")
            .refresh(200, r#"{"access": "fresh"}"#);
        let pipeline = pipeline(Slow {
            delay: Duration::from_secs(20),
            script,
        })
        .await;
        let request = ApiRequest::get("/notes/1/").timeout(Duration::from_secs(30));

        let started = Instant::now();
        let result = pipeline.send(&request).await;

        assert!(matches!(result, Err(PipelineError::Timeout(t)) if t == Duration::from_secs(30)));
        assert!(started.elapsed() <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_already_cancelled_sends_nothing() {
        let pipeline = pipeline(Scripted::default().data(200, "{}")).await;
        let (handle, signal) = CancelSignal::new();
        handle.cancel();

        let result = pipeline
            .send_with_cancel(&ApiRequest::get("/notes/1/"), &signal)
            .await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(pipeline.transport().calls_to("/notes/1/").is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_send_skips_refresh() {
        let pipeline = pipeline(Scripted::default().data(401, "{}")).await;

        let result = pipeline.send_anonymous(&ApiRequest::post("/token/")).await;

        assert!(matches!(
            result,
            Err(PipelineError::RequestFailed { status: 401, .. })
        ));
        assert_eq!(pipeline.transport().calls_to("/token/"), vec![None]);
        assert!(pipeline.transport().calls_to(REFRESH_PATH).is_empty());
    }
}
