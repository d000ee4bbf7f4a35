//! # In-process notes backend
//!
//! [`MemoryBackend`] is a [`Transport`] that answers the notes API from
//! memory instead of the network. It is used for testing and for offline
//! demos of the command-line client, and it implements the server half of the
//! version-control workflow:
//!
//! - an update that changes `title` or `content` appends one
//!   [`HistorySnapshot`] holding the previous values; an update that only
//!   touches flags or tags appends nothing;
//! - a restore always appends exactly one snapshot (the state it replaces),
//!   even when restoring the same entry twice;
//! - history is returned newest-first and never edited;
//! - voting is limited to public, published notes and bumps one counter by
//!   one;
//! - tag names are resolved get-or-create, and a tag list in an update
//!   replaces the previous set.
//!
//! ## Test hooks
//!
//! | Method | Effect |
//! |--------|--------|
//! | [`add_account`](MemoryBackend::add_account) | Create a login without the register endpoint. |
//! | [`issue_tokens`](MemoryBackend::issue_tokens) | Mint a valid access/refresh pair for an account. |
//! | [`expire_access_tokens`](MemoryBackend::expire_access_tokens) | Invalidate every access credential issued so far. |
//! | [`revoke_refresh_tokens`](MemoryBackend::revoke_refresh_tokens) | Invalidate every refresh credential issued so far. |
//! | [`reject_all_access`](MemoryBackend::reject_all_access) | Treat every access credential as invalid, including fresh ones. |
//! | [`set_offline`](MemoryBackend::set_offline) | Fail every exchange at the transport level. |
//! | [`set_votes`](MemoryBackend::set_votes) | Overwrite a note's counters. |
//! | [`calls`](MemoryBackend::calls) / [`refresh_calls`](MemoryBackend::refresh_calls) | Exchange counters. |

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::trace;

use crate::error::TransportError;
use crate::models::note::normalize_tag_names;
use crate::models::{
    AccountInfo, Credentials, HistorySnapshot, Note, NoteDraft, NotePatch, NoteSummary, NoteType,
    PublicOrdering, Registration, Tag, TokenPair, VoteType,
};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

const CLOCK_ORIGIN: i64 = 1_700_000_000;

#[derive(Clone, Debug)]
struct Account {
    info: AccountInfo,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    access_tokens: HashMap<String, u64>,
    refresh_tokens: HashMap<String, u64>,
    reject_all_access: bool,
    offline: bool,
    notes: BTreeMap<u64, Note>,
    history: Vec<HistorySnapshot>,
    tags: BTreeMap<String, Tag>,
    next_id: u64,
    tick: i64,
    calls: HashMap<(Method, String), usize>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps, one second apart.
    fn now(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        DateTime::from_timestamp(CLOCK_ORIGIN + self.tick, 0).unwrap_or_default()
    }

    fn issue_tokens(&mut self, user: u64) -> TokenPair {
        let access = format!("access-{}", self.next_id());
        let refresh = format!("refresh-{}", self.next_id());
        self.access_tokens.insert(access.clone(), user);
        self.refresh_tokens.insert(refresh.clone(), user);
        TokenPair { access, refresh }
    }

    fn resolve_tags(&mut self, names: &[String]) -> Vec<Tag> {
        normalize_tag_names(names)
            .into_iter()
            .map(|name| {
                if let Some(tag) = self.tags.get(&name) {
                    return tag.clone();
                }
                let tag = Tag {
                    id: self.next_id(),
                    name: name.clone(),
                };
                self.tags.insert(name, tag.clone());
                tag
            })
            .collect()
    }
}

/// Who is calling, as far as the backend can tell.
enum Caller {
    Anonymous,
    User(u64),
}

/// In-memory notes API for testing and offline use.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_account(&self, username: &str, email: &str, password: &str) -> u64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.accounts.push(Account {
            info: AccountInfo {
                id,
                email: email.to_string(),
                username: username.to_string(),
                first_name: None,
                last_name: None,
            },
            password: password.to_string(),
        });
        id
    }

    pub fn issue_tokens(&self, user: u64) -> TokenPair {
        self.lock().issue_tokens(user)
    }

    pub fn expire_access_tokens(&self) {
        self.lock().access_tokens.clear();
    }

    pub fn revoke_refresh_tokens(&self) {
        self.lock().refresh_tokens.clear();
    }

    pub fn reject_all_access(&self, reject: bool) {
        self.lock().reject_all_access = reject;
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Overwrite a note's counters. Returns false for unknown notes.
    pub fn set_votes(&self, note: u64, upvotes: u64, downvotes: u64) -> bool {
        match self.lock().notes.get_mut(&note) {
            Some(note) => {
                note.upvotes = upvotes;
                note.downvotes = downvotes;
                true
            }
            None => false,
        }
    }

    pub fn note(&self, id: u64) -> Option<Note> {
        self.lock().notes.get(&id).cloned()
    }

    /// Snapshot count for one note.
    pub fn history_len(&self, note: u64) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|h| h.note_id == note)
            .count()
    }

    /// Number of exchanges for `method` + `path`.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.lock()
            .calls
            .get(&(method, path.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls(Method::Post, "/token/refresh/")
    }

    fn handle(&self, request: &ApiRequest, bearer: Option<&str>) -> ApiResponse {
        let mut state = self.lock();
        *state
            .calls
            .entry((request.method, request.path.clone()))
            .or_insert(0) += 1;

        let segments: Vec<&str> = request
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let caller = match bearer {
            None => Caller::Anonymous,
            Some(token) => match state.access_tokens.get(token) {
                Some(user) if !state.reject_all_access => Caller::User(*user),
                _ => return token_not_valid(),
            },
        };

        match (request.method, segments.as_slice()) {
            (Method::Post, ["token"]) => login(&mut state, request),
            (Method::Post, ["token", "refresh"]) => refresh(&mut state, request),
            (Method::Post, ["register"]) => register(&mut state, request),
            (Method::Get, ["notes", "public_notes"]) => list_public(&state, request),
            (Method::Get, ["notes", "my_notes"]) => {
                with_user(caller, |user| list_mine(&state, request, user))
            }
            (Method::Post, ["notes"]) => {
                with_user(caller, |user| create_note(&mut state, request, user))
            }
            (method, ["notes", id, rest @ ..]) => {
                let Ok(id) = id.parse::<u64>() else {
                    return not_found();
                };
                if !state.notes.contains_key(&id) {
                    return not_found();
                }
                match (method, rest) {
                    (Method::Get, []) => get_note(&state, id, caller),
                    (Method::Patch, []) => {
                        with_user(caller, |user| update_note(&mut state, request, id, user))
                    }
                    (Method::Delete, []) => with_user(caller, |_| delete_note(&mut state, id)),
                    (Method::Post, ["vote"]) => {
                        with_user(caller, |_| vote(&mut state, request, id))
                    }
                    (Method::Get, ["history"]) => with_user(caller, |_| history(&state, id)),
                    (Method::Post, ["restore"]) => {
                        with_user(caller, |user| restore(&mut state, request, id, user))
                    }
                    _ => method_not_allowed(),
                }
            }
            _ => not_found(),
        }
    }
}

impl Transport for MemoryBackend {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        if self.lock().offline {
            return Err(TransportError::Unavailable(
                "memory backend is offline".to_string(),
            ));
        }
        let response = self.handle(request, bearer);
        trace!("{} {} -> {}", request.method, request.path, response.status);
        Ok(response)
    }
}

fn with_user(caller: Caller, f: impl FnOnce(u64) -> ApiResponse) -> ApiResponse {
    match caller {
        Caller::User(user) => f(user),
        Caller::Anonymous => ApiResponse::json_body(
            401,
            &json!({ "detail": "Authentication credentials were not provided." }),
        ),
    }
}

fn token_not_valid() -> ApiResponse {
    ApiResponse::json_body(
        401,
        &json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid",
        }),
    )
}

fn not_found() -> ApiResponse {
    ApiResponse::json_body(404, &json!({ "detail": "Not found." }))
}

fn method_not_allowed() -> ApiResponse {
    ApiResponse::json_body(405, &json!({ "detail": "Method not allowed." }))
}

fn bad_request(field: &str, message: &str) -> ApiResponse {
    ApiResponse::json_body(400, &json!({ field: [message] }))
}

fn error(status: u16, message: &str) -> ApiResponse {
    ApiResponse::json_body(status, &json!({ "error": message }))
}

fn body<T: for<'de> Deserialize<'de>>(request: &ApiRequest) -> Result<T, ApiResponse> {
    let value = request.body.clone().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| bad_request("non_field_errors", &e.to_string()))
}

fn login(state: &mut State, request: &ApiRequest) -> ApiResponse {
    let credentials: Credentials = match body(request) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let user = state
        .accounts
        .iter()
        .find(|a| a.info.email == credentials.email && a.password == credentials.password)
        .map(|a| a.info.id);
    match user {
        Some(user) => ApiResponse::json_body(200, &state.issue_tokens(user)),
        None => ApiResponse::json_body(
            401,
            &json!({ "detail": "No active account found with the given credentials" }),
        ),
    }
}

fn refresh(state: &mut State, request: &ApiRequest) -> ApiResponse {
    #[derive(Deserialize)]
    struct Body {
        refresh: String,
    }
    let Body { refresh } = match body(request) {
        Ok(b) => b,
        Err(response) => return response,
    };
    match state.refresh_tokens.get(&refresh).copied() {
        Some(user) => {
            let access = format!("access-{}", state.next_id());
            state.access_tokens.insert(access.clone(), user);
            ApiResponse::json_body(200, &json!({ "access": access }))
        }
        None => ApiResponse::json_body(
            401,
            &json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
        ),
    }
}

fn register(state: &mut State, request: &ApiRequest) -> ApiResponse {
    let registration: Registration = match body(request) {
        Ok(r) => r,
        Err(response) => return response,
    };
    if registration.username.trim().is_empty() {
        return bad_request("username", "This field may not be blank.");
    }
    if !registration.email.contains('@') {
        return bad_request("email", "Enter a valid email address.");
    }
    if registration.password.len() < 8 {
        return bad_request("password", "Ensure this field has at least 8 characters.");
    }
    if registration.password != registration.password_confirm {
        return bad_request("non_field_errors", "Passwords do not match");
    }
    if state
        .accounts
        .iter()
        .any(|a| a.info.email == registration.email)
    {
        return bad_request("email", "user with this email already exists.");
    }

    let id = state.next_id();
    let info = AccountInfo {
        id,
        email: registration.email.clone(),
        username: registration.username.clone(),
        first_name: registration.first_name.clone(),
        last_name: registration.last_name.clone(),
    };
    state.accounts.push(Account {
        info: info.clone(),
        password: registration.password,
    });
    let tokens = state.issue_tokens(id);
    ApiResponse::json_body(201, &json!({ "user": info, "tokens": tokens }))
}

/// Title must be non-blank; published notes need content.
fn validate(title: &str, content: &str, is_draft: bool) -> Result<(), ApiResponse> {
    if title.trim().is_empty() {
        return Err(bad_request("title", "Title cannot be empty"));
    }
    if !is_draft && content.trim().is_empty() {
        return Err(bad_request(
            "content",
            "Content cannot be empty for published notes",
        ));
    }
    Ok(())
}

fn page(summaries: Vec<NoteSummary>) -> ApiResponse {
    ApiResponse::json_body(
        200,
        &json!({
            "count": summaries.len(),
            "next": null,
            "previous": null,
            "results": summaries,
        }),
    )
}

fn list_public(state: &State, request: &ApiRequest) -> ApiResponse {
    let ordering = request
        .query_value("ordering")
        .and_then(|o| o.parse::<PublicOrdering>().ok())
        .unwrap_or_default();
    let mut notes: Vec<&Note> = state.notes.values().filter(|n| n.accepts_votes()).collect();
    match ordering {
        PublicOrdering::New => notes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        PublicOrdering::Old => notes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        PublicOrdering::Upvotes => notes.sort_by(|a, b| {
            b.upvotes
                .cmp(&a.upvotes)
                .then(b.created_at.cmp(&a.created_at))
        }),
        PublicOrdering::Downvotes => notes.sort_by(|a, b| {
            b.downvotes
                .cmp(&a.downvotes)
                .then(b.created_at.cmp(&a.created_at))
        }),
    }
    page(notes.into_iter().map(NoteSummary::from).collect())
}

fn list_mine(state: &State, request: &ApiRequest, user: u64) -> ApiResponse {
    let search = request
        .query_value("search")
        .map(str::to_lowercase)
        .unwrap_or_default();
    let mut notes: Vec<&Note> = state
        .notes
        .values()
        .filter(|n| n.created_by == Some(user))
        .filter(|n| search.is_empty() || n.title.to_lowercase().contains(&search))
        .collect();
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    page(notes.into_iter().map(NoteSummary::from).collect())
}

fn create_note(state: &mut State, request: &ApiRequest, user: u64) -> ApiResponse {
    let draft: NoteDraft = match body(request) {
        Ok(d) => d,
        Err(response) => return response,
    };
    if let Err(response) = validate(&draft.title, &draft.content, draft.is_draft) {
        return response;
    }
    let id = state.next_id();
    let tags = state.resolve_tags(&draft.tag_names);
    let now = state.now();
    let note = Note {
        id,
        title: draft.title,
        content: draft.content,
        note_type: draft.note_type,
        is_draft: draft.is_draft,
        workspace_id: draft.workspace_id,
        tags,
        upvotes: 0,
        downvotes: 0,
        created_by: Some(user),
        created_at: now,
        updated_at: Some(now),
    };
    state.notes.insert(id, note.clone());
    ApiResponse::json_body(201, &note)
}

fn get_note(state: &State, id: u64, caller: Caller) -> ApiResponse {
    let Some(note) = state.notes.get(&id) else {
        return not_found();
    };
    if note.accepts_votes() {
        return ApiResponse::json_body(200, note);
    }
    with_user(caller, |_| ApiResponse::json_body(200, note))
}

fn update_note(state: &mut State, request: &ApiRequest, id: u64, user: u64) -> ApiResponse {
    let patch: NotePatch = match body(request) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(current) = state.notes.get(&id).cloned() else {
        return not_found();
    };

    let mut next = current.clone();
    if let Some(title) = patch.title {
        next.title = title;
    }
    if let Some(content) = patch.content {
        next.content = content;
    }
    if let Some(note_type) = patch.note_type {
        next.note_type = note_type;
    }
    if let Some(is_draft) = patch.is_draft {
        next.is_draft = is_draft;
    }
    if let Err(response) = validate(&next.title, &next.content, next.is_draft) {
        return response;
    }
    if let Some(names) = patch.tag_names {
        next.tags = state.resolve_tags(&names);
    }

    let now = state.now();
    if next.title != current.title || next.content != current.content {
        append_snapshot(state, &current, user, now);
    }
    next.updated_at = Some(now);
    state.notes.insert(id, next.clone());
    ApiResponse::json_body(200, &next)
}

fn append_snapshot(state: &mut State, note: &Note, user: u64, at: DateTime<Utc>) {
    let id = state.next_id();
    state.history.push(HistorySnapshot {
        id,
        note_id: note.id,
        title: note.title.clone(),
        content: note.content.clone(),
        changed_by: Some(user),
        changed_at: at,
    });
}

fn delete_note(state: &mut State, id: u64) -> ApiResponse {
    state.notes.remove(&id);
    ApiResponse::new(204, "")
}

fn vote(state: &mut State, request: &ApiRequest, id: u64) -> ApiResponse {
    #[derive(Deserialize)]
    struct Body {
        vote_type: String,
    }
    let Ok(Body { vote_type }) = body::<Body>(request) else {
        return error(400, "vote_type must be upvote or downvote");
    };
    let Ok(vote_type) = vote_type.parse::<VoteType>() else {
        return error(400, "vote_type must be upvote or downvote");
    };
    let Some(note) = state.notes.get_mut(&id) else {
        return not_found();
    };
    if note.note_type != NoteType::Public || note.is_draft {
        return error(400, "Can only vote on public published notes");
    }
    match vote_type {
        VoteType::Upvote => note.upvotes += 1,
        VoteType::Downvote => note.downvotes += 1,
    }
    ApiResponse::json_body(200, &*note)
}

fn history(state: &State, id: u64) -> ApiResponse {
    let mut snapshots: Vec<&HistorySnapshot> =
        state.history.iter().filter(|h| h.note_id == id).collect();
    snapshots.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(b.id.cmp(&a.id)));
    ApiResponse::json_body(200, &snapshots)
}

fn restore(state: &mut State, request: &ApiRequest, id: u64, user: u64) -> ApiResponse {
    #[derive(Deserialize)]
    struct Body {
        history_id: Option<u64>,
    }
    let history_id = match body::<Body>(request) {
        Ok(Body {
            history_id: Some(history_id),
        }) => history_id,
        _ => return error(400, "history_id is required"),
    };
    let Some(entry) = state
        .history
        .iter()
        .find(|h| h.id == history_id && h.note_id == id)
        .cloned()
    else {
        return error(404, "History entry not found");
    };
    let Some(current) = state.notes.get(&id).cloned() else {
        return not_found();
    };

    let now = state.now();
    append_snapshot(state, &current, user, now);

    let mut next = current;
    next.title = entry.title;
    next.content = entry.content;
    next.updated_at = Some(now);
    state.notes.insert(id, next.clone());
    ApiResponse::json_body(200, &next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed(backend: &MemoryBackend) -> String {
        let user = backend.add_account("ann", "ann@example.com", "password1");
        backend.issue_tokens(user).access
    }

    async fn call(
        backend: &MemoryBackend,
        request: ApiRequest,
        bearer: Option<&str>,
    ) -> ApiResponse {
        backend.execute(&request, bearer).await.unwrap()
    }

    fn draft() -> NoteDraft {
        NoteDraft::new(1, "First", "one").public()
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let backend = MemoryBackend::new();
        backend.add_account("ann", "ann@example.com", "password1");

        let response = call(
            &backend,
            ApiRequest::post("/token/").json(&json!({
                "email": "ann@example.com",
                "password": "password1",
            })),
            None,
        )
        .await;
        assert_eq!(response.status, 200);
        let pair: TokenPair = response.json().unwrap();

        let response = call(
            &backend,
            ApiRequest::post("/token/refresh/").json(&json!({ "refresh": pair.refresh })),
            None,
        )
        .await;
        assert_eq!(response.status, 200);
        assert_eq!(backend.refresh_calls(), 1);

        let response = call(
            &backend,
            ApiRequest::post("/token/").json(&json!({
                "email": "ann@example.com",
                "password": "wrong",
            })),
            None,
        )
        .await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_invalid_bearer_is_unauthorized() {
        let backend = MemoryBackend::new();
        let access = authed(&backend);
        backend.expire_access_tokens();

        let response = call(&backend, ApiRequest::get("/notes/my_notes/"), Some(&access)).await;
        assert_eq!(response.status, 401);

        let response = call(&backend, ApiRequest::get("/notes/my_notes/"), None).await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_update_without_content_change_keeps_history() {
        let backend = MemoryBackend::new();
        let access = authed(&backend);
        let note: Note = call(&backend, ApiRequest::post("/notes/").json(&draft()), Some(&access))
            .await
            .json()
            .unwrap();

        let patch = NotePatch::default().is_draft(true).tags(["x"]);
        let response = call(
            &backend,
            ApiRequest::patch(format!("/notes/{}/", note.id)).json(&patch),
            Some(&access),
        )
        .await;
        assert_eq!(response.status, 200);
        assert_eq!(backend.history_len(note.id), 0);

        let patch = NotePatch::default().title("Renamed");
        call(
            &backend,
            ApiRequest::patch(format!("/notes/{}/", note.id)).json(&patch),
            Some(&access),
        )
        .await;
        assert_eq!(backend.history_len(note.id), 1);
    }

    #[tokio::test]
    async fn test_restore_requires_known_entry() {
        let backend = MemoryBackend::new();
        let access = authed(&backend);
        let note: Note = call(&backend, ApiRequest::post("/notes/").json(&draft()), Some(&access))
            .await
            .json()
            .unwrap();
        let path = format!("/notes/{}/restore/", note.id);

        let response = call(&backend, ApiRequest::post(path.clone()).json(&json!({})), Some(&access)).await;
        assert_eq!(response.status, 400);

        let response = call(
            &backend,
            ApiRequest::post(path).json(&json!({ "history_id": 999 })),
            Some(&access),
        )
        .await;
        assert_eq!(response.status, 404);
        assert_eq!(backend.history_len(note.id), 0);
    }

    #[tokio::test]
    async fn test_vote_rules() {
        let backend = MemoryBackend::new();
        let access = authed(&backend);
        let private: Note = call(
            &backend,
            ApiRequest::post("/notes/").json(&NoteDraft::new(1, "p", "c")),
            Some(&access),
        )
        .await
        .json()
        .unwrap();

        let response = call(
            &backend,
            ApiRequest::post(format!("/notes/{}/vote/", private.id))
                .json(&json!({ "vote_type": "upvote" })),
            Some(&access),
        )
        .await;
        assert_eq!(response.status, 400);

        let public: Note = call(&backend, ApiRequest::post("/notes/").json(&draft()), Some(&access))
            .await
            .json()
            .unwrap();
        let response = call(
            &backend,
            ApiRequest::post(format!("/notes/{}/vote/", public.id))
                .json(&json!({ "vote_type": "sideways" })),
            Some(&access),
        )
        .await;
        assert_eq!(response.status, 400);
        assert_eq!(backend.note(public.id).unwrap().upvotes, 0);
    }

    #[tokio::test]
    async fn test_public_note_readable_anonymously() {
        let backend = MemoryBackend::new();
        let access = authed(&backend);
        let public: Note = call(&backend, ApiRequest::post("/notes/").json(&draft()), Some(&access))
            .await
            .json()
            .unwrap();
        let private: Note = call(
            &backend,
            ApiRequest::post("/notes/").json(&NoteDraft::new(1, "p", "c")),
            Some(&access),
        )
        .await
        .json()
        .unwrap();

        let response = call(&backend, ApiRequest::get(format!("/notes/{}/", public.id)), None).await;
        assert_eq!(response.status, 200);
        let response = call(&backend, ApiRequest::get(format!("/notes/{}/", private.id)), None).await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_offline_fails_at_transport() {
        let backend = MemoryBackend::new();
        backend.set_offline(true);
        let result = backend.execute(&ApiRequest::get("/notes/public_notes/"), None).await;
        assert!(matches!(result, Err(TransportError::Unavailable(_))));
    }
}
