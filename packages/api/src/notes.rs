//! # Note version workflow
//!
//! [`NoteVersionWorkflow`] is the client side of note editing. Every call
//! goes through the [`RequestPipeline`], so an expired access credential is
//! refreshed transparently and the operation never sees the 401.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`create`](NoteVersionWorkflow::create) | `POST /notes/` |
//! | [`get`](NoteVersionWorkflow::get) | `GET /notes/{id}/` |
//! | [`update`](NoteVersionWorkflow::update) | `PATCH /notes/{id}/` |
//! | [`delete`](NoteVersionWorkflow::delete) | `DELETE /notes/{id}/` |
//! | [`vote`](NoteVersionWorkflow::vote) | `POST /notes/{id}/vote/` |
//! | [`list_history`](NoteVersionWorkflow::list_history) | `GET /notes/{id}/history/` |
//! | [`restore`](NoteVersionWorkflow::restore) | `POST /notes/{id}/restore/` |
//! | [`list_public`](NoteVersionWorkflow::list_public) | `GET /notes/public_notes/?ordering=` |
//! | [`list_mine`](NoteVersionWorkflow::list_mine) | `GET /notes/my_notes/?search=` |
//!
//! Snapshots are taken by the backend. The client only validates input,
//! normalizes tag names and maps the vote rejection to
//! [`NoteError::VoteNotAllowed`].
//!
//! Some backends answer writes with a reduced body (no counters or
//! timestamps). When the response does not decode as a full [`Note`], the
//! note is fetched again so callers always get the complete record.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use store::CredentialStore;
use tracing::{debug, info};

use crate::error::{NoteError, PipelineError};
use crate::models::note::normalize_tag_names;
use crate::models::{
    HistorySnapshot, Listing, Note, NoteDraft, NotePatch, NoteSummary, PublicOrdering, VoteType,
};
use crate::pipeline::RequestPipeline;
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub const NOTES_PATH: &str = "/notes/";
pub const PUBLIC_NOTES_PATH: &str = "/notes/public_notes/";
pub const MY_NOTES_PATH: &str = "/notes/my_notes/";

/// Backend wording for a vote on a private or draft note.
const VOTE_REJECTED: &str = "Can only vote on public published notes";

/// Backend wording for a restore naming an unknown snapshot.
const HISTORY_MISSING: &str = "History entry not found";

fn note_path(id: u64) -> String {
    format!("{NOTES_PATH}{id}/")
}

#[derive(Deserialize)]
struct CreatedId {
    id: u64,
}

pub struct NoteVersionWorkflow<T: Transport, S: CredentialStore> {
    pipeline: Arc<RequestPipeline<T, S>>,
}

impl<T: Transport, S: CredentialStore> NoteVersionWorkflow<T, S> {
    pub fn new(pipeline: Arc<RequestPipeline<T, S>>) -> Self {
        Self { pipeline }
    }

    pub async fn create(&self, draft: &NoteDraft) -> Result<Note, NoteError> {
        draft.validate()?;
        let body = NoteDraft {
            tag_names: normalize_tag_names(&draft.tag_names),
            ..draft.clone()
        };

        let response = self
            .pipeline
            .send(&ApiRequest::post(NOTES_PATH).json(&body))
            .await?;
        let note = match response.json::<Note>() {
            Ok(note) => note,
            Err(_) => {
                let CreatedId { id } = response.json().map_err(PipelineError::from)?;
                self.get(id).await?
            }
        };
        info!(note = note.id, "created note");
        Ok(note)
    }

    pub async fn get(&self, id: u64) -> Result<Note, NoteError> {
        Ok(self
            .pipeline
            .send_json(&ApiRequest::get(note_path(id)))
            .await?)
    }

    /// Apply `patch`. The backend records a snapshot of the previous title
    /// and content when either of them changes.
    pub async fn update(&self, id: u64, patch: &NotePatch) -> Result<Note, NoteError> {
        patch.validate()?;
        let mut body = patch.clone();
        if let Some(names) = &patch.tag_names {
            body.tag_names = Some(normalize_tag_names(names));
        }

        let response = self
            .pipeline
            .send(&ApiRequest::patch(note_path(id)).json(&body))
            .await?;
        let note = self.settle(id, &response).await?;
        info!(note = id, "updated note");
        Ok(note)
    }

    pub async fn delete(&self, id: u64) -> Result<(), NoteError> {
        self.pipeline
            .send_unit(&ApiRequest::delete(note_path(id)))
            .await?;
        info!(note = id, "deleted note");
        Ok(())
    }

    /// Cast one vote. Private and draft notes are rejected before anything
    /// is sent; a backend rejection maps to the same error.
    pub async fn vote(&self, id: u64, vote_type: VoteType) -> Result<Note, NoteError> {
        let note = self.get(id).await?;
        if !note.accepts_votes() {
            return Err(NoteError::VoteNotAllowed);
        }

        let request = ApiRequest::post(format!("{}vote/", note_path(id)))
            .json(&json!({ "vote_type": vote_type.as_str() }));
        let response = match self.pipeline.send(&request).await {
            Ok(response) => response,
            Err(PipelineError::RequestFailed { status: 400, body })
                if body.contains(VOTE_REJECTED) =>
            {
                return Err(NoteError::VoteNotAllowed)
            }
            Err(e) => return Err(e.into()),
        };
        let note = self.settle(id, &response).await?;
        debug!(note = id, vote = vote_type.as_str(), "vote recorded");
        Ok(note)
    }

    /// Snapshots for `id`, newest first.
    pub async fn list_history(&self, id: u64) -> Result<Vec<HistorySnapshot>, NoteError> {
        let listing: Listing<HistorySnapshot> = self
            .pipeline
            .send_json(&ApiRequest::get(format!("{}history/", note_path(id))))
            .await?;
        let mut snapshots = listing.into_vec();
        for snapshot in &mut snapshots {
            snapshot.note_id = id;
        }
        snapshots.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(b.id.cmp(&a.id)));
        Ok(snapshots)
    }

    /// Bring back the title and content of snapshot `history_id`. The state
    /// being replaced is itself snapshotted, so a restore can be undone.
    pub async fn restore(&self, id: u64, history_id: u64) -> Result<Note, NoteError> {
        let request = ApiRequest::post(format!("{}restore/", note_path(id)))
            .json(&json!({ "history_id": history_id }));
        let response = match self.pipeline.send(&request).await {
            Ok(response) => response,
            Err(PipelineError::RequestFailed { status: 404, body })
                if body.contains(HISTORY_MISSING) =>
            {
                return Err(NoteError::HistoryNotFound(history_id))
            }
            Err(e) => return Err(e.into()),
        };
        let note = self.settle(id, &response).await?;
        info!(note = id, history = history_id, "restored note");
        Ok(note)
    }

    pub async fn list_public(&self, ordering: PublicOrdering) -> Result<Vec<NoteSummary>, NoteError> {
        let request = ApiRequest::get(PUBLIC_NOTES_PATH).query("ordering", ordering.as_query());
        let listing: Listing<NoteSummary> = self.pipeline.send_json(&request).await?;
        Ok(listing.into_vec())
    }

    pub async fn list_mine(&self, search: Option<&str>) -> Result<Vec<NoteSummary>, NoteError> {
        let mut request = ApiRequest::get(MY_NOTES_PATH);
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            request = request.query("search", search);
        }
        let listing: Listing<NoteSummary> = self.pipeline.send_json(&request).await?;
        Ok(listing.into_vec())
    }

    async fn settle(&self, id: u64, response: &ApiResponse) -> Result<Note, NoteError> {
        match response.json::<Note>() {
            Ok(note) => Ok(note),
            Err(_) => self.get(id).await,
        }
    }
}
