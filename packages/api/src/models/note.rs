//! # Note models
//!
//! JSON shapes exchanged with the notes backend. Field names follow the
//! backend's snake_case wire format.
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Note`] | Full note as returned by get/create/update/vote/restore. |
//! | [`NoteSummary`] | Listing row (no `content`), returned by the public and "my notes" listings. |
//! | [`NoteDraft`] | Body of a create call. Tags go by name. |
//! | [`NotePatch`] | Partial update; absent fields are left untouched. |
//! | [`HistorySnapshot`] | Immutable capture of a note's `title`/`content` before a change. |
//! | [`Listing`] | Either a bare array or a paginated envelope. |

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NoteError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Private,
    Public,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }
}

impl std::str::FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" | "up" => Ok(VoteType::Upvote),
            "downvote" | "down" => Ok(VoteType::Downvote),
            other => Err(format!("vote_type must be upvote or downvote, got {other:?}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}

/// A note with its current content and vote counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub note_type: NoteType,
    pub is_draft: bool,
    #[serde(rename = "workspace")]
    pub workspace_id: u64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub created_by: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Voting is only valid on public, published notes.
    pub fn accepts_votes(&self) -> bool {
        self.note_type == NoteType::Public && !self.is_draft
    }

    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Listing row: a note without its body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: u64,
    pub title: String,
    pub note_type: NoteType,
    pub is_draft: bool,
    #[serde(rename = "workspace")]
    pub workspace_id: u64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            note_type: note.note_type,
            is_draft: note.is_draft,
            workspace_id: note.workspace_id,
            tags: note.tags.clone(),
            upvotes: note.upvotes,
            downvotes: note.downvotes,
            created_at: note.created_at,
        }
    }
}

/// Fields for a new note. `is_draft` and `note_type` are taken verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub note_type: NoteType,
    pub is_draft: bool,
    #[serde(rename = "workspace")]
    pub workspace_id: u64,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

impl NoteDraft {
    pub fn new(workspace_id: u64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            workspace_id,
            ..Default::default()
        }
    }

    pub fn public(mut self) -> Self {
        self.note_type = NoteType::Public;
        self
    }

    pub fn draft(mut self) -> Self {
        self.is_draft = true;
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tag_names = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Title must be non-blank; content may only be blank on drafts.
    pub fn validate(&self) -> Result<(), NoteError> {
        validate_fields(Some(&self.title), Some(&self.content), self.is_draft)
    }
}

/// Partial update. Only `Some` fields are sent; `tag_names` replaces the
/// whole tag set when present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
}

impl NotePatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn note_type(mut self, note_type: NoteType) -> Self {
        self.note_type = Some(note_type);
        self
    }

    pub fn is_draft(mut self, is_draft: bool) -> Self {
        self.is_draft = Some(is_draft);
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tag_names = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == NotePatch::default()
    }

    /// Same rules as [`NoteDraft::validate`], applied to the fields present.
    pub fn validate(&self) -> Result<(), NoteError> {
        validate_fields(
            self.title.as_ref(),
            self.content.as_ref(),
            self.is_draft.unwrap_or(true),
        )
    }
}

fn validate_fields(
    title: Option<&String>,
    content: Option<&String>,
    is_draft: bool,
) -> Result<(), NoteError> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(NoteError::Validation {
                field: "title",
                message: "Title cannot be empty".to_string(),
            });
        }
    }
    if let Some(content) = content {
        if !is_draft && content.trim().is_empty() {
            return Err(NoteError::Validation {
                field: "content",
                message: "Content cannot be empty for published notes".to_string(),
            });
        }
    }
    Ok(())
}

/// Normalise tag names the way the backend resolves them: trimmed,
/// lower-cased, blanks dropped, first occurrence wins.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

/// Pre-change capture of a note's content-bearing fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub id: u64,
    #[serde(rename = "note", default)]
    pub note_id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub changed_by: Option<u64>,
    pub changed_at: DateTime<Utc>,
}

/// Sort order of the public listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PublicOrdering {
    #[default]
    New,
    Old,
    Upvotes,
    Downvotes,
}

impl PublicOrdering {
    pub fn as_query(&self) -> &'static str {
        match self {
            PublicOrdering::New => "new",
            PublicOrdering::Old => "old",
            PublicOrdering::Upvotes => "upvotes",
            PublicOrdering::Downvotes => "downvotes",
        }
    }
}

impl std::str::FromStr for PublicOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(PublicOrdering::New),
            "old" => Ok(PublicOrdering::Old),
            "upvotes" => Ok(PublicOrdering::Upvotes),
            "downvotes" => Ok(PublicOrdering::Downvotes),
            other => Err(format!("unknown ordering {other:?}")),
        }
    }
}

/// Listing body: paginated envelope or bare array.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Page { results, .. } => results,
            Listing::Bare(items) => items,
        }
    }
}
