//! Wire models shared by the client and the in-process backend.

pub mod note;
pub mod user;

pub use note::{
    HistorySnapshot, Listing, Note, NoteDraft, NotePatch, NoteSummary, NoteType, PublicOrdering,
    Tag, VoteType,
};
pub use user::{AccountInfo, Credentials, Registration, TokenPair};
