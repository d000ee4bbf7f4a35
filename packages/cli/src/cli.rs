use std::path::PathBuf;

use api::{NoteType, PublicOrdering, VoteType};
use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "notes", version, about = "Command-line client for the notes service")]
pub struct CliConfig {
    /// Settings file, overridden by NOTES_* environment variables.
    #[arg(long, default_value = "notes.toml")]
    pub config_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Log in and store the credential pair.
    Login {
        #[arg(long)]
        email: String,
        /// Read from the terminal when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account, then log in with it.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    Logout,
    /// Show whether a session is stored.
    Status,
    #[command(subcommand)]
    Note(NoteCommand),
    /// Published public notes.
    Public {
        #[arg(long, default_value = "new")]
        ordering: PublicOrdering,
    },
    /// Notes you created.
    Mine {
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum NoteCommand {
    Get { id: u64 },
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete { id: u64 },
    Vote { id: u64, vote: VoteType },
    History { id: u64 },
    Restore { id: u64, history_id: u64 },
}

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub workspace: u64,
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub content: String,
    #[arg(long, default_value_t = false)]
    pub public: bool,
    #[arg(long, default_value_t = false)]
    pub draft: bool,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArgs {
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, value_parser = parse_note_type)]
    pub visibility: Option<NoteType>,
    #[arg(long)]
    pub draft: Option<bool>,
    /// Replaces every tag on the note.
    #[arg(long = "tag")]
    pub tags: Option<Vec<String>>,
}

fn parse_note_type(s: &str) -> Result<NoteType, String> {
    match s {
        "public" => Ok(NoteType::Public),
        "private" => Ok(NoteType::Private),
        other => Err(format!("expected public or private, got {other:?}")),
    }
}
