use std::process::ExitCode;
use std::sync::Arc;

use api::{
    AuthError, Client, HttpTransport, NoteDraft, NoteError, NotePatch, PipelineError,
    Registration, SessionStore, Settings, SettingsError,
};
use clap::Parser;
use serde::Serialize;
use store::FileStore;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{CliConfig, Command, CreateArgs, NoteCommand, UpdateArgs};

mod cli;

type HttpClient = Client<HttpTransport, FileStore>;

#[derive(Debug, Error)]
enum CommandError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error("could not read password: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("could not print result: {0}")]
    Output(#[from] serde_json::Error),
}

impl CommandError {
    fn session_expired(&self) -> bool {
        matches!(
            self,
            CommandError::Auth(AuthError::Pipeline(PipelineError::SessionExpired))
                | CommandError::Note(NoteError::Pipeline(PipelineError::SessionExpired))
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli_config = CliConfig::parse();
    match run(cli_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.session_expired() => {
            error!("session expired, run `notes login` again");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli_config: CliConfig) -> Result<(), CommandError> {
    let settings = Settings::from_file(&cli_config.config_file.to_string_lossy())?;
    debug!(
        "api at {}, credentials in {}",
        settings.api.base_url,
        settings.session.credentials_dir.display()
    );

    let session = SessionStore::load(FileStore::new(settings.session.credentials_dir.clone())).await;
    let client = Client::with_timeout(
        HttpTransport::new(settings.api.base_url.clone()),
        Arc::new(session),
        settings.api.timeout(),
    );

    match cli_config.command {
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password("Password: ")?,
            };
            client.auth().login(&email, &password).await?;
            println!("logged in");
        }
        Command::Register {
            username,
            email,
            first_name,
            last_name,
        } => {
            let password = rpassword::prompt_password("Password: ")?;
            let mut registration = Registration::new(&username, &email, &password);
            registration.password_confirm = rpassword::prompt_password("Repeat the password: ")?;
            registration.first_name = first_name;
            registration.last_name = last_name;
            let account = client.auth().register(&registration).await?;
            print_json(&account)?;
        }
        Command::Logout => {
            client.auth().logout().await;
            println!("logged out");
        }
        Command::Status => {
            println!("{:?}", client.session().status());
        }
        Command::Note(command) => note(&client, command).await?,
        Command::Public { ordering } => {
            print_json(&client.notes().list_public(ordering).await?)?;
        }
        Command::Mine { search } => {
            print_json(&client.notes().list_mine(search.as_deref()).await?)?;
        }
    }
    Ok(())
}

async fn note(client: &HttpClient, command: NoteCommand) -> Result<(), CommandError> {
    let notes = client.notes();
    match command {
        NoteCommand::Get { id } => print_json(&notes.get(id).await?)?,
        NoteCommand::Create(args) => print_json(&notes.create(&draft(args)).await?)?,
        NoteCommand::Update(args) => {
            let id = args.id;
            print_json(&notes.update(id, &patch(args)).await?)?
        }
        NoteCommand::Delete { id } => {
            notes.delete(id).await?;
            println!("deleted note {id}");
        }
        NoteCommand::Vote { id, vote } => print_json(&notes.vote(id, vote).await?)?,
        NoteCommand::History { id } => print_json(&notes.list_history(id).await?)?,
        NoteCommand::Restore { id, history_id } => {
            print_json(&notes.restore(id, history_id).await?)?
        }
    }
    Ok(())
}

fn draft(args: CreateArgs) -> NoteDraft {
    let mut draft = NoteDraft::new(args.workspace, args.title, args.content).with_tags(args.tags);
    if args.public {
        draft = draft.public();
    }
    if args.draft {
        draft = draft.draft();
    }
    draft
}

fn patch(args: UpdateArgs) -> NotePatch {
    NotePatch {
        title: args.title,
        content: args.content,
        note_type: args.visibility,
        is_draft: args.draft,
        tag_names: args.tags,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
