//! Client settings: defaults, then an optional `notes.toml`, then `NOTES_*`
//! environment variables (`NOTES_API__BASE_URL`, `NOTES_API__TIMEOUT_SECS`,
//! `NOTES_SESSION__CREDENTIALS_DIR`). Variables from a `.env` file are
//! loaded first and never override ones already set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::SettingsError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Api {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    pub credentials_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub session: Session,
}

impl Settings {
    /// Load with `path` as the optional settings file, after reading `.env`
    /// from the working directory or its parents.
    pub fn from_file(path: &str) -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::load(path)
    }

    /// Like [`from_file`](Self::from_file), with an explicit env file.
    pub fn from_files(path: &str, env_file: &Path) -> Result<Self, SettingsError> {
        dotenvy::from_path(env_file).ok();
        Self::load(path)
    }

    fn load(path: &str) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)?;
        // Without a platform data dir the location must come from the file
        // or the environment.
        if let Some(data_dir) = dirs::data_dir() {
            builder = builder.set_default(
                "session.credentials_dir",
                data_dir.join("notes-client").to_string_lossy().into_owned(),
            )?;
        }

        let config = builder
            .add_source(File::with_name(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("NOTES")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::set_var;

    #[test]
    fn test_settings() {
        set_var("NOTES_API__BASE_URL", "https://notes.example.com/api");
        set_var("NOTES_SESSION__CREDENTIALS_DIR", "/tmp/notes-test");
        let settings = Settings::from_file("does-not-exist.toml").unwrap();
        assert_eq!(settings.api.base_url, "https://notes.example.com/api");
        assert_eq!(settings.api.timeout(), Duration::from_secs(30));
        assert_eq!(
            settings.session.credentials_dir,
            PathBuf::from("/tmp/notes-test")
        );

        // Env file values fill gaps but never override the environment.
        let env_file = std::env::temp_dir().join(format!("notes-env-{}", std::process::id()));
        std::fs::write(
            &env_file,
            "NOTES_API__TIMEOUT_SECS=45\nNOTES_API__BASE_URL=http://ignored\n",
        )
        .unwrap();
        let settings = Settings::from_files("does-not-exist.toml", &env_file).unwrap();
        assert_eq!(settings.api.timeout(), Duration::from_secs(45));
        assert_eq!(settings.api.base_url, "https://notes.example.com/api");
        let _ = std::fs::remove_file(&env_file);
    }
}
