//! Configuration module for the bootstrap supervisor.
//!
//! Handles reading the runtime configuration from the environment,
//! including the bot token, credential path, and output layout.

mod settings;

pub use settings::{
    COOKIES_PATH_VAR, DATABASE_URL_VAR, DatabaseTarget, OUTPUT_ROOT_VAR, RuntimeConfig, TOKEN_VAR,
    normalize_database_url, redact_database_url,
};

/// Default `.env` file loaded before reading the environment.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Loads variables from an env file without overriding existing ones.
///
/// Returns the error when the file is missing or unreadable so the caller
/// can log it once logging is up.
pub fn load_env_file(path: &str) -> Result<std::path::PathBuf, dotenvy::Error> {
    dotenvy::from_filename(path)
}
