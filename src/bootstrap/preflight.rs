//! Startup validation ahead of the worker handoff.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::layout::{Layout, LayoutEntry};
use crate::config::{DatabaseTarget, RuntimeConfig};

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
}

/// State of the cookies file the downloader reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Present,
    Missing,
}

/// Result of the startup checks.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub token_present: bool,
    pub credential_path: PathBuf,
    pub credential: CredentialStatus,
    pub layout: Vec<LayoutEntry>,
    pub database: DatabaseTarget,
}

impl PreflightReport {
    /// Returns the fatal error this report implies, if any.
    #[must_use]
    pub fn fatal(&self) -> Option<BootstrapError> {
        (!self.token_present).then_some(BootstrapError::MissingToken)
    }
}

/// Runs the checks and creates the layout.
///
/// Directories are ensured first, so a missing token still leaves the
/// layout in place. The token is the only fatal precondition; a missing
/// cookies file is logged as a warning.
pub fn prepare(config: &RuntimeConfig) -> Result<PreflightReport, BootstrapError> {
    let layout = Layout::for_config(config).ensure();
    let report = build_report(config, layout);

    if let Some(err) = report.fatal() {
        return Err(err);
    }

    if report.credential == CredentialStatus::Missing {
        warn!(
            "COOKIES_PATH not found at {}. Downloads that need an authenticated session may fail.",
            report.credential_path.display()
        );
    }

    match &report.database {
        DatabaseTarget::None => {
            info!("DATABASE_URL/BOT_DB_PATH not set; worker runs without a database");
        }
        DatabaseTarget::Url { .. } => info!("Worker will log downloads to DATABASE_URL"),
        DatabaseTarget::Sqlite { path } => {
            info!("Worker will log downloads to SQLite at {}", path.display());
        }
    }

    Ok(report)
}

/// Runs the checks without touching the filesystem.
#[must_use]
pub fn inspect(config: &RuntimeConfig) -> PreflightReport {
    build_report(config, Layout::for_config(config).inspect())
}

fn build_report(config: &RuntimeConfig, layout: Vec<LayoutEntry>) -> PreflightReport {
    let credential = if config.cookies_path.exists() {
        CredentialStatus::Present
    } else {
        CredentialStatus::Missing
    };

    PreflightReport {
        token_present: config.has_token(),
        credential_path: config.cookies_path.clone(),
        credential,
        layout,
        database: config.database.clone(),
    }
}
