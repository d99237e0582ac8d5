//! Transfer of control from the supervisor to the worker.
//!
//! On Unix the supervisor replaces its own process image with the worker,
//! so signals from the container runtime reach the worker directly. Where
//! that is unavailable, or when asked to, it spawns the worker, waits for
//! it, forwards termination signals, and exits with the worker's status.

mod command;
mod supervise;

use std::io;

use thiserror::Error;

pub use command::{DEFAULT_WORKER, WorkerCommand};
pub use supervise::{exit_code_of, supervise};

/// How control is handed to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HandoffMode {
    /// Replace the supervisor process with the worker.
    Exec,
    /// Spawn the worker and wait for it.
    Supervise,
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) { Self::Exec } else { Self::Supervise }
    }
}

/// Errors that can occur while starting the worker.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("Worker program not found: {program}")]
    NotFound { program: String },

    #[error("Worker program is not executable: {program}")]
    PermissionDenied { program: String },

    #[error("Failed to start worker {program}: {source}")]
    Start {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("Failed while waiting for worker: {0}")]
    Wait(#[source] io::Error),
}

impl HandoffError {
    fn from_start(cmd: &WorkerCommand, err: io::Error) -> Self {
        let program = cmd.program().to_string_lossy().into_owned();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { program },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Start {
                program,
                source: err,
            },
        }
    }

    /// Exit status a POSIX shell would report for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound { .. } => 127,
            Self::PermissionDenied { .. } => 126,
            Self::Start { .. } | Self::Signals(_) | Self::Wait(_) => 1,
        }
    }
}

/// Hands control to the worker using `mode`.
///
/// In `Exec` mode this only returns on failure. Where process replacement
/// is unavailable, `Exec` falls back to supervising.
pub async fn hand_off(cmd: &WorkerCommand, mode: HandoffMode) -> Result<u8, HandoffError> {
    match mode {
        #[cfg(unix)]
        HandoffMode::Exec => Err(exec(cmd)),
        #[cfg(not(unix))]
        HandoffMode::Exec => {
            tracing::warn!("Process replacement is unavailable here; supervising the worker instead");
            supervise(cmd).await
        }
        HandoffMode::Supervise => supervise(cmd).await,
    }
}

/// Replaces the current process with the worker.
///
/// Only returns if the replacement failed.
#[cfg(unix)]
pub fn exec(cmd: &WorkerCommand) -> HandoffError {
    use std::os::unix::process::CommandExt;

    let err = cmd.to_std().exec();
    HandoffError::from_start(cmd, err)
}
