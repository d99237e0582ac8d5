//! Startup checks run before the worker takes over.
//!
//! Ensures the directory layout, validates the bot token, warns about a
//! missing cookies file, and optionally clears stale scratch directories.

mod layout;
mod preflight;
mod sweep;

pub use layout::{DirRole, DirStatus, Layout, LayoutDir, LayoutEntry};
pub use preflight::{BootstrapError, CredentialStatus, PreflightReport, inspect, prepare};
pub use sweep::{SweepReport, sweep_stale_dirs};
