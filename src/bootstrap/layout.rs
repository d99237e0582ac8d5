//! Filesystem layout the worker expects to find at startup.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{DatabaseTarget, RuntimeConfig};

/// Why a directory is part of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirRole {
    /// Parent of the cookies file.
    Credentials,
    /// Download root.
    Output,
    /// Parent of the SQLite database file.
    Database,
    /// Parent of the single-instance lock file.
    Lock,
}

/// A directory that must exist before the worker starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutDir {
    pub role: DirRole,
    pub path: PathBuf,
}

/// Outcome of ensuring one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirStatus {
    Existing,
    Created,
    Missing,
    Failed { error: String },
}

/// Per-directory outcome of a layout pass.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutEntry {
    #[serde(flatten)]
    pub dir: LayoutDir,
    #[serde(flatten)]
    pub status: DirStatus,
}

/// Ordered, de-duplicated set of directories derived from the configuration.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    dirs: Vec<LayoutDir>,
}

impl Layout {
    /// Builds the layout for a configuration.
    ///
    /// Credentials come first and the output root second; the database and
    /// lock parents follow when they apply.
    #[must_use]
    pub fn for_config(config: &RuntimeConfig) -> Self {
        let mut layout = Self::default();

        if let Some(parent) = parent_dir(&config.cookies_path) {
            layout.push(DirRole::Credentials, parent);
        }
        layout.push(DirRole::Output, config.output_root.clone());
        if let DatabaseTarget::Sqlite { path } = &config.database
            && let Some(parent) = parent_dir(path)
        {
            layout.push(DirRole::Database, parent);
        }
        if let Some(parent) = parent_dir(&config.lock_file) {
            layout.push(DirRole::Lock, parent);
        }

        layout
    }

    fn push(&mut self, role: DirRole, path: PathBuf) {
        if self.dirs.iter().any(|d| d.path == path) {
            return;
        }
        self.dirs.push(LayoutDir { role, path });
    }

    /// Returns the directories in creation order.
    #[must_use]
    pub fn dirs(&self) -> &[LayoutDir] {
        &self.dirs
    }

    /// Reports which directories exist without touching the filesystem.
    #[must_use]
    pub fn inspect(&self) -> Vec<LayoutEntry> {
        self.dirs
            .iter()
            .map(|dir| LayoutEntry {
                dir: dir.clone(),
                status: if dir.path.is_dir() {
                    DirStatus::Existing
                } else {
                    DirStatus::Missing
                },
            })
            .collect()
    }

    /// Creates every missing directory, recursively.
    ///
    /// Pre-existing directories are fine. A directory that cannot be created
    /// is logged and reported but does not stop the pass.
    pub fn ensure(&self) -> Vec<LayoutEntry> {
        self.dirs
            .iter()
            .map(|dir| LayoutEntry {
                dir: dir.clone(),
                status: ensure_dir(dir),
            })
            .collect()
    }
}

fn ensure_dir(dir: &LayoutDir) -> DirStatus {
    if dir.path.is_dir() {
        debug!("{:?} directory already present: {}", dir.role, dir.path.display());
        return DirStatus::Existing;
    }

    match std::fs::create_dir_all(&dir.path) {
        Ok(()) => {
            info!("Created {:?} directory: {}", dir.role, dir.path.display());
            DirStatus::Created
        }
        Err(e) => {
            warn!(
                "Could not create {:?} directory {}: {}",
                dir.role,
                dir.path.display(),
                e
            );
            DirStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Parent of a file path, ignoring the empty parent of a bare file name.
fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
