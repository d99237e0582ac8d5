//! Removal of stale worker scratch directories.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Counts from a sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed: usize,
    pub errors: usize,
}

/// Removes prefixed directories under `base` that are at least `ttl` old.
///
/// Only direct children are considered. Files and directories whose names
/// do not start with `prefix` are left alone. Failures on individual entries
/// are counted, not returned.
pub fn sweep_stale_dirs(base: &Path, prefix: &str, ttl: Duration) -> std::io::Result<SweepReport> {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    let cutoff = Utc::now()
        .checked_sub_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut report = SweepReport::default();

    for entry in std::fs::read_dir(base)? {
        let Ok(entry) = entry else {
            report.errors += 1;
            continue;
        };
        let path = entry.path();

        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }

        let modified: DateTime<Utc> = match entry.metadata().and_then(|m| m.modified()) {
            Ok(time) => time.into(),
            Err(e) => {
                debug!("Skipping {}: no modification time ({})", path.display(), e);
                continue;
            }
        };
        if modified > cutoff {
            continue;
        }

        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                report.removed += 1;
                info!("Removed stale scratch directory {}", path.display());
            }
            Err(e) => {
                report.errors += 1;
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }

    Ok(report)
}
