//! Runtime configuration read from the process environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the cookies file path.
pub const COOKIES_PATH_VAR: &str = "COOKIES_PATH";

/// Environment variable holding the download root.
pub const OUTPUT_ROOT_VAR: &str = "OUTPUT_ROOT";

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

const DEFAULT_COOKIES_PATH: &str = "/app/telegram_bot/secrets/cookies.txt";
const DEFAULT_OUTPUT_ROOT: &str = "/data/downloads";
const DEFAULT_LOCK_FILE: &str = "/tmp/gamdl_telegram_bot.lock";
const DEFAULT_TEMP_DIR_PREFIX: &str = "gamdl_";
const DEFAULT_TEMP_TTL_HOURS: f64 = 24.0;

/// Where the worker keeps its download log, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatabaseTarget {
    /// No database configured; the worker runs without one.
    None,
    /// A server URL, already normalized.
    Url {
        #[serde(serialize_with = "serialize_redacted")]
        url: String,
    },
    /// A local SQLite file.
    Sqlite { path: PathBuf },
}

/// Configuration consumed by the bootstrap sequence.
///
/// Read once at startup and never mutated afterwards.
#[derive(Clone, Serialize)]
pub struct RuntimeConfig {
    /// Telegram bot token. Never serialized.
    #[serde(skip)]
    pub bot_token: String,

    /// Path of the cookies file handed to the downloader.
    pub cookies_path: PathBuf,

    /// Root directory for downloads and scratch directories.
    pub output_root: PathBuf,

    /// Host-level single-instance lock used by the worker.
    pub lock_file: PathBuf,

    /// Database the worker logs to.
    pub database: DatabaseTarget,

    /// Name prefix of the worker's scratch directories.
    pub temp_dir_prefix: String,

    /// Age after which a scratch directory counts as stale.
    #[serde(serialize_with = "serialize_hours")]
    pub temp_ttl: Duration,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("bot_token", &if self.has_token() { "<redacted>" } else { "<empty>" })
            .field("cookies_path", &self.cookies_path)
            .field("output_root", &self.output_root)
            .field("lock_file", &self.lock_file)
            .field("database", &self.database)
            .field("temp_dir_prefix", &self.temp_dir_prefix)
            .field("temp_ttl", &self.temp_ttl)
            .finish()
    }
}

fn serialize_hours<S: serde::Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(ttl.as_secs_f64() / 3600.0)
}

impl RuntimeConfig {
    /// Creates configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable lookup.
    ///
    /// Empty or blank values count as unset, the way `${VAR:-default}` does.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path_or = |key: &str, default: &str| {
            get(key).map_or_else(|| PathBuf::from(default), |v| PathBuf::from(v.trim()))
        };

        let database = if let Some(url) = get(DATABASE_URL_VAR) {
            DatabaseTarget::Url {
                url: normalize_database_url(url.trim()),
            }
        } else if let Some(path) = get("BOT_DB_PATH") {
            DatabaseTarget::Sqlite {
                path: PathBuf::from(path.trim()),
            }
        } else {
            DatabaseTarget::None
        };

        Self {
            bot_token: get(TOKEN_VAR).unwrap_or_default(),
            cookies_path: path_or(COOKIES_PATH_VAR, DEFAULT_COOKIES_PATH),
            output_root: path_or(OUTPUT_ROOT_VAR, DEFAULT_OUTPUT_ROOT),
            lock_file: path_or("LOCK_FILE", DEFAULT_LOCK_FILE),
            database,
            temp_dir_prefix: get("TEMP_DIR_PREFIX")
                .unwrap_or_else(|| DEFAULT_TEMP_DIR_PREFIX.to_owned()),
            temp_ttl: get("TEMP_TTL_HOURS").map_or_else(default_ttl, |raw| parse_ttl_hours(&raw)),
        }
    }

    /// Returns true if a usable bot token is configured.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.bot_token.trim().is_empty()
    }

    /// Returns the database URL the worker should see, if any.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseTarget::Url { url } => Some(url.as_str()),
            _ => None,
        }
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs_f64(DEFAULT_TEMP_TTL_HOURS * 3600.0)
}

fn parse_ttl_hours(raw: &str) -> Duration {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|hours| Duration::try_from_secs_f64(hours * 3600.0).ok());

    parsed.unwrap_or_else(|| {
        warn!(
            "TEMP_TTL_HOURS={:?} is not a non-negative number; using {}h",
            raw, DEFAULT_TEMP_TTL_HOURS
        );
        default_ttl()
    })
}

fn serialize_redacted<S: serde::Serializer>(url: &str, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&redact_database_url(url))
}

/// Hides the password in a database URL for display.
#[must_use]
pub fn redact_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_owned();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_owned(),
    }
}

/// Rewrites the legacy `postgres://` scheme to `postgresql://`.
#[must_use]
pub fn normalize_database_url(url: &str) -> String {
    url.strip_prefix("postgres://")
        .map_or_else(|| url.to_owned(), |rest| format!("postgresql://{rest}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> RuntimeConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RuntimeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(!config.has_token());
        assert_eq!(
            config.cookies_path,
            PathBuf::from("/app/telegram_bot/secrets/cookies.txt")
        );
        assert_eq!(config.output_root, PathBuf::from("/data/downloads"));
        assert_eq!(config.lock_file, PathBuf::from("/tmp/gamdl_telegram_bot.lock"));
        assert_eq!(config.database, DatabaseTarget::None);
        assert_eq!(config.temp_dir_prefix, "gamdl_");
        assert_eq!(config.temp_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = config_from(&[("OUTPUT_ROOT", ""), ("COOKIES_PATH", "")]);
        assert_eq!(config.output_root, PathBuf::from("/data/downloads"));
        assert_eq!(
            config.cookies_path,
            PathBuf::from("/app/telegram_bot/secrets/cookies.txt")
        );
    }

    #[test]
    fn test_whitespace_token_is_missing() {
        assert!(!config_from(&[("TELEGRAM_BOT_TOKEN", "   ")]).has_token());
        assert!(config_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).has_token());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("COOKIES_PATH", "/secrets/c.txt"),
            ("OUTPUT_ROOT", "/srv/out"),
            ("TEMP_DIR_PREFIX", "tmp_"),
            ("TEMP_TTL_HOURS", "1.5"),
        ]);
        assert_eq!(config.cookies_path, PathBuf::from("/secrets/c.txt"));
        assert_eq!(config.output_root, PathBuf::from("/srv/out"));
        assert_eq!(config.temp_dir_prefix, "tmp_");
        assert_eq!(config.temp_ttl, Duration::from_secs(5400));
    }

    #[test]
    fn test_invalid_ttl_falls_back() {
        let config = config_from(&[("TEMP_TTL_HOURS", "soon")]);
        assert_eq!(config.temp_ttl, Duration::from_secs(24 * 3600));

        let config = config_from(&[("TEMP_TTL_HOURS", "-2")]);
        assert_eq!(config.temp_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_database_url_wins_over_sqlite_path() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://u:p@db/bot"),
            ("BOT_DB_PATH", "/data/bot.db"),
        ]);
        assert_eq!(config.database_url(), Some("postgresql://u:p@db/bot"));
    }

    #[test]
    fn test_sqlite_path() {
        let config = config_from(&[("BOT_DB_PATH", "/data/db/bot.sqlite")]);
        assert_eq!(
            config.database,
            DatabaseTarget::Sqlite {
                path: PathBuf::from("/data/db/bot.sqlite")
            }
        );
        assert_eq!(config.database_url(), None);
    }

    #[test]
    fn test_normalize_database_url() {
        assert_eq!(normalize_database_url("postgres://h/db"), "postgresql://h/db");
        assert_eq!(normalize_database_url("postgresql://h/db"), "postgresql://h/db");
        assert_eq!(normalize_database_url("sqlite:///x.db"), "sqlite:///x.db");
    }

    #[test]
    fn test_blank_database_url_falls_back_to_sqlite() {
        let config = config_from(&[
            ("DATABASE_URL", "   "),
            ("BOT_DB_PATH", "/data/db/bot.sqlite"),
        ]);
        assert_eq!(
            config.database,
            DatabaseTarget::Sqlite {
                path: PathBuf::from("/data/db/bot.sqlite")
            }
        );
        assert_eq!(config.database_url(), None);

        let config = config_from(&[("DATABASE_URL", " \t ")]);
        assert_eq!(config.database, DatabaseTarget::None);
    }

    #[test]
    fn test_blank_paths_use_defaults() {
        let config = config_from(&[
            ("OUTPUT_ROOT", "  "),
            ("COOKIES_PATH", "\t"),
            ("LOCK_FILE", " "),
        ]);
        assert_eq!(config.output_root, PathBuf::from("/data/downloads"));
        assert_eq!(
            config.cookies_path,
            PathBuf::from("/app/telegram_bot/secrets/cookies.txt")
        );
        assert_eq!(config.lock_file, PathBuf::from("/tmp/gamdl_telegram_bot.lock"));

        let config = config_from(&[("OUTPUT_ROOT", " /srv/out ")]);
        assert_eq!(config.output_root, PathBuf::from("/srv/out"));
    }

    #[test]
    fn test_redact_database_url() {
        assert_eq!(
            redact_database_url("postgresql://bot:hunter2@db:5432/bot"),
            "postgresql://bot:***@db:5432/bot"
        );
        assert_eq!(redact_database_url("postgresql://db/bot"), "postgresql://db/bot");
        assert_eq!(redact_database_url("postgresql://bot@db/bot"), "postgresql://bot@db/bot");
    }

    #[test]
    fn test_serialized_database_url_is_redacted() {
        let config = config_from(&[("DATABASE_URL", "postgres://bot:hunter2@db/bot")]);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("postgresql://bot:***@db/bot"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[("TELEGRAM_BOT_TOKEN", "123:tok-xyzzy")]);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("tok-xyzzy"));
        assert!(rendered.contains("<redacted>"));
    }
}
