//! The worker command line and the environment it inherits.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use crate::config::{COOKIES_PATH_VAR, DATABASE_URL_VAR, OUTPUT_ROOT_VAR, RuntimeConfig};

/// Worker started when no command is given.
pub const DEFAULT_WORKER: &[&str] = &["python", "-m", "telegram_bot.bot"];

/// Program, arguments, and environment overrides for the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
}

impl WorkerCommand {
    /// Creates a command for a program with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Builds a command from an argv, falling back to the bot module when empty.
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        match argv.next() {
            Some(program) => Self::new(program).args(argv),
            None => Self::bot_module(),
        }
    }

    /// The default `python -m telegram_bot.bot` worker.
    #[must_use]
    pub fn bot_module() -> Self {
        Self::new(DEFAULT_WORKER[0]).args(DEFAULT_WORKER[1..].iter().copied())
    }

    /// Appends arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the worker, replacing earlier values.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.into()));
        self
    }

    /// Exports the validated configuration so the worker sees the same values.
    #[must_use]
    pub fn with_config(self, config: &RuntimeConfig) -> Self {
        let cmd = self
            .env(OUTPUT_ROOT_VAR, absolute(&config.output_root))
            .env(COOKIES_PATH_VAR, config.cookies_path.as_os_str());
        match config.database_url() {
            Some(url) => cmd.env(DATABASE_URL_VAR, url),
            None => cmd,
        }
    }

    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Environment overrides in insertion order.
    #[must_use]
    pub fn get_env(&self) -> &[(OsString, OsString)] {
        &self.env
    }

    /// Renders the command line for logs.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Converts to a standard library command.
    #[must_use]
    pub fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

/// Absolute form of the output root; falls back to the path as given.
fn absolute(path: &Path) -> OsString {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .into_os_string()
}
