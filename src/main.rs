//! gamdl Bootstrap - Main Entry Point
//!
//! Validates the container environment and hands control to the gamdl
//! Telegram bot worker.

use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use gamdl_bootstrap::bootstrap::{self, SweepReport};
use gamdl_bootstrap::config::{self, DEFAULT_ENV_FILE, RuntimeConfig};
use gamdl_bootstrap::handoff::{self, HandoffError, HandoffMode, WorkerCommand};
use gamdl_bootstrap::logging::init_logging;

/// Container startup supervisor for the gamdl Telegram bot.
#[derive(Parser, Debug)]
#[command(name = "gamdl_bootstrap")]
#[command(about = "Validate the environment and start the gamdl Telegram bot")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: String,

    /// Log level (trace, debug, info, warn, error). Defaults to `LOG_LEVEL` or info.
    #[arg(short, long)]
    log_level: Option<String>,

    /// How to start the worker.
    #[arg(long, value_enum, default_value_t)]
    handoff: HandoffMode,

    /// Remove stale scratch directories under the output root before starting.
    #[arg(long)]
    sweep_stale: bool,

    /// Worker command line (defaults to `python -m telegram_bot.bot`).
    #[arg(last = true)]
    worker: Vec<OsString>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let env_file = config::load_env_file(&args.env_file);

    let level = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok().filter(|l| !l.is_empty()))
        .unwrap_or_else(|| "info".to_owned());
    init_logging(&level);

    match env_file {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("Could not load .env file ({}): {}", args.env_file, e),
    }

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(e.downcast_ref::<HandoffError>().map_or(1, HandoffError::exit_code))
        }
    }
}

async fn run(args: Args) -> Result<u8> {
    let config = RuntimeConfig::from_env();
    debug!("Runtime configuration: {:?}", config);

    bootstrap::prepare(&config).context("Startup checks failed")?;

    if args.sweep_stale {
        sweep(&config);
    }

    let worker = WorkerCommand::from_argv(args.worker).with_config(&config);
    info!("Starting worker ({:?}): {}", args.handoff, worker.display());

    let code = handoff::hand_off(&worker, args.handoff)
        .await
        .context("Worker handoff failed")?;
    Ok(code)
}

fn sweep(config: &RuntimeConfig) {
    match bootstrap::sweep_stale_dirs(&config.output_root, &config.temp_dir_prefix, config.temp_ttl)
    {
        Ok(SweepReport { removed: 0, errors: 0 }) => debug!("No stale scratch directories"),
        Ok(SweepReport { removed, errors }) => {
            info!("Startup cleanup: removed={} errors={}", removed, errors);
        }
        Err(e) => warn!(
            "Could not scan {} for stale scratch directories: {}",
            config.output_root.display(),
            e
        ),
    }
}
