//! Standalone preflight checker for the bot container.
//!
//! Reports what `gamdl_bootstrap` would find and do at startup without
//! creating directories or starting the worker.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use gamdl_bootstrap::bootstrap::{self, CredentialStatus, DirStatus, PreflightReport};
use gamdl_bootstrap::config::{
    self, DATABASE_URL_VAR, DEFAULT_ENV_FILE, DatabaseTarget, RuntimeConfig, redact_database_url,
};
use gamdl_bootstrap::handoff::WorkerCommand;
use gamdl_bootstrap::logging::init_logging;

/// Container preflight checker.
#[derive(Parser, Debug)]
#[command(name = "bootstrap_check")]
#[command(about = "Checks the gamdl bot container environment without starting the bot")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: String,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let env_file = config::load_env_file(&args.env_file);

    init_logging("warn");

    match env_file {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("Could not load .env file ({}): {}", args.env_file, e),
    }

    let config = RuntimeConfig::from_env();
    let report = bootstrap::inspect(&config);

    if args.json {
        print_json(&config, &report)
    } else {
        print_human(&config, &report)
    }
}

fn exit_code(report: &PreflightReport) -> ExitCode {
    if report.fatal().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json(config: &RuntimeConfig, report: &PreflightReport) -> ExitCode {
    let worker_env: serde_json::Map<String, serde_json::Value> = WorkerCommand::bot_module()
        .with_config(config)
        .get_env()
        .iter()
        .map(|(k, v)| {
            let key = k.to_string_lossy().into_owned();
            let value = v.to_string_lossy();
            let value = if key == DATABASE_URL_VAR {
                redact_database_url(&value)
            } else {
                value.into_owned()
            };
            (key, serde_json::Value::String(value))
        })
        .collect();

    let output = serde_json::json!({
        "config": config,
        "report": report,
        "worker_env": worker_env,
        "ok": report.fatal().is_none(),
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => {
            println!("{text}");
            exit_code(report)
        }
        Err(e) => {
            eprintln!("✗ Failed to serialize report: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_human(config: &RuntimeConfig, report: &PreflightReport) -> ExitCode {
    println!("Checking gamdl bot environment\n");

    if report.token_present {
        println!("✓ TELEGRAM_BOT_TOKEN is set");
    } else {
        println!("✗ TELEGRAM_BOT_TOKEN is not set");
    }

    match report.credential {
        CredentialStatus::Present => {
            println!("✓ Cookies file: {}", report.credential_path.display());
        }
        CredentialStatus::Missing => println!(
            "⚠ Cookies file not found: {} (downloads may fail)",
            report.credential_path.display()
        ),
    }

    println!("\nDirectories:");
    for entry in &report.layout {
        let state = match &entry.status {
            DirStatus::Existing => "exists".to_owned(),
            DirStatus::Created => "created".to_owned(),
            DirStatus::Missing => "will be created".to_owned(),
            DirStatus::Failed { error } => format!("failed: {error}"),
        };
        println!(
            "  {:<12} {} ({state})",
            format!("{:?}", entry.dir.role),
            entry.dir.path.display()
        );
    }

    println!("\nDatabase:");
    match &report.database {
        DatabaseTarget::None => println!("  none (worker runs without a database)"),
        DatabaseTarget::Url { url } => println!("  {}", redact_database_url(url)),
        DatabaseTarget::Sqlite { path } => println!("  sqlite at {}", path.display()),
    }

    println!(
        "\nStale scratch sweep: prefix {:?}, ttl {:.1}h",
        config.temp_dir_prefix,
        config.temp_ttl.as_secs_f64() / 3600.0
    );

    println!();
    if report.fatal().is_none() {
        println!("✓ Ready to start the worker");
    } else {
        println!("✗ The worker would not be started");
    }

    exit_code(report)
}
