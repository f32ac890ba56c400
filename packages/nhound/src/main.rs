//! Console entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nhound::config::Config;
use nhound::email::{Mailer, SmtpMailer};
use nhound::hound::{build_cohort, HoundError};
use nhound::utils::{check_if_latest_version, join_with_oxford_commas, VersionCheck};
use notion_client::NotionClient;

const EXIT_CODE_SUCCESS: u8 = 0;
const EXIT_CODE_OPERATION_FAILED: u8 = 1;
const EXIT_CODE_NOTION_API_FAILED: u8 = 2;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Notset,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Notset => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

/// Nags Notion users about pages they have left to go stale.
#[derive(Debug, Parser)]
#[command(name = "nhound", version)]
struct Cli {
    /// Logging level. This affects the file logs as well.
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Which .env file to load.
    #[arg(short, long, default_value = ".env")]
    env: PathBuf,

    /// Print the logs to stdout.
    #[arg(long)]
    verbose: bool,
}

enum RunError {
    Config(anyhow::Error),
    Workspace(HoundError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let start = Utc::now();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{} {e:#}", "Failed to set up logging:".red());
        return ExitCode::from(EXIT_CODE_OPERATION_FAILED);
    }

    println!("{}", "Notion Hound bot".blue().bold());

    version_check().await;

    let code = match run(&cli).await {
        Ok(clean) => {
            if clean {
                println!("{}", "Operation was successful.".green());
            } else {
                println!("{}", "Operation might have failed.".yellow());
            }
            EXIT_CODE_SUCCESS
        }
        Err(RunError::Config(e)) => {
            tracing::error!(error = %e, "Configuration failure");
            println!("{} {e:#}", "Operation failed:".red());
            EXIT_CODE_OPERATION_FAILED
        }
        Err(RunError::Workspace(e)) => {
            tracing::error!(error = %e, "Notion API failure");
            println!("{} {e}", "Operation failed:".red());
            EXIT_CODE_NOTION_API_FAILED
        }
    };

    let duration = Utc::now() - start;
    tracing::info!(duration_secs = duration.num_seconds(), "That's all folks!");
    ExitCode::from(code)
}

async fn run(cli: &Cli) -> Result<bool, RunError> {
    load_env(cli).map_err(RunError::Config)?;

    let config = Config::from_env().map_err(RunError::Config)?;

    let mailer = SmtpMailer::new(&config.smtp).map_err(RunError::Config)?;
    if config.smtp.username.is_none() {
        tracing::warn!("Using unauthenticated SMTP. Probably testing…");
    }

    let client = NotionClient::new(config.notion_token.clone());
    let now = Utc::now();

    let cohort = build_cohort(&client, &config.root_page_ids, now, config.stale_after_weeks)
        .await
        .map_err(RunError::Workspace)?;

    cohort.print_report();

    let mut clean = true;
    let mut notified: Vec<String> = Vec::new();
    for (user, pages) in cohort.stale_pages_by_user() {
        let receivers = vec![user.email().to_string()];
        if mailer.send(&receivers, user.name(), &pages).await {
            notified.push(user.name().to_string());
        } else {
            clean = false;
        }
    }
    if notified.is_empty() {
        tracing::info!("No users with stale pages this run");
    } else {
        println!("Notified {}.", join_with_oxford_commas(notified));
    }
    Ok(clean)
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter()));
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("nhound.log")
        .context("failed to open nhound.log")?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::sync::Arc::new(file));
    let stdout_layer = cli
        .verbose
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
    Ok(())
}

fn load_env(cli: &Cli) -> anyhow::Result<()> {
    match dotenvy::from_path(&cli.env) {
        Ok(()) => {
            tracing::debug!(path = %cli.env.display(), "Loaded environment file");
            Ok(())
        }
        Err(e) if cli.env == PathBuf::from(".env") => {
            tracing::debug!(error = %e, "No .env file loaded");
            Ok(())
        }
        Err(e) => Err(e).context(format!("failed to load {}", cli.env.display())),
    }
}

async fn version_check() {
    match check_if_latest_version().await {
        VersionCheck::Latest => {
            let version = env!("CARGO_PKG_VERSION");
            println!("{}", format!("This is the latest version {version}.").blue());
        }
        VersionCheck::Lagging => {
            println!(
                "{}",
                "There is a new version available: please update.".yellow()
            );
        }
        VersionCheck::Unknown => {
            println!("{}", "Could not check for newer versions.".yellow());
        }
    }
}
