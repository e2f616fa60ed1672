//! Weles CLI - command-line front-end for the weles model governance base.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dataset upload` | Upload a CSV file as a dataset |
//! | `dataset get` / `head` / `info` | Inspect an uploaded dataset |
//! | `model upload` | Upload a model with its training data and requirements |
//! | `model predict` | Run a hosted model on a dataset |
//! | `model info` / `requirements` | Inspect a hosted model |
//! | `model search` | Search the registry |
//! | `model audit` | Audit a model on new data |
//! | `user create` | Register a new user |

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weles_sdk::{ClientConfig, RegistryClient};

use commands::credentials::PromptCredentials;

/// Weles CLI - share, run and audit models through a weles server
#[derive(Parser)]
#[command(name = "weles", version)]
#[command(about = "Weles CLI - share, run and audit models through a weles server", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, env = "WELES_URL")]
    url: Option<String>,

    /// Directory for temporary upload files
    #[arg(long, global = true, env = "WELES_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, global = true, env = "WELES_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// User name (prompted for when missing)
    #[arg(long, global = true, env = "WELES_USER")]
    user: Option<String>,

    /// Password (prompted for when missing)
    #[arg(long, global = true, env = "WELES_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload and inspect datasets
    Dataset {
        #[command(subcommand)]
        command: commands::datasets::DatasetCommand,
    },
    /// Upload, run, search and audit models
    Model {
        #[command(subcommand)]
        command: commands::models::ModelCommand,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: commands::users::UserCommand,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    if let Err(e) = init_logging() {
        eprintln!("{} Logging disabled: {}", "⚠".yellow(), e);
    }

    let cli = Cli::parse();
    run_command(cli)
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
fn init_logging() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init()
}

fn run_command(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env().context("Invalid environment configuration")?;
    if let Some(url) = cli.url {
        config = config.with_base_url(url);
    }
    if let Some(dir) = cli.work_dir {
        config = config.with_work_dir(dir);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout_ms(ms);
    }
    log::debug!("Using server {}", config.base_url);

    let client = RegistryClient::new(config).context("Failed to create weles client")?;
    let credentials = PromptCredentials::new(cli.user, cli.password);

    match cli.command {
        Commands::Dataset { command } => commands::datasets::run(&client, &credentials, command),
        Commands::Model { command } => commands::models::run(&client, &credentials, command),
        Commands::User { command } => commands::users::run(&client, &credentials, command),
    }
}
