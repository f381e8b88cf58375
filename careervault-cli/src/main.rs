//! Main entry point for the CareerVault CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use client::{AppContext, telemetry};
use dotenv::dotenv;
use shared::config::ClientConfig;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

mod commands;

use commands::{config::ConfigFormat, jobs::JobsCommand, session::SessionCommand};

/// CareerVault CLI
#[derive(Parser)]
#[command(name = "careervault")]
#[command(about = "Track job applications from the command line", long_about = None)]
pub(crate) struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., careervault.yaml or careervault.json). If not provided, defaults and environment variables are used."
    )]
    config: Option<PathBuf>,

    /// Backend origin, overriding the configuration
    #[arg(
        long,
        global = true,
        help = "Backend origin, overriding the configuration (e.g., http://localhost:8000)"
    )]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the CareerVault CLI
#[derive(Subcommand)]
enum Commands {
    /// Manage the signed-in session
    #[command(subcommand)]
    Session(SessionCommand),

    /// Manage job applications
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Show application counts per status
    Stats {
        /// Ask the backend for its counts instead of computing them locally
        #[arg(long, help = "Ask the backend for its counts instead of computing them locally")]
        remote: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check that the backend is reachable
    Health,

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate. Defaults to yaml.
        #[arg(long, short, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,

        /// Where to write the file. Defaults to `careervault.<format>` in the current directory.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(long, short, value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Completion { shell } => commands::completion::generate_completion(shell),
        Commands::Config { format, output } => {
            commands::config::generate_config(format, output.as_deref())?;
        }
        command => {
            let config = ClientConfig::load_config(cli.config, cli.base_url)
                .context("failed to load configuration")?;
            if let Err(err) = telemetry::init_tracing(&config.log_level) {
                eprintln!("warning: logging is disabled: {err}");
            }
            debug!(base_url = %config.base_url, "configuration loaded");

            let context = AppContext::from_config(&config)?;
            run(&context, command).await?;
        }
    }

    Ok(())
}

async fn run(context: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Session(command) => commands::session::run(context, command).await,
        Commands::Jobs(command) => commands::jobs::run(context, command).await,
        Commands::Stats { remote, json } => commands::stats::show(context, remote, json).await,
        Commands::Health => commands::health(context).await,
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}
