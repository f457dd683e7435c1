//! Pouch - container management CLI
//!
//! This is the main CLI entry point for Pouch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pouch::client::DaemonClient;
use pouch::commands::run_create;
use pouch::config::{ClientConfig, ConfigOverrides};
use pouch::container::flags::{CreateFlags, CREATE_DESCRIPTION, CREATE_EXAMPLE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Pouch - container management client
#[derive(Parser)]
#[command(name = "pouch")]
#[command(version)]
#[command(about = "Client for a Pouch-compatible container daemon", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'D', long, global = true)]
    debug: bool,

    /// Daemon address (unix://, tcp://, http:// or https://)
    #[arg(short = 'H', long, env = "POUCH_HOST", global = true)]
    host: Option<String>,

    /// Seconds to wait for the daemon to reply
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Client config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new container with specified image
    #[command(
        long_about = CREATE_DESCRIPTION,
        after_help = CREATE_EXAMPLE,
        override_usage = "pouch create [OPTIONS] IMAGE [ARG...]"
    )]
    Create {
        #[command(flatten)]
        flags: CreateFlags,

        /// Image to create from, then the command and its arguments
        #[arg(value_name = "IMAGE", trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::load(cli.config.as_deref())
        .context("failed to load client config")?
        .apply(ConfigOverrides {
            host: cli.host.clone(),
            timeout_secs: cli.timeout,
            debug: cli.debug,
        });
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Create { flags, args } => {
            let client = DaemonClient::from_config(&config)?;
            let mut stdout = std::io::stdout().lock();
            run_create(&client, &flags, &args, &mut stdout).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pouch: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.debug);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pouch: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
