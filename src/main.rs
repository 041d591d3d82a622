//! squish - sbt lockfile generator and offline cache reconstructor
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use squish::cli::{Cli, Commands};
use squish::config::{Config, ConfigManager};
use squish::error::SquishResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SquishResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using settings from {}", config_manager.path().display());

    match cli.command {
        Commands::Generate(args) => squish::cli::commands::generate(args, &config).await,
        Commands::Reconstruct(args) => squish::cli::commands::reconstruct(args, &config).await,
        Commands::Config(args) => {
            squish::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// Logging goes to stderr; stdout carries lockfile output
///
/// 0 = warn, 1 = info, 2+ = debug. `RUST_LOG` overrides the flags.
fn init_logging(verbose: u8, config: &Config) {
    let level = match (verbose, config.general.verbose) {
        (0, false) => "squish=warn",
        (0, true) | (1, _) => "squish=info",
        _ => "squish=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
