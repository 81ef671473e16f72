//! cup-fly - fly client automation for concourse-up
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use cup_fly::cli::{Cli, Commands};
use cup_fly::config::ConfigManager;
use cup_fly::error::CupResult;
use std::process::ExitCode;
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

async fn run() -> CupResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("cup_fly=warn"),
        1 => EnvFilter::new("cup_fly=info"),
        _ => EnvFilter::new("cup_fly=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Cache commands don't need config loading
    let command = match cli.command {
        Commands::Cache(args) => return cup_fly::cli::commands::cache(args).await,
        command => command,
    };

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    match command {
        Commands::Cache(_) => unreachable!("Cache handled above"),
        Commands::SetPipeline(args) => cup_fly::cli::commands::set_pipeline(args, &config).await,
        Commands::Login => cup_fly::cli::commands::login(&config).await,
        Commands::Render(args) => cup_fly::cli::commands::render(args, &config).await,
    }
}
