//! badge-deployer
//!
//! Deploys the badge contracts and runs the end-to-end badge scenario.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI (main.rs) ── config (file, .env, env) ── logging
//!        │
//!        ▼
//!   cli.rs ── deploy ──┐        ┌── scenario (e2e)
//!                      ▼        ▼
//!                 deploy: setup → contracts → wiring → barrier
//!                      │
//!        ┌─────────────┼──────────────┐
//!        ▼             ▼              ▼
//!   chain::TxQueue   resilience::poll  worker queries
//!        │             │              │
//!        └──────── ChainApi / WorkerApi / ContractQuerier
//!                      │
//!        LiveChain + PruntimeClient + ContractChannel   or   devnet (--devnet)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use badge_deployer::observability::logging;
use badge_deployer::cli::Target;
use badge_deployer::{cli, config, DeployConfig, Result};

#[derive(Parser)]
#[command(name = "badge-deployer")]
#[command(about = "Deploy and exercise the Phala badge contracts", long_about = None)]
struct Cli {
    /// TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level for this tool; `RUST_LOG` takes precedence.
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy, wire and verify the badge contracts
    Deploy {
        /// Deploy to an in-process devnet instead of the configured network
        #[arg(long)]
        devnet: bool,
    },
    /// Run the full badge scenario
    E2e {
        /// Run on a fresh in-process devnet instead of the configured network
        #[arg(long)]
        devnet: bool,
    },
    /// Show the live node head and worker sync state
    Status,
}

fn target(devnet: bool) -> Target {
    if devnet {
        Target::Devnet
    } else {
        Target::Live
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(cli.log_level.as_deref().unwrap_or("info"));
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    logging::init(
        cli.log_level
            .as_deref()
            .unwrap_or(&config.observability.log_level),
    );
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "badge-deployer starting");

    let outcome = tokio::select! {
        result = run(cli.command, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted");
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &DeployConfig) -> Result<()> {
    match command {
        Commands::Deploy { devnet } => {
            let report = cli::deploy(config, target(devnet)).await?;
            tracing::info!(
                connected_worker = %report.connected_worker,
                fat_badges = %report.contracts.fat_badges,
                easy_oracle = %report.contracts.easy_oracle,
                advanced_judger = %report.contracts.advanced_judger,
                "Deploy finished"
            );
            Ok(())
        }
        Commands::E2e { devnet } => {
            let report = cli::e2e(config, target(devnet)).await?;
            tracing::info!(
                run_id = %report.run_id,
                connected_worker = %report.connected_worker,
                cluster = %report.cluster,
                fat_badges = %report.contracts.fat_badges,
                "E2E finished"
            );
            Ok(())
        }
        Commands::Status => cli::status(config).await,
    }
}
