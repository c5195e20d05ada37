//! ScanBridge fixture loader.
//!
//! Creates the fixture namespaces and tables and loads the fixture rows into
//! the engine described by a configuration file.
//!
//! # Usage
//!
//! ```bash
//! scanbridge-loader /etc/scanbridge/engine.toml
//! scanbridge-loader -v ./engine.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use scanbridge_client::ConnectionRegistry;
use scanbridge_loader::load_fixtures;
use scanbridge_storage::MemoryConnector;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ScanBridge fixture loader
#[derive(Parser, Debug)]
#[command(
    name = "scanbridge-loader",
    author = "ScanBridge Team",
    version,
    about = "Loads test fixtures into a storage engine"
)]
struct Args {
    /// Engine configuration file
    #[arg(value_name = "CONFIG", env = "SCANBRIDGE_CONFIG")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => {
            info!("Test data loaded successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to load test data: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let registry = ConnectionRegistry::new(MemoryConnector::new());
    registry
        .initialize(&args.config)
        .with_context(|| format!("cannot connect using {}", args.config.display()))?;

    let result = load(&registry);
    registry.close();
    result
}

fn load(registry: &ConnectionRegistry) -> Result<()> {
    let connection = registry.connection()?;
    let summary = load_fixtures(connection.storage().as_ref(), connection.admin().as_ref())
        .context("loading fixtures failed")?;
    connection
        .storage()
        .flush()
        .context("flushing fixtures failed")?;
    info!(
        "{} tables created, {} truncated, {} rows written",
        summary.tables_created, summary.tables_truncated, summary.rows_written
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("scanbridge_loader=debug,scanbridge_client=debug,scanbridge_storage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
