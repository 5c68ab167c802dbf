//! Tessera - host CLI for the in-memory session token registry.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod config;

use commands::{config as config_cmd, simulate};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Tessera - in-memory session token registry
#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./tessera.toml, then the user config dir)
    #[arg(long, global = true, env = "TESSERA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue sessions against a registry and report what happened
    Simulate(simulate::SimulateArgs),

    /// Configuration inspection
    Config(config_cmd::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config::load_config(cli.config.as_deref()).context("failed to load config")?;

    init_tracing(&loaded.config.logging, cli.verbose);

    match &loaded.source {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded config"),
        None => tracing::debug!("No config file found, using defaults"),
    }

    let ctx = commands::Context {
        config: loaded,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Simulate(args) => simulate::run(args, &ctx),
        Commands::Config(args) => config_cmd::run(args, &ctx),
    }
}

/// Console logging to stderr; `RUST_LOG` overrides the configured filter.
fn init_tracing(logging: &config::LoggingConfig, verbose: bool) {
    let default_filter = if verbose {
        "tessera=debug,tessera_session=debug,info"
    } else {
        "tessera=info,tessera_session=info,warn"
    };
    let directives = logging.filter.as_deref().unwrap_or(default_filter);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.json {
        tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .init();
    }
}
