//! CLI entry point for bnd-norm.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// bnd-norm — normalize a C API surface into binding descriptors.
#[derive(Parser, Debug)]
#[command(name = "bnd-norm", version, about)]
struct Cli {
    /// Path to the bnd-norm.toml configuration file.
    #[arg(default_value = "bnd-norm.toml")]
    config: PathBuf,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the filled overlay store here (overrides config).
    #[arg(long)]
    write_overlay: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bnd_norm=info")),
        )
        .init();

    let cli = Cli::parse();
    bnd_norm::run_with_overlay(
        &cli.config,
        cli.output.as_deref(),
        cli.write_overlay.as_deref(),
    )?;
    Ok(())
}
