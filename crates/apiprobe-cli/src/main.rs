//! # apiprobe CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apiprobe_cli::check::{run_check, CheckArgs};
use apiprobe_cli::probe::{run_probe, ProbeArgs};

/// Check live API responses against the response schemas of an OpenAPI document.
#[derive(Parser, Debug)]
#[command(name = "apiprobe", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in, call the operation once and validate the live response.
    Probe(ProbeArgs),

    /// Validate a response saved to disk.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let result = match cli.command {
        Commands::Probe(args) => run_probe(&args),
        Commands::Check(args) => run_check(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
