//! Bearing RCFA - bearing failure root-cause analysis from photos
//!
//! A CLI tool that sends a bearing photo to a vision model with an expert
//! prompt and turns the reply into a structured failure report.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

/// Crates whose logs `-v` turns up to debug
const VERBOSE_FILTER: &str = "warn,rcfa_types=debug,rcfa_vision=debug,rcfa_app=debug,bearing_rcfa=debug";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
