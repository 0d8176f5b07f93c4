mod cli;
mod config;
mod git;
mod github;
mod model;
mod repository;
mod versions;

use std::{io, process};

use tracing_subscriber::EnvFilter;

use config::Config;

fn main() {
    init_logging();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Log to stderr so stdout stays clean for listings.
///
/// Filtered by `GH_PR_VERSIONS_LOG`, e.g. `GH_PR_VERSIONS_LOG=debug`.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("GH_PR_VERSIONS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
