//! @dose
//! purpose: This is the CLI entry point for doclit. It parses command-line arguments using clap,
//!     sets up logging, resolves the configuration and hands off to the generate command.
//!
//! when-editing:
//!     - !Logging goes to stderr; stdout carries the generated source
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - The process exits with 0 on success, 1 on any error
//!     - An explicit --config file must load; the implicit ./doclit.toml falls back to defaults
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules
//!     - Never panic - always use proper error handling
//!
//! gotchas:
//!     - RUST_LOG overrides the level chosen by --verbose

use anyhow::Context;
use clap::Parser;
use doclit::cli::Cli;
use doclit::commands::run_generate;
use doclit::config::Config;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.config {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let root = env::current_dir().context("Failed to get current directory")?;
            Config::load(&root)
        }
    };
    let config = cli.generate.merge_config(&config);

    run_generate(&cli.generate, &config)?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
