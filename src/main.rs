//! stepwright - runs recorded browser UI scenarios with self-healing locators
//!
//! Scenarios are JSON files of simple steps (goto, click, fill, assertText,
//! wait) executed through Playwright.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use stepwright::common::{config::Config, logging};
use stepwright::{cli, commands};

#[derive(Parser)]
#[command(name = "stepwright", about = "Run browser UI test scenarios")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Also write logs to the default log file
    #[arg(long, global = true)]
    log: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| cli.log.then(logging::default_log_path).flatten());
    let _guard = logging::init_cli(cli.verbose, log_file.as_deref());

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        drop(_guard);
        std::process::exit(1);
    }
}
