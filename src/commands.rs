//! CLI command definitions
//!
//! Defines the clap commands for the stepwright CLI.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::locator::ActionHint;

#[derive(Subcommand)]
pub enum Commands {
    /// Run saved scenarios
    Run {
        /// Only run scenarios whose title contains this text (case-insensitive)
        #[arg(long, short)]
        grep: Option<String>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Scenario directory (default: [runner] data_dir)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Maximum number of scenarios running at once
        #[arg(long, short)]
        parallel: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Strip colors from the transcript
        #[arg(long)]
        plain: bool,
    },

    /// Validate and save a scenario file, `-` reads stdin
    Save {
        /// Scenario JSON file
        file: PathBuf,

        /// Scenario directory (default: [runner] data_dir)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Run the scenario right after saving it
        #[arg(long)]
        run: bool,

        /// Show the browser window when running
        #[arg(long)]
        headed: bool,
    },

    /// Check every saved scenario file
    Validate {
        /// Scenario directory (default: [runner] data_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List saved scenarios
    #[command(alias = "ls")]
    List {
        /// Scenario directory (default: [runner] data_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show what a locator resolves to
    Normalize {
        /// Locator as written in a scenario
        locator: String,

        /// Action the locator is used for
        #[arg(long, value_enum, default_value = "click")]
        action: ActionArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Click,
    Fill,
    Assert,
}

impl From<ActionArg> for ActionHint {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Click => ActionHint::Click,
            ActionArg::Fill => ActionHint::Fill,
            ActionArg::Assert => ActionHint::Assert,
        }
    }
}
