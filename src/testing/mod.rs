//! Scenario runner
//!
//! Runs loaded scenarios in isolated browser sessions and reports the
//! outcome of each one.

mod report;
mod runner;

pub use report::{ScenarioReport, ScenarioStatus, SuiteReport};
pub use runner::{filter_by_title, run_scenarios, title_matches, RunOptions};
