//! stepwright - browser UI test step engine
//!
//! Loads recorded test scenarios, normalizes their human-friendly locators
//! and executes the steps against a browser session, retrying element
//! actions against a backup locator when the primary one no longer matches.

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod locator;
pub mod scenario;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
