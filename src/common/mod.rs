//! Common utilities shared by the CLI, the engine and the runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

use std::sync::OnceLock;

use regex::Regex;

pub use error::{Error, Result};

/// Remove terminal control sequences (`ESC [ ... <letter>`) from text.
/// Used when relaying run transcripts to something that is not a terminal.
pub fn strip_ansi(text: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[A-Za-z]").expect("valid regex"));
    re.replace_all(text, "").into_owned()
}
