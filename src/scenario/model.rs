//! Scenario data types
//!
//! Two layers: the persisted records exactly as authored (`ScenarioFile`,
//! `StepRecord`), and the validated form the engine executes (`TestCase`,
//! `TestStep`, `StepAction`). Only `schema::validate` builds the latter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A scenario file as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioFile {
    /// Scenario title, also the source of the file name
    pub title: String,
    /// Steps in execution order
    pub steps: Vec<StepRecord>,
}

/// One persisted step with optional fields, as the authoring surface writes it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step_name: String,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The closed set of step actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Goto,
    Click,
    Fill,
    AssertText,
    Wait,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Goto => "goto",
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::AssertText => "assertText",
            ActionKind::Wait => "wait",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated scenario, ready to execute once
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub title: String,
    pub steps: Vec<TestStep>,
}

/// A validated step
#[derive(Debug, Clone, PartialEq)]
pub struct TestStep {
    /// Label for logs and reports; not unique
    pub name: String,
    pub action: StepAction,
}

/// Primary locator plus optional backup used for self-healing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub primary: String,
    pub backup: Option<String>,
}

/// Element text expected by an `assertText` step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExpectation {
    pub locator: String,
    pub expected: String,
}

/// What a `wait` step waits for
#[derive(Debug, Clone, PartialEq)]
pub enum WaitFor {
    /// Fixed pause
    Duration(Duration),
    /// No numeric value: executes as a no-op
    Unresolved {
        value: Option<String>,
        locator: Option<String>,
    },
}

/// Step action carrying exactly the fields it needs
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Goto { url: String },
    Click { target: Target },
    Fill { target: Target, value: String },
    /// `None` when the locator or expected text was left out
    AssertText(Option<TextExpectation>),
    Wait(WaitFor),
}

impl StepAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            StepAction::Goto { .. } => ActionKind::Goto,
            StepAction::Click { .. } => ActionKind::Click,
            StepAction::Fill { .. } => ActionKind::Fill,
            StepAction::AssertText(_) => ActionKind::AssertText,
            StepAction::Wait(_) => ActionKind::Wait,
        }
    }
}

impl TestStep {
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }
}

/// Filesystem-safe file name for a scenario title
///
/// Lowercases the title and replaces everything outside `[a-z0-9]` with `-`.
/// Non-ASCII characters produce one `-` per UTF-16 code unit so names match
/// files written by the browser-based authoring tool.
pub fn file_name_for(title: &str) -> String {
    let mut slug = String::with_capacity(title.len() + 5);
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else {
            for _ in 0..c.len_utf16() {
                slug.push('-');
            }
        }
    }
    slug.push_str(".json");
    slug
}
