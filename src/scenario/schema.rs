//! Scenario validation
//!
//! Turns raw scenario JSON into a [`TestCase`]. Every reason a scenario is
//! invalid is collected so the author can fix them all at once; a scenario
//! with any invalid step is rejected whole.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::model::{
    ActionKind, ScenarioFile, StepAction, StepRecord, Target, TestCase, TestStep,
    TextExpectation, WaitFor,
};

/// One reason a scenario failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Location in the document, e.g. `steps[2]` or `title`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All reasons a scenario was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    fn single(path: &str, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue {
                path: path.to_string(),
                message: message.into(),
            }],
        }
    }

    /// Reasons as display strings
    pub fn reasons(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level shape; steps are checked one by one afterwards
#[derive(Deserialize)]
struct RawScenario {
    title: String,
    steps: Vec<Value>,
}

/// Parse and validate scenario JSON text
pub fn parse(json: &str) -> Result<TestCase, ValidationError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ValidationError::single("$", format!("malformed JSON: {}", e)))?;
    validate(&value)
}

/// Validate a scenario document
pub fn validate(json: &Value) -> Result<TestCase, ValidationError> {
    let raw: RawScenario = serde_json::from_value(json.clone())
        .map_err(|e| ValidationError::single("$", e.to_string()))?;

    let mut issues = Vec::new();
    let mut steps = Vec::with_capacity(raw.steps.len());

    for (i, value) in raw.steps.into_iter().enumerate() {
        let path = format!("steps[{}]", i);
        match serde_json::from_value::<StepRecord>(value) {
            Ok(record) => match check_step(record) {
                Ok(step) => steps.push(step),
                Err(message) => issues.push(Issue { path, message }),
            },
            Err(e) => issues.push(Issue {
                path,
                message: e.to_string(),
            }),
        }
    }

    if !issues.is_empty() {
        return Err(ValidationError { issues });
    }

    Ok(TestCase {
        title: raw.title,
        steps,
    })
}

/// Validate an already-deserialized scenario file
pub fn validate_file(file: &ScenarioFile) -> Result<TestCase, ValidationError> {
    let value = serde_json::to_value(file)
        .map_err(|e| ValidationError::single("$", e.to_string()))?;
    validate(&value)
}

/// Check field presence for one step and build its typed action
fn check_step(record: StepRecord) -> Result<TestStep, String> {
    let locator = present(record.locator);
    let alt_locator = present(record.alt_locator);
    let value = present(record.value);
    let name = record.step_name;

    let action = match record.action {
        ActionKind::Goto => StepAction::Goto {
            url: value.ok_or_else(|| format!("'{}': goto requires a value (URL)", name))?,
        },
        ActionKind::Click => StepAction::Click {
            target: Target {
                primary: locator
                    .ok_or_else(|| format!("'{}': click requires a locator", name))?,
                backup: alt_locator,
            },
        },
        ActionKind::Fill => match (locator, value) {
            (Some(primary), Some(value)) => StepAction::Fill {
                target: Target {
                    primary,
                    backup: alt_locator,
                },
                value,
            },
            _ => return Err(format!("'{}': fill requires a locator and a value", name)),
        },
        ActionKind::AssertText => StepAction::AssertText(match (locator, value) {
            (Some(locator), Some(expected)) => Some(TextExpectation { locator, expected }),
            _ => None,
        }),
        ActionKind::Wait => {
            if value.is_none() && locator.is_none() {
                return Err(format!("'{}': wait requires a value or a locator", name));
            }
            match value.as_deref().and_then(parse_millis) {
                Some(duration) => StepAction::Wait(WaitFor::Duration(duration)),
                None => StepAction::Wait(WaitFor::Unresolved { value, locator }),
            }
        }
    };

    Ok(TestStep { name, action })
}

/// Empty strings count as missing
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

/// Parse a millisecond count; fractions allowed, negatives and non-finite rejected.
/// Counts too large for a [`Duration`] are not numbers either.
pub fn parse_millis(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<u64>() {
        return Some(Duration::from_millis(ms));
    }
    let ms: f64 = value.parse().ok()?;
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(ms / 1000.0).ok()
}
