//! Step failure types

use thiserror::Error;

use crate::scenario::ActionKind;

use super::session::SessionError;

/// Why a step failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    /// The locator could not be resolved or the action on it timed out,
    /// and there was no backup locator
    #[error("locator '{locator}' failed: {source}")]
    Resolution {
        locator: String,
        #[source]
        source: SessionError,
    },

    /// Primary and backup locators both failed
    #[error(
        "both primary ('{primary}') and backup ('{backup}') locators failed: \
         primary: {primary_error}; backup: {backup_error}"
    )]
    HealingExhausted {
        primary: String,
        backup: String,
        primary_error: SessionError,
        #[source]
        backup_error: SessionError,
    },

    /// The element text did not match; never healed
    #[error("text assertion on '{locator}' failed: {source}")]
    Assertion {
        locator: String,
        expected: String,
        #[source]
        source: SessionError,
    },

    /// The automation session itself failed
    #[error("browser session fault: {0}")]
    Fault(#[source] SessionError),
}

/// A terminal step failure, tagged with the step that produced it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step '{step_name}' [{action}] failed: {failure}")]
pub struct ExecutionError {
    pub step_name: String,
    pub action: ActionKind,
    #[source]
    pub failure: StepFailure,
}

impl ExecutionError {
    pub fn new(step_name: &str, action: ActionKind, failure: StepFailure) -> Self {
        Self {
            step_name: step_name.to_string(),
            action,
            failure,
        }
    }

    /// Short machine-readable category for reports
    pub fn category(&self) -> &'static str {
        match self.failure {
            StepFailure::Resolution { .. } => "resolution_failure",
            StepFailure::HealingExhausted { .. } => "healing_exhausted",
            StepFailure::Assertion { .. } => "assertion_failure",
            StepFailure::Fault(_) => "execution_fault",
        }
    }
}
