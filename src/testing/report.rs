//! Run reports
//!
//! A [`SuiteReport`] is produced by the runner and rendered either as a
//! colored transcript or as JSON.

use colored::Colorize;
use serde::Serialize;

use crate::engine::{EventKind, ExecutionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// Rejected by the loader; never executed
    Invalid,
}

/// Outcome of one scenario file
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: ScenarioStatus,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Failure category, see `ExecutionError::category`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Validation reasons for invalid scenarios
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    /// Healing, skipped waits and the failing step
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ExecutionEvent>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn invalid(file: String, reasons: Vec<String>) -> Self {
        Self {
            file,
            title: None,
            status: ScenarioStatus::Invalid,
            steps_run: 0,
            steps_total: 0,
            error_kind: None,
            error: None,
            reasons,
            events: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Failure that happened outside step execution
    pub fn aborted(file: String, title: Option<String>, steps_total: usize, error: String) -> Self {
        Self {
            file,
            title,
            status: ScenarioStatus::Failed,
            steps_run: 0,
            steps_total,
            error_kind: Some("execution_fault".to_string()),
            error: Some(error),
            reasons: Vec::new(),
            events: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Steps that passed thanks to their backup locator
    pub fn healed(&self) -> impl Iterator<Item = &ExecutionEvent> {
        self.events.iter().filter(|e| e.kind == EventKind::Healed)
    }

    fn name(&self) -> String {
        match &self.title {
            Some(title) => format!("{} ({})", title, self.file),
            None => self.file.clone(),
        }
    }
}

/// Outcome of a run, scenarios in file-name order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|s| s.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    pub fn invalid(&self) -> usize {
        self.count(ScenarioStatus::Invalid)
    }

    pub fn healed(&self) -> usize {
        self.scenarios.iter().map(|s| s.healed().count()).sum()
    }

    /// Invalid scenario files count against the run
    pub fn success(&self) -> bool {
        self.failed() == 0 && self.invalid() == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Colored transcript
    pub fn render(&self) -> String {
        let mut out = String::new();

        for scenario in &self.scenarios {
            match scenario.status {
                ScenarioStatus::Passed => {
                    out.push_str(&format!(
                        "  {} {} {}\n",
                        "✓".green(),
                        scenario.name().white().bold(),
                        format!(
                            "{}/{} steps, {}ms",
                            scenario.steps_run, scenario.steps_total, scenario.duration_ms
                        )
                        .dimmed()
                    ));
                }
                ScenarioStatus::Failed => {
                    out.push_str(&format!(
                        "  {} {} {}\n",
                        "✗".red(),
                        scenario.name().white().bold(),
                        format!(
                            "failed at step {}/{}",
                            scenario.steps_run, scenario.steps_total
                        )
                        .dimmed()
                    ));
                    if let Some(error) = &scenario.error {
                        out.push_str(&format!("      {}\n", error.red()));
                    }
                }
                ScenarioStatus::Invalid => {
                    out.push_str(&format!(
                        "  {} {} {}\n",
                        "-".yellow(),
                        scenario.name().white().bold(),
                        "invalid, not run".dimmed()
                    ));
                    for reason in &scenario.reasons {
                        out.push_str(&format!("      - {}\n", reason.yellow()));
                    }
                }
            }

            for event in &scenario.events {
                let line = match event.kind {
                    EventKind::Healed => format!(
                        "healed '{}': '{}' failed, used backup '{}'",
                        event.step_name,
                        event.primary.as_deref().unwrap_or(""),
                        event.backup.as_deref().unwrap_or("")
                    ),
                    EventKind::WaitSkipped => format!(
                        "skipped wait '{}': {}",
                        event.step_name,
                        event.detail.as_deref().unwrap_or("")
                    ),
                    _ => continue,
                };
                out.push_str(&format!("      {} {}\n", "⚠".yellow(), line.yellow()));
            }
        }

        let summary = format!(
            "{} passed, {} failed, {} invalid, {} healed",
            self.passed(),
            self.failed(),
            self.invalid(),
            self.healed()
        );
        if self.success() {
            out.push_str(&format!("\n{} {}\n", "✓".green().bold(), summary.green().bold()));
        } else {
            out.push_str(&format!("\n{} {}\n", "✗".red().bold(), summary.red().bold()));
        }

        out
    }
}
