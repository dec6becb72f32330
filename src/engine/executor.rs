//! Step executor
//!
//! Executes validated steps against a [`BrowserSession`], one at a time and
//! in order. `click` and `fill` go through [`Executor::heal`]: when the
//! primary locator cannot be resolved and the step has a backup locator, the
//! action is retried once against the backup.

use std::future::Future;
use std::time::Duration;

use tracing::Instrument;

use crate::common::config::Timeouts;
use crate::locator::{normalize, ActionHint};
use crate::scenario::{StepAction, Target, TestCase, TestStep, TextExpectation, WaitFor};

use super::error::{ExecutionError, StepFailure};
use super::events::{EventKind, EventSink, ExecutionEvent};
use super::session::{BrowserSession, SessionError};

/// Slack on top of an operation's own timeout before the executor gives up
/// on the session answering at all
const TIMEOUT_GRACE: Duration = Duration::from_millis(500);

/// How a step finished when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    /// Passed using the backup locator
    Healed { primary: String, backup: String },
    /// Nothing to do (documented no-op)
    Skipped { reason: String },
}

/// Result of running a whole test case
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub steps_total: usize,
    /// Steps attempted, including the failing one
    pub steps_run: usize,
    /// Steps that passed only thanks to their backup locator
    pub healed: Vec<String>,
    pub error: Option<ExecutionError>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Element action run inside the healing wrapper
#[derive(Debug, Clone, Copy)]
enum TargetAction<'v> {
    Click,
    Fill(&'v str),
}

impl TargetAction<'_> {
    fn hint(&self) -> ActionHint {
        match self {
            TargetAction::Click => ActionHint::Click,
            TargetAction::Fill(_) => ActionHint::Fill,
        }
    }
}

/// Executes steps and reports events to a sink
pub struct Executor<'a> {
    sink: &'a dyn EventSink,
    timeouts: Timeouts,
}

impl<'a> Executor<'a> {
    pub fn new(sink: &'a dyn EventSink, timeouts: Timeouts) -> Self {
        Self { sink, timeouts }
    }

    /// Run every step of a test case in order, stopping at the first failure
    pub async fn run_case<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        case: &TestCase,
    ) -> CaseOutcome {
        let steps_total = case.steps.len();
        let mut healed = Vec::new();

        tracing::info!(title = %case.title, steps = steps_total, "Executing scenario");

        for (i, step) in case.steps.iter().enumerate() {
            match self.execute(session, step).await {
                Ok(StepOutcome::Healed { .. }) => healed.push(step.name.clone()),
                Ok(_) => {}
                Err(error) => {
                    return CaseOutcome {
                        steps_total,
                        steps_run: i + 1,
                        healed,
                        error: Some(error),
                    };
                }
            }
        }

        CaseOutcome {
            steps_total,
            steps_run: steps_total,
            healed,
            error: None,
        }
    }

    /// Execute one step inside a `step` tracing span
    pub async fn execute<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        step: &TestStep,
    ) -> Result<StepOutcome, ExecutionError> {
        let span = tracing::info_span!("step", name = %step.name, action = %step.kind());
        self.execute_step(session, step).instrument(span).await
    }

    async fn execute_step<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        step: &TestStep,
    ) -> Result<StepOutcome, ExecutionError> {
        self.emit(step, EventKind::StepStarted);

        let result = match &step.action {
            StepAction::Goto { url } => self.goto(session, url).await,
            StepAction::Click { target } => self.heal(session, step, target, TargetAction::Click).await,
            StepAction::Fill { target, value } => {
                self.heal(session, step, target, TargetAction::Fill(value)).await
            }
            StepAction::AssertText(Some(expectation)) => {
                self.assert_text(session, expectation).await
            }
            StepAction::AssertText(None) => Ok(StepOutcome::Skipped {
                reason: "assertText needs both a locator and a value".to_string(),
            }),
            StepAction::Wait(WaitFor::Duration(duration)) => session
                .wait_ms(*duration)
                .await
                .map(|_| StepOutcome::Passed)
                .map_err(StepFailure::Fault),
            StepAction::Wait(WaitFor::Unresolved { value, locator }) => {
                let detail = match (value, locator) {
                    (Some(v), _) => format!("value '{}' is not a number of milliseconds", v),
                    (None, Some(l)) => format!("only a locator ('{}') was given", l),
                    (None, None) => "no value".to_string(),
                };
                self.sink.record(
                    ExecutionEvent::new(EventKind::WaitSkipped, &step.name, step.kind())
                        .with_detail(detail.clone()),
                );
                Ok(StepOutcome::Skipped { reason: detail })
            }
        };

        match result {
            Ok(outcome) => {
                if let StepOutcome::Skipped { reason } = &outcome {
                    tracing::debug!(reason = %reason, "Step skipped");
                }
                self.emit(step, EventKind::StepPassed);
                Ok(outcome)
            }
            Err(failure) => {
                let error = ExecutionError::new(&step.name, step.kind(), failure);
                self.sink.record(
                    ExecutionEvent::new(EventKind::StepFailed, &step.name, step.kind())
                        .with_detail(error.failure.to_string()),
                );
                Err(error)
            }
        }
    }

    async fn goto<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        url: &str,
    ) -> Result<StepOutcome, StepFailure> {
        let url = with_scheme(url);
        let timeout = self.timeouts.navigation();
        tracing::debug!(url = %url, "Navigating");

        bounded("navigation", timeout, session.navigate(&url, timeout))
            .await
            .map(|_| StepOutcome::Passed)
            .map_err(StepFailure::Fault)
    }

    async fn assert_text<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        expectation: &TextExpectation,
    ) -> Result<StepOutcome, StepFailure> {
        let selection = normalize(&expectation.locator, ActionHint::Assert);
        let element = session.locate(&selection);
        let timeout = self.timeouts.assertion();

        match bounded(
            "text assertion",
            timeout,
            session.assert_text_equals(&element, &expectation.expected, timeout),
        )
        .await
        {
            Ok(()) => Ok(StepOutcome::Passed),
            Err(e) if e.is_resolution_failure() || matches!(e, SessionError::TextMismatch { .. }) => {
                Err(StepFailure::Assertion {
                    locator: expectation.locator.clone(),
                    expected: expectation.expected.clone(),
                    source: e,
                })
            }
            Err(e) => Err(StepFailure::Fault(e)),
        }
    }

    /// Self-healing wrapper: primary locator first, backup once on failure
    async fn heal<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        step: &TestStep,
        target: &Target,
        action: TargetAction<'_>,
    ) -> Result<StepOutcome, StepFailure> {
        let primary_error = match self.attempt(session, &target.primary, action).await {
            Ok(()) => return Ok(StepOutcome::Passed),
            Err(e) if !e.is_resolution_failure() => return Err(StepFailure::Fault(e)),
            Err(e) => e,
        };

        let Some(backup) = target.backup.as_deref() else {
            return Err(StepFailure::Resolution {
                locator: target.primary.clone(),
                source: primary_error,
            });
        };

        self.sink.record(
            ExecutionEvent::new(EventKind::HealingAttempt, &step.name, step.kind())
                .with_locators(&target.primary, Some(backup))
                .with_detail(primary_error.to_string()),
        );

        match self.attempt(session, backup, action).await {
            Ok(()) => {
                self.sink.record(
                    ExecutionEvent::new(EventKind::Healed, &step.name, step.kind())
                        .with_locators(&target.primary, Some(backup)),
                );
                Ok(StepOutcome::Healed {
                    primary: target.primary.clone(),
                    backup: backup.to_string(),
                })
            }
            Err(e) if !e.is_resolution_failure() => Err(StepFailure::Fault(e)),
            Err(backup_error) => {
                self.sink.record(
                    ExecutionEvent::new(EventKind::HealingExhausted, &step.name, step.kind())
                        .with_locators(&target.primary, Some(backup))
                        .with_detail(backup_error.to_string()),
                );
                Err(StepFailure::HealingExhausted {
                    primary: target.primary.clone(),
                    backup: backup.to_string(),
                    primary_error,
                    backup_error,
                })
            }
        }
    }

    /// One attempt of an element action against one locator
    async fn attempt<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        locator: &str,
        action: TargetAction<'_>,
    ) -> Result<(), SessionError> {
        let selection = normalize(locator, action.hint());
        tracing::debug!(locator = %locator, selection = %selection, "Resolved locator");

        let element = session.locate(&selection);
        let timeout = self.timeouts.action();

        match action {
            TargetAction::Click => bounded("click", timeout, session.click(&element, timeout)).await,
            TargetAction::Fill(value) => {
                bounded("wait for visible", timeout, session.wait_visible(&element, timeout))
                    .await?;
                bounded("fill", timeout, session.fill(&element, value, timeout)).await
            }
        }
    }

    fn emit(&self, step: &TestStep, kind: EventKind) {
        self.sink.record(ExecutionEvent::new(kind, &step.name, step.kind()));
    }
}

/// Guard a session call with its timeout plus grace
async fn bounded<F>(operation: &str, timeout: Duration, call: F) -> Result<(), SessionError>
where
    F: Future<Output = Result<(), SessionError>>,
{
    match tokio::time::timeout(timeout + TIMEOUT_GRACE, call).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::timeout(operation, timeout)),
    }
}

/// Prefix `https://` unless the URL already names a scheme
pub fn with_scheme(url: &str) -> String {
    let url = url.trim();
    if has_scheme(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn has_scheme(url: &str) -> bool {
    if url.starts_with("about:") || url.starts_with("data:") {
        return true;
    }
    match url.find("://") {
        Some(i) if i > 0 => {
            let scheme = &url[..i];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_scheme() {
        assert_eq!(with_scheme("example.com"), "https://example.com");
        assert_eq!(with_scheme("http://localhost:3000"), "http://localhost:3000");
        assert_eq!(with_scheme("https://example.com/a"), "https://example.com/a");
        assert_eq!(with_scheme("localhost:3000/login"), "https://localhost:3000/login");
        assert_eq!(with_scheme("file:///tmp/page.html"), "file:///tmp/page.html");
        assert_eq!(with_scheme("about:blank"), "about:blank");
        assert_eq!(with_scheme("example.com/?next=http://x"), "https://example.com/?next=http://x");
    }
}
