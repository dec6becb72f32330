//! Scenario runner
//!
//! Runs loaded scenarios against sessions from a [`SessionFactory`]. Each
//! scenario gets its own task, browser session and event recorder; at most
//! `parallel` scenarios run at once. A failure ends its own scenario only.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::common::config::Timeouts;
use crate::engine::{EventKind, Executor, RecordingSink, SessionFactory, TracingSink};
use crate::scenario::{LoadedScenario, TestCase};

use super::report::{ScenarioReport, ScenarioStatus, SuiteReport};

/// Runner settings for one invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Case-insensitive substring of the scenario title
    pub grep: Option<String>,
    /// Maximum concurrent scenarios (at least 1)
    pub parallel: usize,
    pub timeouts: Timeouts,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            grep: None,
            parallel: 4,
            timeouts: Timeouts::default(),
        }
    }
}

/// Whether a scenario's title contains `pattern`, ignoring case
///
/// Invalid scenarios have no title and are matched on their file name.
pub fn title_matches(scenario: &LoadedScenario, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let haystack = match scenario.title() {
        Some(title) => title.to_lowercase(),
        None => scenario.file_name().to_lowercase(),
    };
    haystack.contains(&pattern)
}

/// Keep scenarios matching `pattern`; no pattern or an empty one keeps all
pub fn filter_by_title(loaded: Vec<LoadedScenario>, pattern: Option<&str>) -> Vec<LoadedScenario> {
    match pattern.filter(|p| !p.is_empty()) {
        Some(pattern) => loaded
            .into_iter()
            .filter(|scenario| title_matches(scenario, pattern))
            .collect(),
        None => loaded,
    }
}

/// Run scenarios and collect a report in input order
pub async fn run_scenarios(
    loaded: Vec<LoadedScenario>,
    factory: Arc<dyn SessionFactory>,
    options: &RunOptions,
) -> SuiteReport {
    let loaded = filter_by_title(loaded, options.grep.as_deref());
    let semaphore = Arc::new(Semaphore::new(options.parallel.max(1)));

    let mut slots: Vec<Option<ScenarioReport>> = Vec::with_capacity(loaded.len());
    let mut pending = Vec::new();
    let mut tasks = JoinSet::new();

    for (index, scenario) in loaded.into_iter().enumerate() {
        let file = scenario.file_name();
        match scenario.result {
            Err(e) => slots.push(Some(ScenarioReport::invalid(file, e.reasons()))),
            Ok(case) => {
                slots.push(None);
                pending.push((index, file.clone(), case.title.clone(), case.steps.len()));

                let factory = factory.clone();
                let semaphore = semaphore.clone();
                let timeouts = options.timeouts.clone();
                tasks.spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    (index, run_case(file, case, factory, timeouts).await)
                });
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => slots[index] = Some(report),
            Err(e) => tracing::error!(error = %e, "Scenario task failed"),
        }
    }

    let scenarios = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                let (_, file, title, steps) = pending
                    .iter()
                    .find(|(i, ..)| *i == index)
                    .cloned()
                    .unwrap_or_default();
                ScenarioReport::aborted(file, Some(title), steps, "scenario task panicked".to_string())
            })
        })
        .collect();

    SuiteReport { scenarios }
}

/// Run one test case in its own browser session
async fn run_case(
    file: String,
    case: TestCase,
    factory: Arc<dyn SessionFactory>,
    timeouts: Timeouts,
) -> ScenarioReport {
    let started = Instant::now();
    let steps_total = case.steps.len();

    let mut session = match factory.open(&case.title).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(scenario = %case.title, error = %e, "Could not open browser session");
            return ScenarioReport::aborted(
                file,
                Some(case.title),
                steps_total,
                format!("could not open browser session: {}", e),
            );
        }
    };

    let recorder = RecordingSink::new();
    let outcome = {
        let sink = (&recorder, TracingSink);
        Executor::new(&sink, timeouts)
            .run_case(session.as_mut(), &case)
            .await
    };

    if let Err(e) = session.close().await {
        tracing::warn!(scenario = %case.title, error = %e, "Failed to close browser session");
    }

    let events = recorder
        .events()
        .into_iter()
        .filter(|e| {
            matches!(
                e.kind,
                EventKind::Healed | EventKind::HealingExhausted | EventKind::WaitSkipped | EventKind::StepFailed
            )
        })
        .collect();

    let duration_ms = started.elapsed().as_millis() as u64;
    let status = if outcome.passed() {
        ScenarioStatus::Passed
    } else {
        ScenarioStatus::Failed
    };

    tracing::info!(
        scenario = %case.title,
        passed = outcome.passed(),
        healed = outcome.healed.len(),
        duration_ms,
        "Scenario finished"
    );

    ScenarioReport {
        file,
        title: Some(case.title),
        status,
        steps_run: outcome.steps_run,
        steps_total: outcome.steps_total,
        error_kind: outcome.error.as_ref().map(|e| e.category().to_string()),
        error: outcome.error.as_ref().map(|e| e.to_string()),
        reasons: Vec::new(),
        events,
        duration_ms,
    }
}
