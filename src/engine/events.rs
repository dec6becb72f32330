//! Execution events
//!
//! The executor reports what it does (and especially every self-healing
//! fallback) to an [`EventSink`] handed to it, instead of printing. A healed
//! step passes, but its authored locator has likely gone stale, so the event
//! has to reach the author.

use parking_lot::Mutex;
use serde::Serialize;

use crate::scenario::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StepStarted,
    StepPassed,
    StepFailed,
    /// Primary locator failed, trying the backup
    HealingAttempt,
    /// Backup locator succeeded after the primary failed
    Healed,
    /// Both locators failed
    HealingExhausted,
    /// `wait` step without a numeric duration; nothing was done
    WaitSkipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionEvent {
    pub kind: EventKind,
    pub step_name: String,
    pub action: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExecutionEvent {
    pub fn new(kind: EventKind, step_name: &str, action: ActionKind) -> Self {
        Self {
            kind,
            step_name: step_name.to_string(),
            action,
            primary: None,
            backup: None,
            detail: None,
        }
    }

    pub fn with_locators(mut self, primary: &str, backup: Option<&str>) -> Self {
        self.primary = Some(primary.to_string());
        self.backup = backup.map(String::from);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Healing attempts and their outcomes
    pub fn is_healing(&self) -> bool {
        matches!(
            self.kind,
            EventKind::HealingAttempt | EventKind::Healed | EventKind::HealingExhausted
        )
    }
}

/// Receives execution events
pub trait EventSink: Send + Sync {
    fn record(&self, event: ExecutionEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: ExecutionEvent) {
        let primary = event.primary.as_deref().unwrap_or("");
        let backup = event.backup.as_deref().unwrap_or("");
        let detail = event.detail.as_deref().unwrap_or("");
        match event.kind {
            EventKind::StepStarted => {
                tracing::debug!(step = %event.step_name, action = %event.action, "Step started")
            }
            EventKind::StepPassed => {
                tracing::debug!(step = %event.step_name, action = %event.action, "Step passed")
            }
            EventKind::StepFailed => tracing::error!(
                step = %event.step_name,
                action = %event.action,
                error = %detail,
                "Step failed"
            ),
            EventKind::HealingAttempt => tracing::warn!(
                step = %event.step_name,
                primary = %primary,
                backup = %backup,
                error = %detail,
                "Primary locator failed, trying backup"
            ),
            EventKind::Healed => tracing::warn!(
                step = %event.step_name,
                primary = %primary,
                backup = %backup,
                "Step saved by self-healing; update the primary locator"
            ),
            EventKind::HealingExhausted => tracing::error!(
                step = %event.step_name,
                primary = %primary,
                backup = %backup,
                "Primary and backup locators both failed"
            ),
            EventKind::WaitSkipped => tracing::warn!(
                step = %event.step_name,
                detail = %detail,
                "Wait step has no numeric duration; skipped"
            ),
        }
    }
}

/// Keeps events in memory, one instance per scenario
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().clone()
    }

    pub fn healing_events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.is_healing())
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: ExecutionEvent) {
        self.events.lock().push(event);
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn record(&self, event: ExecutionEvent) {
        self.0.record(event.clone());
        self.1.record(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn record(&self, event: ExecutionEvent) {
        (**self).record(event);
    }
}
