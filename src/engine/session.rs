//! Browser automation capability interface
//!
//! The executor only orchestrates calls into a [`BrowserSession`]; any
//! automation layer that offers these operations can drive scenarios.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::locator::SelectionExpression;

/// Interval between polls of a retrying text assertion
const ASSERT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Failure reported by the automation layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no element matches '{selector}'")]
    NotFound { selector: String },

    #[error("element '{selector}' is not actionable: {reason}")]
    NotActionable { selector: String, reason: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("expected text '{expected}', found '{actual}'")]
    TextMismatch { expected: String, actual: String },

    #[error("browser driver exited unexpectedly")]
    Disconnected,

    #[error("driver protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Fault(String),
}

impl SessionError {
    /// Whether this failure means "the element could not be found or used",
    /// as opposed to the session itself being broken
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            SessionError::NotFound { .. }
                | SessionError::NotActionable { .. }
                | SessionError::Timeout { .. }
        )
    }

    pub fn timeout(operation: &str, after: Duration) -> Self {
        SessionError::Timeout {
            operation: operation.to_string(),
            timeout_ms: after.as_millis() as u64,
        }
    }
}

/// Lazily-resolved reference to a page element.
/// Creating one does no I/O; resolution happens inside each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    selection: SelectionExpression,
}

impl ElementHandle {
    pub fn new(selection: SelectionExpression) -> Self {
        Self { selection }
    }

    pub fn selection(&self) -> &SelectionExpression {
        &self.selection
    }

    /// Ordered selectors to try for this element
    pub fn selectors(&self) -> Vec<String> {
        self.selection.selectors()
    }
}

/// Collapse runs of whitespace and trim, the way rendered text is compared
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One live browser page, owned by a single scenario
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to an absolute URL
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Create a handle for a selection expression
    fn locate(&self, selection: &SelectionExpression) -> ElementHandle {
        ElementHandle::new(selection.clone())
    }

    async fn click(&mut self, element: &ElementHandle, timeout: Duration)
        -> Result<(), SessionError>;

    async fn fill(
        &mut self,
        element: &ElementHandle,
        value: &str,
        timeout: Duration,
    ) -> Result<(), SessionError>;

    async fn wait_visible(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> Result<(), SessionError>;

    /// Text content of the element
    async fn text(&mut self, element: &ElementHandle, timeout: Duration)
        -> Result<String, SessionError>;

    /// Assert the element text equals `expected`, retrying until `timeout`
    ///
    /// Whitespace is collapsed on both sides before comparing.
    async fn assert_text_equals(
        &mut self,
        element: &ElementHandle,
        expected: &str,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let wanted = normalize_whitespace(expected);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let outcome = self.text(element, remaining.max(ASSERT_POLL_INTERVAL)).await;

            let last = match outcome {
                Ok(actual) if normalize_whitespace(&actual) == wanted => return Ok(()),
                Ok(actual) => SessionError::TextMismatch {
                    expected: expected.to_string(),
                    actual: normalize_whitespace(&actual),
                },
                Err(e) if e.is_resolution_failure() => e,
                Err(e) => return Err(e),
            };

            if tokio::time::Instant::now() + ASSERT_POLL_INTERVAL > deadline {
                return Err(last);
            }
            tokio::time::sleep(ASSERT_POLL_INTERVAL).await;
        }
    }

    /// Pause for a fixed duration
    async fn wait_ms(&mut self, duration: Duration) -> Result<(), SessionError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Release the page and browser
    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Opens one independent session per scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, scenario_title: &str) -> Result<Box<dyn BrowserSession>, SessionError>;
}
