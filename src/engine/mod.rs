//! Step execution engine
//!
//! Runs validated scenario steps against a browser session, resolving
//! locators through [`crate::locator`] and falling back to backup locators
//! when the primary one no longer matches.

pub mod error;
pub mod events;
pub mod executor;
pub mod session;

pub use error::{ExecutionError, StepFailure};
pub use events::{EventKind, EventSink, ExecutionEvent, RecordingSink, TracingSink};
pub use executor::{CaseOutcome, Executor, StepOutcome};
pub use session::{BrowserSession, ElementHandle, SessionError, SessionFactory};
