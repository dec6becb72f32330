//! Authored test scenarios
//!
//! Data model, validation and on-disk storage for scenario files.

pub mod model;
pub mod schema;
pub mod store;

pub use model::{
    file_name_for, ActionKind, ScenarioFile, StepAction, StepRecord, Target, TestCase, TestStep,
    TextExpectation, WaitFor,
};
pub use schema::{parse, validate, ValidationError};
pub use store::{LoadError, LoadedScenario, ScenarioStore};
