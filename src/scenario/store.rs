//! Scenario files on disk
//!
//! One JSON file per scenario in a data directory, named after the title.
//! Loading is per file: one unreadable or invalid file never keeps the
//! others from loading.

use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

use crate::common::{Error, Result};

use super::model::{file_name_for, ScenarioFile, TestCase};
use super::schema::{self, ValidationError};

/// Why a single scenario file could not be loaded
#[derive(ThisError, Debug)]
pub enum LoadError {
    #[error("failed to read: {0}")]
    Read(#[source] std::io::Error),

    #[error("invalid scenario: {0}")]
    Invalid(#[source] ValidationError),
}

impl LoadError {
    /// Individual reasons, for reporting
    pub fn reasons(&self) -> Vec<String> {
        match self {
            LoadError::Read(e) => vec![format!("failed to read: {}", e)],
            LoadError::Invalid(e) => e.reasons(),
        }
    }
}

/// Outcome of loading one scenario file
#[derive(Debug)]
pub struct LoadedScenario {
    pub path: PathBuf,
    pub result: std::result::Result<TestCase, LoadError>,
}

impl LoadedScenario {
    /// File name without directory, for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Title if the scenario is valid
    pub fn title(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|c| c.title.as_str())
    }
}

/// Directory of scenario files
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    dir: PathBuf,
}

impl ScenarioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a scenario with this title is stored at
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(file_name_for(title))
    }

    /// Validate and write a scenario, replacing any file with the same name
    pub fn save(&self, scenario: &ScenarioFile) -> Result<PathBuf> {
        if let Err(e) = schema::validate_file(scenario) {
            return Err(Error::invalid_scenario(&scenario.title, &e.reasons()));
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| Error::file_write(&self.dir, e))?;

        let path = self.path_for(&scenario.title);
        let json = serde_json::to_string_pretty(scenario)?;
        std::fs::write(&path, json).map_err(|e| Error::file_write(&path, e))?;

        tracing::info!(title = %scenario.title, path = %path.display(), "Saved scenario");
        Ok(path)
    }

    /// Load and validate every `*.json` file, sorted by file name
    pub fn load_all(&self) -> Result<Vec<LoadedScenario>> {
        if !self.dir.exists() {
            tracing::warn!(
                dir = %self.dir.display(),
                "Data directory not found. Save a scenario first"
            );
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| Error::file_read(&self.dir, e))? {
            let path = entry?.path();
            if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths.into_iter().map(|path| Self::load_file(&path)).collect())
    }

    /// Load one scenario file
    pub fn load_file(path: &Path) -> LoadedScenario {
        let result = std::fs::read_to_string(path)
            .map_err(LoadError::Read)
            .and_then(|text| schema::parse(&text).map_err(LoadError::Invalid));

        if let Err(e) = &result {
            tracing::warn!(file = %path.display(), error = %e, "Skipping scenario");
        }

        LoadedScenario {
            path: path.to_path_buf(),
            result,
        }
    }
}
