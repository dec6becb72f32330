//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Browser settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Browser engine driven by Playwright
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserEngine {
    /// Name of the Playwright browser type export
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chromium => "chromium",
            BrowserEngine::Firefox => "firefox",
            BrowserEngine::Webkit => "webkit",
        }
    }
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Bound for each element action attempt (visibility wait, click, fill)
    #[serde(default = "default_action")]
    pub action_ms: u64,

    /// How long a text assertion keeps retrying before failing
    #[serde(default = "default_assertion")]
    pub assertion_ms: u64,

    /// Bound for page navigation
    #[serde(default = "default_navigation")]
    pub navigation_ms: u64,
}

impl Timeouts {
    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: default_action(),
            assertion_ms: default_assertion(),
            navigation_ms: default_navigation(),
        }
    }
}

fn default_action() -> u64 {
    2_000
}
fn default_assertion() -> u64 {
    5_000
}
fn default_navigation() -> u64 {
    30_000
}

/// Browser configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// Browser engine to launch
    #[serde(default)]
    pub engine: BrowserEngine,

    /// Run without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Node.js executable (name on PATH or absolute path)
    #[serde(default = "default_node")]
    pub node: PathBuf,

    /// Directory containing the `playwright` package.
    /// Defaults to `./node_modules` in the working directory.
    #[serde(default)]
    pub node_modules: Option<PathBuf>,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::default(),
            headless: default_headless(),
            node: default_node(),
            node_modules: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

fn default_headless() -> bool {
    true
}
fn default_node() -> PathBuf {
    PathBuf::from("node")
}
fn default_viewport_width() -> u32 {
    1280
}
fn default_viewport_height() -> u32 {
    720
}

/// Scenario runner configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Directory holding saved scenario files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum number of scenarios running at once
    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            parallel: default_parallel(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("tests").join("data")
}
fn default_parallel() -> usize {
    4
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        if config.runner.parallel == 0 {
            return Err(super::Error::Config(
                "[runner] parallel must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Resolve the Node.js executable
    ///
    /// Absolute paths are used as-is, bare names are searched on PATH
    pub fn node_executable(&self) -> Result<PathBuf> {
        let node = &self.browser.node;
        if node.is_absolute() {
            if node.exists() {
                return Ok(node.clone());
            }
            return Err(super::Error::NodeNotFound(node.display().to_string()));
        }
        which::which(node).map_err(|_| super::Error::NodeNotFound(node.display().to_string()))
    }

    /// Resolve the `node_modules` directory the driver loads Playwright from
    pub fn node_modules_dir(&self) -> PathBuf {
        let dir = self
            .browser
            .node_modules
            .clone()
            .unwrap_or_else(|| PathBuf::from("node_modules"));
        if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&dir))
                .unwrap_or(dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.timeouts.action_ms, 2_000);
        assert_eq!(config.timeouts.assertion_ms, 5_000);
        assert_eq!(config.browser.engine, BrowserEngine::Chromium);
        assert!(config.browser.headless);
        assert_eq!(config.runner.parallel, 4);
        assert_eq!(config.runner.data_dir, PathBuf::from("tests").join("data"));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
[timeouts]
action_ms = 500

[browser]
engine = "firefox"
headless = false

[runner]
data_dir = "scenarios"
"#,
        )
        .unwrap();

        assert_eq!(config.timeouts.action(), Duration::from_millis(500));
        assert_eq!(config.timeouts.navigation_ms, 30_000);
        assert_eq!(config.browser.engine, BrowserEngine::Firefox);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport_width, 1280);
        assert_eq!(config.runner.data_dir, PathBuf::from("scenarios"));
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let err = Config::parse("[runner]\nparallel = 0\n").unwrap_err();
        assert!(err.to_string().contains("parallel"));
    }

    #[test]
    fn test_unknown_engine_rejected() {
        assert!(Config::parse("[browser]\nengine = \"netscape\"\n").is_err());
    }
}
