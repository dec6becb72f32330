//! Playwright-backed browser session

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::common::config::Config;
use crate::common::Result;
use crate::engine::{BrowserSession, ElementHandle, SessionError, SessionFactory};

use super::client::BridgeClient;
use super::protocol::{Operation, Viewport};

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

/// One browser page behind a driver process
pub struct PlaywrightSession {
    client: BridgeClient,
    closed: bool,
}

impl PlaywrightSession {
    /// Start a driver and launch a browser with a fresh context and page
    pub async fn launch(config: &Config, headless: bool) -> Result<Self> {
        let node = config.node_executable()?;
        let node_modules = config.node_modules_dir();
        if !node_modules.join("playwright").exists() {
            tracing::warn!(
                dir = %node_modules.display(),
                "playwright package not found; run `npm install playwright` there"
            );
        }

        let mut client = BridgeClient::spawn(&node, &node_modules).await?;
        client
            .request(Operation::Launch {
                browser: config.browser.engine.as_str().to_string(),
                headless,
                viewport: Viewport {
                    width: config.browser.viewport_width,
                    height: config.browser.viewport_height,
                },
            })
            .await?;

        tracing::info!(
            browser = config.browser.engine.as_str(),
            headless,
            "Browser launched"
        );

        Ok(Self {
            client,
            closed: false,
        })
    }

    async fn element_op(&mut self, op: Operation) -> std::result::Result<Value, SessionError> {
        if self.closed {
            return Err(SessionError::Fault("session is closed".to_string()));
        }
        self.client.request(op).await
    }
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> std::result::Result<(), SessionError> {
        self.element_op(Operation::Goto {
            url: url.to_string(),
            timeout_ms: millis(timeout),
        })
        .await
        .map(|_| ())
    }

    async fn click(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> std::result::Result<(), SessionError> {
        self.element_op(Operation::Click {
            selectors: element.selectors(),
            timeout_ms: millis(timeout),
        })
        .await
        .map(|_| ())
    }

    async fn fill(
        &mut self,
        element: &ElementHandle,
        value: &str,
        timeout: Duration,
    ) -> std::result::Result<(), SessionError> {
        self.element_op(Operation::Fill {
            selectors: element.selectors(),
            value: value.to_string(),
            timeout_ms: millis(timeout),
        })
        .await
        .map(|_| ())
    }

    async fn wait_visible(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> std::result::Result<(), SessionError> {
        self.element_op(Operation::WaitVisible {
            selectors: element.selectors(),
            timeout_ms: millis(timeout),
        })
        .await
        .map(|_| ())
    }

    async fn text(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> std::result::Result<String, SessionError> {
        let value = self
            .element_op(Operation::TextContent {
                selectors: element.selectors(),
                timeout_ms: millis(timeout),
            })
            .await?;

        match value {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(SessionError::Protocol(format!(
                "textContent returned {}",
                other
            ))),
        }
    }

    async fn close(&mut self) -> std::result::Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client.shutdown().await
    }
}

/// Opens a [`PlaywrightSession`] per scenario
pub struct PlaywrightLauncher {
    config: Config,
    headless: bool,
}

impl PlaywrightLauncher {
    /// `headed` overrides the configured `browser.headless` setting
    pub fn new(config: Config, headed: bool) -> Self {
        let headless = config.browser.headless && !headed;
        Self { config, headless }
    }

    /// Where the driver will look for Playwright
    pub fn node_modules_dir(&self) -> PathBuf {
        self.config.node_modules_dir()
    }
}

#[async_trait]
impl SessionFactory for PlaywrightLauncher {
    async fn open(
        &self,
        scenario_title: &str,
    ) -> std::result::Result<Box<dyn BrowserSession>, SessionError> {
        tracing::debug!(scenario = %scenario_title, "Opening browser session");
        let session = PlaywrightSession::launch(&self.config, self.headless)
            .await
            .map_err(|e| match e {
                crate::common::Error::Session(inner) => inner,
                other => SessionError::Fault(other.to_string()),
            })?;
        Ok(Box::new(session))
    }
}
