//! In-memory page used by the integration tests
//!
//! Matches selection expressions structurally instead of running a browser:
//! raw `#id` and bare tag names, attribute selectors and every text
//! candidate kind. Candidates resolve like the Playwright driver: the first
//! candidate with any match wins, then the first matching element.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use stepwright::engine::{BrowserSession, ElementHandle, SessionError, SessionFactory};
use stepwright::locator::{Candidate, SelectionExpression};

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub visible: bool,
    pub value: String,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            text: String::new(),
            visible: true,
            value: String::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn matches_raw(&self, selector: &str) -> bool {
        match selector.strip_prefix('#') {
            Some(id) => self.get("id") == Some(id),
            None => self.tag == selector,
        }
    }

    fn matches_candidate(&self, candidate: &Candidate) -> bool {
        match candidate {
            Candidate::ButtonText(t) => self.tag == "button" && self.text.contains(t.as_str()),
            Candidate::LinkText(t) => self.tag == "a" && self.text.contains(t.as_str()),
            Candidate::InputValue(t) => {
                self.tag == "input"
                    && matches!(self.get("type"), Some("submit") | Some("button"))
                    && self.get("value") == Some(t.as_str())
            }
            Candidate::Text(t) => self.text.to_lowercase().contains(&t.to_lowercase()),
            Candidate::AttributeContains { attribute, text } => self
                .get(attribute.as_str())
                .map(|v| v.contains(text.as_str()))
                .unwrap_or(false),
        }
    }
}

/// Strip the quoting added by the normalizer
fn unquote(value: &str) -> String {
    let inner = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .unwrap_or(value);

    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Fake browser page
#[derive(Default)]
pub struct FakePage {
    pub elements: Vec<Element>,
    /// Operations performed, e.g. `click button#0`
    pub calls: Vec<String>,
    pub visited: Vec<String>,
    /// Returned by every operation when set
    pub fault: Option<SessionError>,
    /// Selectors whose element actions never answer
    pub hang_on: Vec<String>,
    pub locate_calls: AtomicUsize,
    pub closed: bool,
}

impl FakePage {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn failing_with(mut self, error: SessionError) -> Self {
        self.fault = Some(error);
        self
    }

    pub fn hanging_on(mut self, selector: &str) -> Self {
        self.hang_on.push(selector.to_string());
        self
    }

    /// Never returns when the element is one this page hangs on
    async fn maybe_hang(&self, element: &ElementHandle) {
        if element.selectors().iter().any(|s| self.hang_on.contains(s)) {
            std::future::pending::<()>().await;
        }
    }

    pub fn locate_count(&self) -> usize {
        self.locate_calls.load(Ordering::SeqCst)
    }

    pub fn value_of(&self, id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.get("id") == Some(id))
            .map(|e| e.value.as_str())
    }

    fn resolve(&self, element: &ElementHandle) -> Result<usize, SessionError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        let not_found = || SessionError::NotFound {
            selector: element.selection().to_string(),
        };

        match element.selection() {
            SelectionExpression::Raw(s) if s.is_empty() => Err(not_found()),
            SelectionExpression::Raw(s) => {
                self.elements.iter().position(|e| e.matches_raw(s)).ok_or_else(not_found)
            }
            SelectionExpression::Attribute { name, value } => {
                let value = unquote(value);
                self.elements
                    .iter()
                    .position(|e| e.get(name) == Some(value.as_str()))
                    .ok_or_else(not_found)
            }
            SelectionExpression::AnyOf(candidates) => candidates
                .iter()
                .find_map(|c| self.elements.iter().position(|e| e.matches_candidate(c)))
                .ok_or_else(not_found),
        }
    }

    fn label(&self, index: usize) -> String {
        format!("{}#{}", self.elements[index].tag, index)
    }
}

#[async_trait]
impl BrowserSession for FakePage {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), SessionError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        self.visited.push(url.to_string());
        Ok(())
    }

    fn locate(&self, selection: &SelectionExpression) -> ElementHandle {
        self.locate_calls.fetch_add(1, Ordering::SeqCst);
        ElementHandle::new(selection.clone())
    }

    async fn click(&mut self, element: &ElementHandle, _timeout: Duration) -> Result<(), SessionError> {
        self.maybe_hang(element).await;
        let index = self.resolve(element)?;
        if !self.elements[index].visible {
            return Err(SessionError::NotActionable {
                selector: element.selection().to_string(),
                reason: "element is not visible".to_string(),
            });
        }
        let call = format!("click {}", self.label(index));
        self.calls.push(call);
        Ok(())
    }

    async fn fill(
        &mut self,
        element: &ElementHandle,
        value: &str,
        _timeout: Duration,
    ) -> Result<(), SessionError> {
        self.maybe_hang(element).await;
        let index = self.resolve(element)?;
        if !matches!(self.elements[index].tag.as_str(), "input" | "textarea") {
            return Err(SessionError::NotActionable {
                selector: element.selection().to_string(),
                reason: "element is not an input".to_string(),
            });
        }
        self.elements[index].value = value.to_string();
        let call = format!("fill {}", self.label(index));
        self.calls.push(call);
        Ok(())
    }

    async fn wait_visible(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        self.maybe_hang(element).await;
        let index = self.resolve(element)?;
        if self.elements[index].visible {
            Ok(())
        } else {
            Err(SessionError::timeout("wait for visible", timeout))
        }
    }

    async fn text(&mut self, element: &ElementHandle, _timeout: Duration) -> Result<String, SessionError> {
        let index = self.resolve(element)?;
        let call = format!("text {}", self.label(index));
        self.calls.push(call);
        Ok(self.elements[index].text.clone())
    }

    async fn wait_ms(&mut self, duration: Duration) -> Result<(), SessionError> {
        self.calls.push(format!("wait {}", duration.as_millis()));
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        Ok(())
    }
}

/// Session wrapper that reports open/close to a shared tracker
pub struct TrackedPage {
    page: FakePage,
    tracker: Arc<Tracker>,
}

#[async_trait]
impl BrowserSession for TrackedPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        self.page.navigate(url, timeout).await
    }

    fn locate(&self, selection: &SelectionExpression) -> ElementHandle {
        self.page.locate(selection)
    }

    async fn click(&mut self, element: &ElementHandle, timeout: Duration) -> Result<(), SessionError> {
        self.page.click(element, timeout).await
    }

    async fn fill(
        &mut self,
        element: &ElementHandle,
        value: &str,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        self.page.fill(element, value, timeout).await
    }

    async fn wait_visible(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        self.page.wait_visible(element, timeout).await
    }

    async fn text(&mut self, element: &ElementHandle, timeout: Duration) -> Result<String, SessionError> {
        self.page.text(element, timeout).await
    }

    async fn wait_ms(&mut self, duration: Duration) -> Result<(), SessionError> {
        self.page.wait_ms(duration).await
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
        self.tracker.closed.lock().push(self.page.visited.clone());
        self.page.close().await
    }
}

/// Counts sessions across a run
#[derive(Default)]
pub struct Tracker {
    pub opened: Mutex<Vec<String>>,
    /// Pages visited by each closed session
    pub closed: Mutex<Vec<Vec<String>>>,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

/// Builds a fresh page per scenario title
pub struct FakeFactory {
    pages: HashMap<String, Vec<Element>>,
    default_page: Vec<Element>,
    /// Titles whose session cannot be opened
    refuse: Vec<String>,
    pub tracker: Arc<Tracker>,
}

impl FakeFactory {
    pub fn new(default_page: Vec<Element>) -> Self {
        Self {
            pages: HashMap::new(),
            default_page,
            refuse: Vec::new(),
            tracker: Arc::new(Tracker::default()),
        }
    }

    pub fn page_for(mut self, title: &str, elements: Vec<Element>) -> Self {
        self.pages.insert(title.to_string(), elements);
        self
    }

    pub fn refusing(mut self, title: &str) -> Self {
        self.refuse.push(title.to_string());
        self
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self, scenario_title: &str) -> Result<Box<dyn BrowserSession>, SessionError> {
        if self.refuse.iter().any(|t| t == scenario_title) {
            return Err(SessionError::Fault("browser failed to start".to_string()));
        }

        self.tracker.opened.lock().push(scenario_title.to_string());
        let now = self.tracker.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.tracker.max_active.fetch_max(now, Ordering::SeqCst);

        let elements = self
            .pages
            .get(scenario_title)
            .cloned()
            .unwrap_or_else(|| self.default_page.clone());

        Ok(Box::new(TrackedPage {
            page: FakePage::new(elements),
            tracker: self.tracker.clone(),
        }))
    }
}

/// Build a scenario document from `(stepName, action, locator, altLocator, value)` rows
pub fn scenario_json(title: &str, steps: &[(&str, &str, &str, &str, &str)]) -> String {
    let steps: Vec<serde_json::Value> = steps
        .iter()
        .map(|(name, action, locator, alt, value)| {
            let mut step = serde_json::json!({ "stepName": name, "action": action });
            if !locator.is_empty() {
                step["locator"] = (*locator).into();
            }
            if !alt.is_empty() {
                step["altLocator"] = (*alt).into();
            }
            if !value.is_empty() {
                step["value"] = (*value).into();
            }
            step
        })
        .collect();
    serde_json::json!({ "title": title, "steps": steps }).to_string()
}
