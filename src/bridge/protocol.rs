//! Messages exchanged with the Node Playwright driver
//!
//! Requests carry a sequence number and an `op` tag; every request gets
//! exactly one response with the same `seq`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::SessionError;

#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest {
    pub seq: u64,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Launch {
        browser: String,
        headless: bool,
        viewport: Viewport,
    },
    #[serde(rename_all = "camelCase")]
    Goto { url: String, timeout_ms: u64 },
    #[serde(rename_all = "camelCase")]
    Click {
        selectors: Vec<String>,
        timeout_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    Fill {
        selectors: Vec<String>,
        value: String,
        timeout_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    WaitVisible {
        selectors: Vec<String>,
        timeout_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    TextContent {
        selectors: Vec<String>,
        timeout_ms: u64,
    },
    Close,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Launch { .. } => "launch",
            Operation::Goto { .. } => "goto",
            Operation::Click { .. } => "click",
            Operation::Fill { .. } => "fill",
            Operation::WaitVisible { .. } => "waitVisible",
            Operation::TextContent { .. } => "textContent",
            Operation::Close => "close",
        }
    }

    /// Joined selectors, for error messages
    fn selector_text(&self) -> String {
        match self {
            Operation::Click { selectors, .. }
            | Operation::Fill { selectors, .. }
            | Operation::WaitVisible { selectors, .. }
            | Operation::TextContent { selectors, .. } => selectors.join(" | "),
            _ => String::new(),
        }
    }

    fn timeout_ms(&self) -> u64 {
        match self {
            Operation::Goto { timeout_ms, .. }
            | Operation::Click { timeout_ms, .. }
            | Operation::Fill { timeout_ms, .. }
            | Operation::WaitVisible { timeout_ms, .. }
            | Operation::TextContent { timeout_ms, .. } => *timeout_ms,
            _ => 0,
        }
    }
}

/// Fragments of Playwright's messages for selectors it cannot parse
const SELECTOR_SYNTAX_ERRORS: &[&str] = &[
    "while parsing selector",
    "Unexpected token",
    "Unsupported token",
    "Unknown engine",
    "is not a valid selector",
];

/// A selector that does not parse resolves to nothing rather than breaking
/// the session
fn is_selector_syntax_error(message: &str) -> bool {
    SELECTOR_SYNTAX_ERRORS.iter().any(|m| message.contains(m))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Timeout,
    NotFound,
    NotActionable,
    #[serde(other)]
    Fault,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverError {
    pub kind: ErrorKind,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    pub seq: u64,
    pub success: bool,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub error: Option<DriverError>,
}

impl BridgeResponse {
    /// Turn the response into the request's value, or a [`SessionError`]
    pub fn into_result(self, op: &Operation) -> Result<Value, SessionError> {
        if self.success {
            return Ok(self.value.unwrap_or(Value::Null));
        }

        let Some(error) = self.error else {
            return Err(SessionError::Protocol(format!(
                "{} failed without an error body",
                op.name()
            )));
        };

        Err(match error.kind {
            ErrorKind::Timeout => SessionError::Timeout {
                operation: op.name().to_string(),
                timeout_ms: op.timeout_ms(),
            },
            ErrorKind::NotFound => SessionError::NotFound {
                selector: op.selector_text(),
            },
            ErrorKind::Fault if is_selector_syntax_error(&error.message) => {
                tracing::debug!(message = %error.message, "Selector did not parse");
                SessionError::NotFound {
                    selector: op.selector_text(),
                }
            }
            ErrorKind::NotActionable => SessionError::NotActionable {
                selector: op.selector_text(),
                reason: error.message,
            },
            ErrorKind::Fault => SessionError::Fault(format!("{}: {}", op.name(), error.message)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = BridgeRequest {
            seq: 3,
            op: Operation::Fill {
                selectors: vec!["#email".to_string()],
                value: "a@b.c".to_string(),
                timeout_ms: 2000,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "seq": 3,
                "op": "fill",
                "selectors": ["#email"],
                "value": "a@b.c",
                "timeoutMs": 2000
            })
        );

        let close = serde_json::to_value(BridgeRequest {
            seq: 9,
            op: Operation::Close,
        })
        .unwrap();
        assert_eq!(close, serde_json::json!({"seq": 9, "op": "close"}));
    }

    #[test]
    fn test_wait_visible_tag() {
        let json = serde_json::to_value(Operation::WaitVisible {
            selectors: vec![],
            timeout_ms: 1,
        })
        .unwrap();
        assert_eq!(json["op"], "waitVisible");
    }

    #[test]
    fn test_response_errors_map_to_session_errors() {
        let op = Operation::Click {
            selectors: vec!["#a".to_string(), "text=A".to_string()],
            timeout_ms: 2000,
        };

        let timeout: BridgeResponse = serde_json::from_str(
            r#"{"seq":1,"success":false,"error":{"kind":"timeout","message":"Timeout 2000ms exceeded"}}"#,
        )
        .unwrap();
        assert_eq!(
            timeout.into_result(&op),
            Err(SessionError::Timeout {
                operation: "click".to_string(),
                timeout_ms: 2000
            })
        );

        let missing: BridgeResponse = serde_json::from_str(
            r#"{"seq":1,"success":false,"error":{"kind":"notFound","message":""}}"#,
        )
        .unwrap();
        assert_eq!(
            missing.into_result(&op),
            Err(SessionError::NotFound {
                selector: "#a | text=A".to_string()
            })
        );

        let odd: BridgeResponse = serde_json::from_str(
            r#"{"seq":1,"success":false,"error":{"kind":"browserClosed","message":"gone"}}"#,
        )
        .unwrap();
        assert_eq!(
            odd.into_result(&op),
            Err(SessionError::Fault("click: gone".to_string()))
        );
    }

    #[test]
    fn test_selector_syntax_errors_are_not_found() {
        let op = Operation::Fill {
            selectors: vec!["input[name=".to_string()],
            value: "bob".to_string(),
            timeout_ms: 2000,
        };

        let parse_error: BridgeResponse = serde_json::from_str(
            r#"{"seq":2,"success":false,"error":{"kind":"fault","message":"Unexpected token \"\" while parsing selector \"input[name=\""}}"#,
        )
        .unwrap();
        let err = parse_error.into_result(&op).unwrap_err();
        assert_eq!(
            err,
            SessionError::NotFound {
                selector: "input[name=".to_string()
            }
        );
        assert!(err.is_resolution_failure());

        let classified: BridgeResponse = serde_json::from_str(
            r#"{"seq":3,"success":false,"error":{"kind":"notFound","message":"Unsupported token \"@\""}}"#,
        )
        .unwrap();
        assert!(classified.into_result(&op).unwrap_err().is_resolution_failure());

        let crashed: BridgeResponse = serde_json::from_str(
            r#"{"seq":4,"success":false,"error":{"kind":"fault","message":"Target page, context or browser has been closed"}}"#,
        )
        .unwrap();
        assert!(!crashed.into_result(&op).unwrap_err().is_resolution_failure());
    }

    #[test]
    fn test_success_value() {
        let ok: BridgeResponse =
            serde_json::from_str(r#"{"seq":4,"success":true,"value":"Welcome"}"#).unwrap();
        assert_eq!(
            ok.into_result(&Operation::Close).unwrap(),
            Value::String("Welcome".to_string())
        );
    }
}
