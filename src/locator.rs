//! Locator normalization
//!
//! Scenario authors type locators the way they would describe an element,
//! not in selector syntax. `normalize` widens such a string into a concrete
//! [`SelectionExpression`]:
//!
//! - `data-test=login-btn` becomes the attribute selector `[data-test='login-btn']`
//! - `Sign in` becomes a list of candidates (button text, link text, input
//!   value, any text, placeholder/aria-label/title/alt) matched as "any of"
//! - anything that already looks like a selector is passed through
//!
//! This module does no I/O.

use std::fmt;

/// Selector engine prefixes that must never be rewritten as attributes
const RESERVED_KEYS: &[&str] = &["text", "xpath", "css", "has-text"];

/// What the normalized locator will be used for.
/// Only affects candidate order, never the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionHint {
    #[default]
    Click,
    Fill,
    Assert,
}

/// Attributes searched by substring for plain-text locators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAttribute {
    Placeholder,
    AriaLabel,
    Title,
    Alt,
}

impl TextAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAttribute::Placeholder => "placeholder",
            TextAttribute::AriaLabel => "aria-label",
            TextAttribute::Title => "title",
            TextAttribute::Alt => "alt",
        }
    }
}

/// One way of finding an element from plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// `<button>` containing the text
    ButtonText(String),
    /// `<a>` containing the text
    LinkText(String),
    /// `<input type="submit|button">` whose value is the text
    InputValue(String),
    /// Any element containing the text
    Text(String),
    /// Attribute containing the text
    AttributeContains {
        attribute: TextAttribute,
        text: String,
    },
}

impl Candidate {
    /// Playwright selectors for this candidate
    pub fn selectors(&self) -> Vec<String> {
        match self {
            Candidate::ButtonText(t) => vec![format!("button:has-text(\"{}\")", escape_double(t))],
            Candidate::LinkText(t) => vec![format!("a:has-text(\"{}\")", escape_double(t))],
            Candidate::InputValue(t) => {
                let v = escape_double(t);
                vec![
                    format!("input[type=\"submit\"][value=\"{}\"]", v),
                    format!("input[type=\"button\"][value=\"{}\"]", v),
                ]
            }
            Candidate::Text(t) => vec![format!("text={}", t)],
            Candidate::AttributeContains { attribute, text } => {
                vec![format!("[{}*=\"{}\"]", attribute.as_str(), escape_double(text))]
            }
        }
    }
}

/// Normalized, concrete form of a locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionExpression {
    /// Used verbatim. Empty means "no locator".
    Raw(String),
    /// Attribute match; `value` is already quoted
    Attribute { name: String, value: String },
    /// Match whichever candidate exists, in order
    AnyOf(Vec<Candidate>),
}

impl SelectionExpression {
    pub fn is_empty(&self) -> bool {
        match self {
            SelectionExpression::Raw(s) => s.is_empty(),
            SelectionExpression::Attribute { .. } => false,
            SelectionExpression::AnyOf(c) => c.is_empty(),
        }
    }

    /// Flatten into an ordered list of selectors for the automation layer
    pub fn selectors(&self) -> Vec<String> {
        match self {
            SelectionExpression::Raw(s) if s.is_empty() => Vec::new(),
            SelectionExpression::Raw(s) => vec![s.clone()],
            SelectionExpression::Attribute { .. } => vec![self.to_string()],
            SelectionExpression::AnyOf(candidates) => {
                candidates.iter().flat_map(Candidate::selectors).collect()
            }
        }
    }
}

impl fmt::Display for SelectionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionExpression::Raw(s) => write!(f, "{}", s),
            SelectionExpression::Attribute { name, value } => write!(f, "[{}={}]", name, value),
            SelectionExpression::AnyOf(_) => write!(f, "{}", self.selectors().join(" | ")),
        }
    }
}

/// Turn a user-typed locator into a selection expression
pub fn normalize(raw: &str, hint: ActionHint) -> SelectionExpression {
    let input = raw.trim();

    if input.is_empty() {
        return SelectionExpression::Raw(String::new());
    }

    if let Some((name, value)) = attribute_shorthand(input) {
        return SelectionExpression::Attribute {
            name: name.to_string(),
            value: quote_value(value),
        };
    }

    if is_plain_text(input) {
        return SelectionExpression::AnyOf(text_candidates(input, hint));
    }

    SelectionExpression::Raw(input.to_string())
}

/// Match `key=value` where key is letters and hyphens and not a reserved engine
fn attribute_shorthand(input: &str) -> Option<(&str, &str)> {
    if input.starts_with('[') {
        return None;
    }
    let (key, value) = input.split_once('=')?;
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
        return None;
    }
    if RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key)) {
        return None;
    }
    Some((key, value))
}

fn quote_value(value: &str) -> String {
    let quoted = value.len() >= 2
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')));
    if quoted {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn is_plain_text(input: &str) -> bool {
    input
        .chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | ':' | '\''))
}

fn text_candidates(text: &str, hint: ActionHint) -> Vec<Candidate> {
    let text = text.to_string();
    let clickable = vec![
        Candidate::ButtonText(text.clone()),
        Candidate::LinkText(text.clone()),
        Candidate::InputValue(text.clone()),
        Candidate::Text(text.clone()),
    ];
    let described = [
        TextAttribute::Placeholder,
        TextAttribute::AriaLabel,
        TextAttribute::Title,
        TextAttribute::Alt,
    ]
    .into_iter()
    .map(|attribute| Candidate::AttributeContains {
        attribute,
        text: text.clone(),
    })
    .collect::<Vec<_>>();

    match hint {
        ActionHint::Fill => described.into_iter().chain(clickable).collect(),
        ActionHint::Click | ActionHint::Assert => clickable.into_iter().chain(described).collect(),
    }
}

fn escape_double(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_no_locator() {
        assert!(normalize("", ActionHint::Click).is_empty());
        assert!(normalize("   ", ActionHint::Click).is_empty());
        assert!(normalize("", ActionHint::Click).selectors().is_empty());
    }

    #[test]
    fn test_attribute_shorthand_gets_quoted() {
        let expr = normalize("data-id=foo", ActionHint::Click);
        assert_eq!(
            expr,
            SelectionExpression::Attribute {
                name: "data-id".to_string(),
                value: "'foo'".to_string(),
            }
        );
        assert_eq!(expr.to_string(), "[data-id='foo']");
        assert_eq!(expr.selectors(), vec!["[data-id='foo']".to_string()]);
    }

    #[test]
    fn test_attribute_shorthand_keeps_existing_quotes() {
        assert_eq!(
            normalize("data-test=\"login-btn\"", ActionHint::Click).to_string(),
            "[data-test=\"login-btn\"]"
        );
        assert_eq!(
            normalize("name='email'", ActionHint::Fill).to_string(),
            "[name='email']"
        );
    }

    #[test]
    fn test_attribute_value_with_quote_is_escaped() {
        assert_eq!(
            normalize("title=it's", ActionHint::Click).to_string(),
            "[title='it\\'s']"
        );
    }

    #[test]
    fn test_bracketed_attribute_unchanged() {
        assert_eq!(
            normalize("[data-id=foo]", ActionHint::Click),
            SelectionExpression::Raw("[data-id=foo]".to_string())
        );
    }

    #[test]
    fn test_reserved_engines_pass_through() {
        for raw in ["text=Login", "xpath=//button", "css=.btn", "has-text=Go", "TEXT=Login"] {
            assert_eq!(
                normalize(raw, ActionHint::Click),
                SelectionExpression::Raw(raw.to_string()),
                "{raw} should pass through"
            );
        }
    }

    #[test]
    fn test_selector_syntax_passes_through() {
        for raw in ["#login", ".btn-primary", "form > button", "input[name=q]"] {
            assert_eq!(
                normalize(raw, ActionHint::Click),
                SelectionExpression::Raw(raw.to_string())
            );
        }
    }

    #[test]
    fn test_plain_text_expands_to_full_union() {
        let expr = normalize("Submit", ActionHint::Click);
        let SelectionExpression::AnyOf(candidates) = &expr else {
            panic!("expected candidates, got {expr:?}");
        };
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0], Candidate::ButtonText("Submit".to_string()));

        let selectors = expr.selectors();
        assert!(selectors.contains(&"button:has-text(\"Submit\")".to_string()));
        assert!(selectors.contains(&"a:has-text(\"Submit\")".to_string()));
        assert!(selectors.contains(&"input[type=\"submit\"][value=\"Submit\"]".to_string()));
        assert!(selectors.contains(&"text=Submit".to_string()));
        assert!(selectors.contains(&"[aria-label*=\"Submit\"]".to_string()));
        assert!(selectors.contains(&"[alt*=\"Submit\"]".to_string()));
    }

    #[test]
    fn test_plain_text_allowed_punctuation() {
        let expr = normalize("Don't have an account: sign_up-now", ActionHint::Click);
        assert!(matches!(expr, SelectionExpression::AnyOf(_)));
    }

    #[test]
    fn test_fill_hint_prefers_described_inputs() {
        let SelectionExpression::AnyOf(candidates) = normalize("Email", ActionHint::Fill) else {
            panic!("expected candidates");
        };
        assert_eq!(
            candidates[0],
            Candidate::AttributeContains {
                attribute: TextAttribute::Placeholder,
                text: "Email".to_string(),
            }
        );
        assert_eq!(candidates.len(), 8);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(
            normalize("  data-id=foo ", ActionHint::Click).to_string(),
            "[data-id='foo']"
        );
    }
}
