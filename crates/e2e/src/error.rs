//! Error types for the TodoMVC harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    /// A domain operation referenced an item by text that is not rendered.
    #[error("Todo item does not exist: {text:?}")]
    NotFound { text: String },

    #[error("Cannot {operation}: {reason}")]
    PreconditionViolated { operation: String, reason: String },

    #[error("Timed out after {timeout_ms} ms waiting for {waited_for} (last observed: {last_observed})")]
    Timeout {
        waited_for: String,
        last_observed: String,
        timeout_ms: u64,
    },

    #[error("Assertion failed: expected {expected}, got {actual}")]
    AssertionFailed { expected: String, actual: String },

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge protocol error: {0}")]
    Bridge(String),

    #[error("Driver error on {locator}: {reason}")]
    Driver { locator: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    pub(crate) fn not_found(text: impl Into<String>) -> Self {
        E2eError::NotFound { text: text.into() }
    }

    pub(crate) fn precondition(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        E2eError::PreconditionViolated {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn driver(locator: impl ToString, reason: impl Into<String>) -> Self {
        E2eError::Driver {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the domain-level failures a scenario can reason about.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            E2eError::NotFound { .. } | E2eError::PreconditionViolated { .. }
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_missing_text() {
        let err = E2eError::not_found("feed the cat");
        assert_eq!(err.to_string(), "Todo item does not exist: \"feed the cat\"");
        assert!(err.is_domain_error());
    }

    #[test]
    fn test_timeout_reports_predicate_and_last_value() {
        let err = E2eError::Timeout {
            waited_for: "3 todos in storage".to_string(),
            last_observed: "[]".to_string(),
            timeout_ms: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 todos in storage"));
        assert!(msg.contains("last observed: []"));
        assert!(!err.is_domain_error());
    }
}
