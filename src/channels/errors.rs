//! Structured error events carried on the errors channel.
//!
//! Node failures never abort a turn; they are recorded here and surfaced as
//! synthetic tool messages. The `scope` tells a reader where in the engine the
//! failure happened without parsing the message text.
//!
//! The `scope` field serializes as a tagged union with a `"scope"`
//! discriminator: `"node"` carries `node` and `step`, `"executor"` carries
//! `thread` and `step`, `"service"` has no extra fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded failure, with when and where it happened.
///
/// # Examples
///
/// ```
/// use lingograph::channels::errors::{ErrorEvent, ErrorDetail};
/// use serde_json::json;
///
/// let event = ErrorEvent::node("grammar", 2, ErrorDetail::msg("checker timed out"))
///     .with_tag("port")
///     .with_context(json!({"timeout_ms": 5000}));
/// assert_eq!(event.tags, vec!["port"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: ErrorDetail,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    /// A failure inside a node's `run`.
    pub fn node<S: Into<String>>(node: S, step: u64, error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                node: node.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// A failure in the step loop itself.
    pub fn executor<S: Into<String>>(thread: S, step: u64, error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Executor {
                thread: thread.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// A failure at the service boundary.
    pub fn service(error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Service,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node {
        node: String,
        step: u64,
    },
    Executor {
        thread: String,
        step: u64,
    },
    #[default]
    Service,
}

/// Message plus optional cause chain and structured details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorDetail>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for ErrorDetail {
    fn default() -> Self {
        ErrorDetail {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorDetail {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl ErrorDetail {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        ErrorDetail {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: ErrorDetail) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scope_serializes_with_discriminator() {
        let event = ErrorEvent::node("tutor", 3, ErrorDetail::msg("model unavailable"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["scope"]["scope"], "node");
        assert_eq!(value["scope"]["node"], "tutor");
        assert_eq!(value["scope"]["step"], 3);
    }

    #[test]
    fn cause_chain_reports_source() {
        let err = ErrorDetail::msg("extraction failed")
            .with_cause(ErrorDetail::msg("schema mismatch").with_details(json!({"field": "name"})));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "schema mismatch");
    }

    #[test]
    fn round_trip() {
        let event = ErrorEvent::executor("thread-1", 7, ErrorDetail::msg("frontier stalled"))
            .with_tag("routing");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ErrorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}
