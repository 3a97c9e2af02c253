use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use crate::action::ActionName;

/// Structured error body returned by the action server.
/// Only caller contract violations ever reach this shape; every runtime
/// failure inside an action resolves to a natural-language reply instead.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "malformed_envelope", "internal_error")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which envelope field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what a well-formed request looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the action server
pub mod codes {
    pub const MALFORMED_ENVELOPE: &str = "malformed_envelope";
    pub const UNKNOWN_ACTION: &str = "unknown_action";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Failures of a registry dispatch. Both are surfaced to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered under this name. The caller decides whether
    /// to route the turn to the fallback handler.
    #[error("no action registered under '{0}'")]
    UnknownAction(String),
    /// A structural envelope field is missing or has the wrong shape.
    #[error("malformed envelope: {field}: {message}")]
    MalformedEnvelope { field: String, message: String },
}

impl DispatchError {
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::MalformedEnvelope {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures of the external completion call. Recovered inside the fallback
/// handler and only ever reported as payload metadata.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExternalServiceError {
    #[error("completion service is not configured: {0}")]
    NotConfigured(String),
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response was malformed: {0}")]
    Malformed(String),
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),
    #[error("completion request was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("no handler registered for: {}", names(.0))]
    Incomplete(Vec<ActionName>),
    #[error("handler for '{registered_as}' reports itself as '{reported}'")]
    Mismatched {
        registered_as: ActionName,
        reported: ActionName,
    },
}

fn names(actions: &[ActionName]) -> String {
    actions
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A required entity the upstream model did not extract. Never raised:
/// converting it yields the clarifying reply for the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingEntity {
    pub entity: &'static str,
    pub question: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_registry_lists_missing_actions() {
        let err = RegistryError::Incomplete(vec![ActionName::SuggestWine, ActionName::AdjustPrice]);
        assert_eq!(
            err.to_string(),
            "no handler registered for: action_suggest_wine, action_adjust_price"
        );
    }

    #[test]
    fn api_error_skips_empty_optional_fields() {
        let body = ApiError {
            error: codes::MALFORMED_ENVELOPE.to_string(),
            message: "missing field".to_string(),
            field: None,
            received: None,
            request_id: "req-1".to_string(),
            docs_hint: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("field").is_none());
        assert!(value.get("docs_hint").is_none());
        assert_eq!(value["request_id"], "req-1");
    }
}
