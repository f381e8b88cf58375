use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Error body returned by the backend for non-2xx responses.
///
/// `detail` is usually a string, but request validation failures carry a list of
/// `{loc, msg, type}` objects instead.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    /// Creates an error response carrying a plain message.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// The body substituted when the backend response cannot be parsed.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(UNKNOWN_ERROR)
    }

    /// Render the detail as a single displayable line.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| match item.get("msg").and_then(Value::as_str) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            Some(Value::Null | Value::String(_) | Value::Array(_)) | None => {
                UNKNOWN_ERROR.to_string()
            }
            Some(other) => other.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// A single rejected input field, detected before any request is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} {message}")]
pub struct FieldError {
    /// Name of the offending field as the client refers to it.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
