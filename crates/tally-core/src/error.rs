//! Error types for tally-core
//!
//! Failures are split the same way the list and batch views treat them:
//! transport problems become a banner, server-side validation keeps its
//! per-field structure until it is displayed, and unexpected response
//! shapes are downgraded to warnings by the normalizer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::TransactionId;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request failed or timed out
    Transport,
    /// Server rejected the payload
    ServerRejected,
    /// Session missing or expired
    Unauthorized,
    /// Transaction not found
    NotFound,
    /// Body could not be decoded
    UnexpectedResponse,
    /// Local validation failed
    ValidationError,
    /// Row index out of range
    RowOutOfRange,
    /// Attempt to remove the last draft row
    LastRow,
    /// Operation needs a logged-in session
    NotAuthenticated,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Transport => write!(f, "TRANSPORT"),
            ErrorCode::ServerRejected => write!(f, "SERVER_REJECTED"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::UnexpectedResponse => write!(f, "UNEXPECTED_RESPONSE"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::RowOutOfRange => write!(f, "ROW_OUT_OF_RANGE"),
            ErrorCode::LastRow => write!(f, "LAST_ROW"),
            ErrorCode::NotAuthenticated => write!(f, "NOT_AUTHENTICATED"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Detailed error information for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            suggestions: vec![],
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Key under which messages that belong to no field are stored
pub const NON_FIELD_KEY: &str = "non_field_errors";

/// Server validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message under `field`
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Build from a decoded error body.
    ///
    /// Objects map each key to a string or a list of strings; nested
    /// objects (per-row errors of a bulk create) are prefixed with their
    /// key. A bare string or list becomes a non-field message.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let mut errors = Self::new();
        errors.collect("", body);
        errors
    }

    fn collect(&mut self, prefix: &str, value: &serde_json::Value) {
        use serde_json::Value;

        let key = if prefix.is_empty() { NON_FIELD_KEY } else { prefix };
        match value {
            Value::Null => {}
            Value::String(message) => self.push(key, message.clone()),
            Value::Array(values) => {
                for (index, item) in values.iter().enumerate() {
                    match item {
                        Value::Object(_) => {
                            let nested = if prefix.is_empty() {
                                format!("row {}", index + 1)
                            } else {
                                format!("{}[{}]", prefix, index)
                            };
                            self.collect(&nested, item);
                        }
                        _ => self.collect(prefix, item),
                    }
                }
            }
            Value::Object(map) => {
                for (field, inner) in map {
                    let nested = if prefix.is_empty() || field == NON_FIELD_KEY {
                        field.clone()
                    } else {
                        format!("{}.{}", prefix, field)
                    };
                    self.collect(&nested, inner);
                }
            }
            other => self.push(key, other.to_string()),
        }
    }

    /// Messages recorded for `field`
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Join every message into one display line:
    /// `amount: must be positive; date: required, invalid`.
    /// Non-field messages are shown without a field prefix.
    pub fn flatten(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| {
                let joined = messages.join(", ");
                if field == NON_FIELD_KEY || field == "detail" {
                    joined
                } else {
                    format!("{}: {}", field, joined)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Main error type for tally-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Rejected by server: {}", .0.flatten())]
    ServerRejected(FieldErrors),

    #[error("Session expired or not authorized")]
    Unauthorized,

    #[error("Transaction not found: {id}")]
    NotFound { id: TransactionId },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Row {index} does not exist ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("At least one row must remain")]
    LastRow,

    #[error("Please log in first")]
    NotAuthenticated,
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Transport { .. } => ErrorCode::Transport,
            CoreError::ServerRejected(_) => ErrorCode::ServerRejected,
            CoreError::Unauthorized => ErrorCode::Unauthorized,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::UnexpectedResponse { .. } => ErrorCode::UnexpectedResponse,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::RowOutOfRange { .. } => ErrorCode::RowOutOfRange,
            CoreError::LastRow => ErrorCode::LastRow,
            CoreError::NotAuthenticated => ErrorCode::NotAuthenticated,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Transport { .. } => ErrorSeverity::Error,
            CoreError::ServerRejected(_) => ErrorSeverity::Warning,
            CoreError::Unauthorized => ErrorSeverity::Error,
            CoreError::NotFound { .. } => ErrorSeverity::Info,
            CoreError::UnexpectedResponse { .. } => ErrorSeverity::Warning,
            CoreError::Validation { .. } => ErrorSeverity::Warning,
            CoreError::RowOutOfRange { .. } => ErrorSeverity::Info,
            CoreError::LastRow => ErrorSeverity::Info,
            CoreError::NotAuthenticated => ErrorSeverity::Warning,
        }
    }

    /// Structured field errors, if the server sent any
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CoreError::ServerRejected(errors) => Some(errors),
            _ => None,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Transport { .. } => {
                details = details.with_suggestion(
                    "Check the API base URL and your connection, then refresh.".to_string(),
                );
            }
            CoreError::Unauthorized | CoreError::NotAuthenticated => {
                details = details.with_suggestion(
                    "Log in again and update api.token in the config file.".to_string(),
                );
            }
            CoreError::ServerRejected(_) => {
                details = details.with_suggestion(
                    "Correct the listed fields and submit again.".to_string(),
                );
            }
            CoreError::NotFound { .. } => {
                details = details.with_suggestion(
                    "The transaction may have been deleted; refresh the list.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for log records
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Request token of the fetch, if any
    pub request_token: Option<u64>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            request_token: None,
        }
    }

    pub fn with_request_token(mut self, token: u64) -> Self {
        self.request_token = Some(token);
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Error => log::error!(
                target: "tally::error",
                "[{}] {} - Operation: {} - Request: {:?}",
                error.code(),
                error,
                context.operation,
                context.request_token
            ),
            _ => log::warn!(
                target: "tally::error",
                "[{}] {} - Operation: {} - Request: {:?}",
                error.code(),
                error,
                context.operation,
                context.request_token
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "tally::error",
            "WARNING: {} - Operation: {} - Request: {:?}",
            message,
            context.operation,
            context.request_token
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::Transport.to_string(), "TRANSPORT");
        assert_eq!(ErrorCode::ServerRejected.to_string(), "SERVER_REJECTED");
        assert_eq!(ErrorCode::LastRow.to_string(), "LAST_ROW");
    }

    #[test]
    fn test_field_errors_from_object() {
        let errors = FieldErrors::from_json(&json!({
            "amount": ["Ensure this value is greater than 0."],
            "date": ["This field is required.", "Enter a valid date."]
        }));

        assert_eq!(errors.get("date").map(|m| m.len()), Some(2));
        assert_eq!(
            errors.flatten(),
            "amount: Ensure this value is greater than 0.; date: This field is required., Enter a valid date."
        );
    }

    #[test]
    fn test_field_errors_non_field_messages() {
        let errors = FieldErrors::from_json(&json!({
            "detail": "Not found.",
        }));
        assert_eq!(errors.flatten(), "Not found.");

        let errors = FieldErrors::from_json(&json!(["Batch rejected"]));
        assert_eq!(errors.get(NON_FIELD_KEY).unwrap(), ["Batch rejected".to_string()]);
        assert_eq!(errors.flatten(), "Batch rejected");
    }

    #[test]
    fn test_field_errors_bulk_rows() {
        let errors = FieldErrors::from_json(&json!([
            {},
            { "amount": ["A valid number is required."] }
        ]));
        assert_eq!(errors.flatten(), "row 2.amount: A valid number is required.");
    }

    #[test]
    fn test_server_rejected_keeps_structure() {
        let mut fields = FieldErrors::new();
        fields.push("description", "This field may not be blank.");
        let error = CoreError::ServerRejected(fields);

        assert_eq!(error.code(), ErrorCode::ServerRejected);
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(error.field_errors().unwrap().get("description").is_some());
        assert!(error.to_string().contains("description: This field may not be blank."));
    }

    #[test]
    fn test_error_details_suggestions() {
        let details = CoreError::Transport {
            message: "connection refused".to_string(),
        }
        .to_details();

        assert_eq!(details.code, ErrorCode::Transport);
        assert_eq!(details.suggestions.len(), 1);
        assert!(details.to_string().starts_with("[TRANSPORT]"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("fetch").with_request_token(4);
        assert_eq!(context.operation, "fetch");
        assert_eq!(context.request_token, Some(4));
    }
}
