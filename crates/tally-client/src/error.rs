//! Error types for tally-client

use serde_json::Value;
use tally_core::{CoreError, FieldErrors, TransactionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid URI: {url}")]
    InvalidUri { url: String },

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Server returned {status}")]
    Status { status: u16, body: Value },

    #[error("Could not decode response: {message}")]
    Decode { message: String },

    #[error("Could not encode request: {message}")]
    Encode { message: String },
}

/// Result type with ApiError
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text to show the user: the body's `error`, then `suggestion`,
    /// then `detail`, else the error itself
    pub fn user_message(&self) -> String {
        if let ApiError::Status { body, .. } = self {
            for key in ["error", "suggestion", "detail"] {
                if let Some(message) = body.get(key).and_then(Value::as_str) {
                    if !message.trim().is_empty() {
                        return message.to_string();
                    }
                }
            }
        }
        self.to_string()
    }

    /// Classify into the core taxonomy; `id` names the record a 404 refers to
    pub fn into_core(self, id: Option<TransactionId>) -> CoreError {
        match self {
            ApiError::Status { status: 400, body } => {
                CoreError::ServerRejected(FieldErrors::from_json(&body))
            }
            ApiError::Status { status: 401 | 403, .. } => CoreError::Unauthorized,
            ApiError::Status { status: 404, body } => match id {
                Some(id) => CoreError::NotFound { id },
                None => CoreError::UnexpectedResponse {
                    message: format!("404: {}", body),
                },
            },
            ApiError::Decode { message } => CoreError::UnexpectedResponse { message },
            other => CoreError::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        err.into_core(None)
    }
}
