//! Error mapping for Directory Service responses.

use live_application::ports::directory::DirectoryError;
use live_application::ports::file_uploader::UploadError;
use serde_json::Value;
use thiserror::Error;

/// Failure of one Directory Service request, before it is mapped to the
/// port's error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ApiError> for DirectoryError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Http { status, message } => DirectoryError::Http { status, message },
            ApiError::Network(reason) => DirectoryError::Network(reason),
            ApiError::Rejected(message) => DirectoryError::Rejected(message),
            ApiError::InvalidResponse(reason) => DirectoryError::InvalidResponse(reason),
        }
    }
}

impl From<ApiError> for UploadError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Http { status, message } => UploadError::Http { status, message },
            ApiError::Network(reason) => UploadError::Network(reason),
            ApiError::Rejected(message) => UploadError::Rejected(message),
            ApiError::InvalidResponse(reason) => UploadError::InvalidResponse(reason),
        }
    }
}

/// Message for an HTTP error status: the body's `error` field, else its
/// `message` field, else `HTTP <status> error`.
pub fn http_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .or_else(|| json.get("message"))
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or_else(|| format!("HTTP {status} error"))
}

/// Reject a 2xx body that reports `success: false`.
pub fn check_success(body: Value) -> Result<Value, ApiError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(ApiError::Rejected(message));
    }
    Ok(body)
}
