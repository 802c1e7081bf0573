//! Adapter errors and remote error-body decoding.

use serde::Deserialize;
use thiserror::Error;
use trigger::RemoteError;

/// Failures raised inside the adapter before a response is read.
#[derive(Debug, Error)]
pub enum AdminApiError {
    /// The admin key in the auth context is malformed.
    #[error("{0}")]
    InvalidKey(String),

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<AdminApiError> for RemoteError {
    fn from(err: AdminApiError) -> Self {
        match err {
            AdminApiError::InvalidKey(message) => RemoteError::Credentials { message },
            AdminApiError::Signing(e) => RemoteError::Credentials {
                message: e.to_string(),
            },
            AdminApiError::Client(e) => RemoteError::Transport {
                message: e.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

/// Extracts the operator-facing message from an error response body.
///
/// Uses the first entry of `{"errors": [{"message", "context"}]}`, joined as
/// `"message: context"` when a context is present. Falls back to the raw body,
/// and to the status text when the body is empty.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let first = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next());

    if let Some(entry) = first {
        let message = entry.message.unwrap_or_default();
        match entry.context.filter(|context| !context.trim().is_empty()) {
            Some(context) if message.is_empty() => return context,
            Some(context) => return format!("{message}: {context}"),
            None if !message.is_empty() => return message,
            None => {}
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}
