/*
[INPUT]:  Error sources (HTTP, API, serialization, session, worker)
[OUTPUT]: Structured error types with context and user-facing messages
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Fallback text when neither the server nor the transport supplied one.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Main error type for the task client
#[derive(Error, Debug)]
pub enum TaskpadError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request with a non-401 status.
    ///
    /// `message` is what the user is shown; `server_message` is the body's
    /// `message` field when the backend sent one.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        server_message: Option<String>,
    },

    /// 401 that was not recovered by a refresh
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        server_message: Option<String>,
    },

    /// Refresh cycle failed; the session has been torn down
    #[error("Session expired, please login again")]
    SessionExpired,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before reaching the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Text-processing worker reported a failure
    #[error("Worker error: {0}")]
    Worker(String),
}

impl TaskpadError {
    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            TaskpadError::Unauthorized { .. } | TaskpadError::SessionExpired
        )
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TaskpadError::Api { status, .. } => Some(*status),
            TaskpadError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            TaskpadError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// True when the backend reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        TaskpadError::Api {
            status: status.as_u16(),
            message: message.into(),
            server_message: None,
        }
    }

    /// 401 error; the display text falls back to "Unauthorized"
    pub fn unauthorized(server_message: Option<String>) -> Self {
        TaskpadError::Unauthorized {
            message: server_message
                .clone()
                .unwrap_or_else(|| "Unauthorized".to_string()),
            server_message,
        }
    }

    /// Attach the message the backend put in the error body
    pub fn with_server_message(mut self, message: Option<String>) -> Self {
        if let TaskpadError::Api { server_message, .. }
        | TaskpadError::Unauthorized { server_message, .. } = &mut self
        {
            *server_message = message;
        }
        self
    }

    /// The backend's own `message`, never text synthesized client-side
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TaskpadError::Api { server_message, .. }
            | TaskpadError::Unauthorized { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }
}

/// Pick the user-visible message: server field, then transport text, then fallback.
pub fn user_message(server_message: Option<&str>, transport_message: Option<&str>) -> String {
    server_message
        .filter(|message| !message.trim().is_empty())
        .or(transport_message.filter(|message| !message.trim().is_empty()))
        .unwrap_or(GENERIC_ERROR_MESSAGE)
        .to_string()
}

/// Result type alias for task client operations
pub type Result<T> = std::result::Result<T, TaskpadError>;
