//! Error taxonomy shared by the client, the flows and the CLI.

use std::fmt;

pub type Result<T, E = WhisperError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum WhisperError {
    /// Client-side form validation failed; nothing was sent.
    #[error("invalid secret: {0}")]
    Validation(ValidationErrors),

    /// The secret needs a password, or the one given was wrong (401).
    #[error("a password is required to access this secret")]
    Unauthorized,

    /// Unknown token, expired secret, or destroyed secret (404).
    #[error("no secret exists with the specified token")]
    NotFound,

    /// Any other non-2xx reply. `message` is the server's `error` field when it sent one.
    #[error("[{status}] {message}")]
    Server { status: u16, message: String },

    /// The request never got a reply.
    #[error("network error: {0}")]
    Network(String),

    /// A submit arrived while the previous one was still outstanding.
    #[error("a request is already in flight")]
    InFlight,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WhisperError {
    /// Map a non-2xx status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => WhisperError::Unauthorized,
            404 => WhisperError::NotFound,
            _ => WhisperError::Server {
                status,
                message: server_message(body).unwrap_or_else(|| default_reason(status).to_string()),
            },
        }
    }
}

/// Pull the `error` field out of a `{"success": false, "error": "..."}` reply.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        403 => "Forbidden",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "request failed",
    }
}

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
