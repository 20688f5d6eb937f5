//! Error types for WAAPI communication

use thiserror::Error;

/// WAAPI client errors
#[derive(Error, Debug)]
pub enum WaapiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timed out after {timeout_ms}ms waiting for {context}")]
    Timeout { timeout_ms: u32, context: String },

    #[error("WAAPI call '{uri}' did not return within {timeout_ms}ms")]
    CallTimeout { uri: String, timeout_ms: u32 },

    #[error("Session aborted by WAAPI: {0}")]
    Aborted(String),

    #[error("WAAPI client not connected")]
    NotConnected,

    #[error("WAAPI call '{uri}' failed: {error}{}", message_suffix(.message))]
    RequestFailed {
        uri: String,
        error: String,
        message: Option<String>,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WaapiError {
    /// True when the channel itself is unusable, as opposed to a single rejected or
    /// overdue call
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout { .. } | Self::Aborted(_) | Self::NotConnected
        )
    }
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(msg) => format!(" ({})", msg),
        None => String::new(),
    }
}

/// Result type for WAAPI operations
pub type WaapiResult<T> = Result<T, WaapiError>;
