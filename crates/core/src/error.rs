//! Error types for excelrelay.

use thiserror::Error;

/// Result type for excelrelay operations.
pub type ExcelResult<T> = Result<T, ExcelError>;

/// Message used when the poll ceiling is reached while the job is still pending.
pub const STILL_PROCESSING: &str = "The operation may still be processing on the server.";

/// Errors that can occur while running a document operation.
#[derive(Debug, Error)]
pub enum ExcelError {
    /// The initial call failed: unexpected status, missing poll URL, or client failure.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The poll target returned 404. Never retried.
    #[error("Processing job not found or expired. The document processing may have timed out.")]
    JobNotFound { location: String },

    /// The attempt ceiling was reached before the job finished.
    #[error("Document processing timed out after {attempts} polling attempts. {detail}")]
    PollTimeout { attempts: u32, detail: String },

    /// The poll target returned a status other than 200, 202 or 404.
    #[error("{message}")]
    Poll { status: u16, message: String },

    /// The response could not be reduced to valid document bytes.
    #[error("{0}")]
    Decode(String),

    /// Operation options failed validation before a request was built.
    #[error("{0}")]
    InvalidParameter(String),

    /// Input document could not be acquired.
    #[error("{0}")]
    Input(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExcelError {
    /// Create a transport error with no HTTP status attached.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport error for an HTTP status.
    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a parameter validation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create an input acquisition error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::JobNotFound { .. } => "job_not_found",
            Self::PollTimeout { .. } => "poll_timeout",
            Self::Poll { .. } => "poll",
            Self::Decode(_) => "decode",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Input(_) => "input",
            Self::Config(_) => "config",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Poll { status, .. } => Some(*status),
            Self::JobNotFound { .. } => Some(404),
            _ => None,
        }
    }
}
