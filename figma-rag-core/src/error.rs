//! Error types shared by every stage of the pipeline.
//!
//! Element-level failures (`Conversion`, `Schema`) are recovered by the caller
//! that owns the element; everything else is fatal for the current command.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The remote API could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote API answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Remote {
        status: u16,
        message: String,
        body: Option<String>,
    },

    /// The remote API answered successfully but the payload is unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A single network call exceeded its time budget.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// An element could not be rendered into a document.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// A model response was not JSON or did not match the expected shape.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("failed to {operation} {}: {source}", path.display())]
    FileOperation {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Builds a [`Error::Remote`] using the fixed status message table.
    pub fn remote(status: u16, body: Option<String>) -> Self {
        Error::Remote {
            status,
            message: remote_error_message(status),
            body,
        }
    }

    pub fn file_operation(path: impl Into<PathBuf>, operation: &'static str, source: io::Error) -> Self {
        Error::FileOperation {
            path: path.into(),
            operation,
            source,
        }
    }

    /// True when repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout(_) => true,
            Error::Remote { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Human-readable message for a design-tool API status code.
pub fn remote_error_message(status: u16) -> String {
    let known = match status {
        400 => "Bad request - please check your input parameters",
        401 => "Authentication failed - please check your access token",
        403 => "Access forbidden - you don't have permission to access this resource",
        404 => "Resource not found - please check the file or component ID",
        429 => "Rate limit exceeded - please try again later",
        500 => "Figma API server error - please try again later",
        502 => "Bad gateway - Figma API is temporarily unavailable",
        503 => "Service unavailable - Figma API is temporarily unavailable",
        504 => "Gateway timeout - request to Figma API timed out",
        other => return format!("Unexpected error occurred with status code: {other}"),
    };
    known.to_string()
}
