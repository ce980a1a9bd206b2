//! Error types for the ops console

use std::io;

use ops_console_core::RouteError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for the ops console
pub type Result<T> = std::result::Result<T, Error>;

/// Ops console errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Route table could not be compiled
    #[error("Route configuration error: {0}")]
    Route(#[from] RouteError),

    /// Session store could not be read or written
    #[error("Session store error: {0}")]
    Session(String),

    /// Backend rejected the credentials or the session token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Backend answered with a non-success status
    #[error("API error {status}: {detail}")]
    Api {
        /// HTTP status
        status: StatusCode,
        /// Backend-provided detail, or the canonical reason
        detail: String,
    },

    /// Request rejected before it was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body exceeds the configured limit
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured maximum, in bytes
        limit: usize,
    },

    /// Dev proxy failure
    #[error("Proxy error: {0}")]
    Proxy(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create an API error from a status and detail message
    pub fn api(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    /// HTTP status associated with this error, if it came from the backend
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}
