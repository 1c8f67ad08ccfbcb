//! Error types for asset-localizer
//!
//! Two layers of errors exist:
//! - [`Error`] is returned by fallible crate operations (construction, serialization).
//!   It is fatal for the call that produced it.
//! - [`FetchError`] describes a single failed fetch attempt. It never escapes the
//!   fetch orchestrator: every attempt outcome is folded into a
//!   [`FetchResult`](crate::types::FetchResult) value.

use thiserror::Error;

/// Result type alias for asset-localizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for asset-localizer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "proxy")
        key: Option<String>,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure of a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status code
    #[error("HTTP status {status}")]
    Status {
        /// Numeric status code returned by the server
        status: u16,
    },

    /// The request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The resource URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Reading or writing the local copy failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A proxied attempt was requested but no proxy is configured
    #[error("no proxy configured")]
    NoProxy,
}

impl FetchError {
    /// First line of the error message, used in progress reports
    pub fn summary(&self) -> String {
        let message = self.to_string();
        match message.lines().next() {
            Some(line) if !line.trim().is_empty() => line.to_string(),
            _ => "unknown error".to_string(),
        }
    }
}
