//! HTTP error types

use thiserror::Error;

/// Result type used throughout the crate
pub type HttpResult<T, E = HttpError> = Result<T, E>;

/// Errors that can occur while building or executing a request
#[derive(Debug, Error)]
pub enum HttpError {
    /// The timeout timer expired before the transport completed
    #[error("Request timeout")]
    Timeout,
    /// The underlying transport failed to connect or send
    #[error("Transport error: {0}")]
    Transport(String),
    /// HTTP error with status code
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Malformed request URL
    #[error("Invalid URL: {0}")]
    Url(String),
    /// Invalid use of the request API
    #[error("Invalid request usage: {0}")]
    Misuse(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_connect() {
            HttpError::Transport(err.to_string())
        } else if err.is_decode() {
            HttpError::Serialization(err.to_string())
        } else if let Some(status) = err.status() {
            HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::Url(err.to_string())
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}
