//! Error types for the search library.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Failures of a single outbound request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connect or read exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// DNS failure, refused connection, TLS failure and the like.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Body could not be read or decompressed.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::ConnectionFailed(err.to_string())
        }
    }
}

/// A listing row or response that did not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required field was absent from a row.
    #[error("missing {0}")]
    MissingField(&'static str),

    /// The response as a whole could not be read.
    #[error("{0}")]
    Malformed(String),
}

/// Errors that can occur during search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Fetching a page failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Search timeout exceeded.
    #[error("Search timeout exceeded")]
    Timeout,

    /// No engines configured.
    #[error("No search engines configured")]
    NoEngines,

    /// An engine task panicked.
    #[error("engine panicked: {0}")]
    Panicked(String),
}

impl From<ParseError> for SearchError {
    fn from(err: ParseError) -> Self {
        SearchError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Parse(err.to_string())
    }
}
