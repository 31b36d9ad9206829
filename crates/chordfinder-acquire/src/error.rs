//! Error types for fetching and source extraction.

use thiserror::Error;

/// Failure of a single outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {code}")]
    HttpStatus { code: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unknown charset: {0}")]
    UnknownCharset(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus { code: status.as_u16() }
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failure of one source adapter.
///
/// `NotFound` means the site answered with a well-formed page that had
/// nothing usable; every other variant is an error.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),
}

impl SourceError {
    pub fn parse(msg: impl Into<String>) -> Self {
        SourceError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        SourceError::NotFound(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::Fetch(FetchError::InvalidUrl(err.to_string()))
    }
}
