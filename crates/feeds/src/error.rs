//! Error types for odds sources.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching or parsing odds.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to read odds source: {0}")]
    Io(String),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Sport not supported: {0}")]
    UnsupportedSport(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Io(_) | FeedError::Timeout(_))
    }

    /// Returns true if retrying can never help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            FeedError::ParseError(_) | FeedError::UnsupportedSport(_)
        )
    }

    /// Returns a suggested retry delay, or None for permanent errors.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::Io(_) => Some(Duration::from_secs(5)),
            FeedError::Timeout(_) => Some(Duration::from_secs(2)),
            FeedError::ParseError(_) | FeedError::UnsupportedSport(_) => None,
        }
    }
}
