use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by a [`crate::source::BookingSource`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("upstream rejected the configured credentials (status {status})")]
    Auth { status: u16 },
    #[error("booking `{0}` was not found upstream")]
    NotFound(String),
    #[error("upstream rate limit reached")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("upstream request failed: {message}")]
    Upstream { status: Option<u16>, message: String },
    #[error("unexpected upstream response: {0}")]
    Unexpected(String),
}

impl SourceError {
    /// Whether repeating the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Upstream { status: None, .. } => true,
            Self::Upstream { status: Some(status), .. } => *status >= 500,
            Self::Auth { .. } | Self::NotFound(_) | Self::Unexpected(_) => false,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Auth,
    RateLimited,
    Upstream,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::Unexpected => "unexpected",
        }
    }
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Source(SourceError::Auth { .. }) => ErrorKind::Auth,
            Self::Source(SourceError::NotFound(_)) => ErrorKind::NotFound,
            Self::Source(SourceError::RateLimited { .. }) => ErrorKind::RateLimited,
            Self::Source(SourceError::Upstream { .. }) => ErrorKind::Upstream,
            Self::Source(SourceError::Unexpected(_)) => ErrorKind::Unexpected,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Source(source) => source.is_transient(),
        }
    }

    /// Message safe to hand back to the calling agent.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Source(SourceError::NotFound(number)) => {
                format!("No booking exists with number `{number}`.")
            }
            Self::Source(SourceError::Auth { .. }) => {
                "The booking provider rejected the configured API credentials.".to_string()
            }
            Self::Source(SourceError::RateLimited { retry_after_secs: Some(secs) }) => {
                format!("The booking provider is rate limiting requests. Retry in {secs} seconds.")
            }
            Self::Source(SourceError::RateLimited { retry_after_secs: None }) => {
                "The booking provider is rate limiting requests. Retry shortly.".to_string()
            }
            Self::Source(SourceError::Upstream { .. }) => {
                "The booking provider is temporarily unavailable. Please retry shortly.".to_string()
            }
            Self::Source(SourceError::Unexpected(_)) => {
                "The booking provider returned an unexpected response.".to_string()
            }
        }
    }
}
