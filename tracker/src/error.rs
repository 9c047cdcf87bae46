//! Tracker error taxonomy with retry classification.
//!
//! Every failure surfaced by an [`IssueTracker`](crate::IssueTracker) call is
//! represented here. The retry loop asks `retry_category()` instead of
//! matching on status codes or message text.
//!
//! ## Retry categories
//!
//! | Category  | Retriable | Delay                                   |
//! |-----------|-----------|-----------------------------------------|
//! | RateLimit | yes       | server `Retry-After`, else exponential  |
//! | Transient | yes       | exponential                             |
//! | Fatal     | no        | -                                       |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Classification used by [`RetryPolicy`](crate::RetryPolicy) to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Server asked us to slow down.
    RateLimit,
    /// Connection-level failure (timeout, refused, reset).
    Transient,
    /// Anything else. Surfaced to the caller immediately.
    Fatal,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::RateLimit | Self::Transient)
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Transient => write!(f, "transient"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Unified error type for all tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Credentials were rejected (HTTP 401).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit signalled by the server.
    #[error("Rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// The request never produced an HTTP response.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Non-success status that is neither auth nor rate limiting.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Success status, but the body did not match the expected shape.
    #[error("Failed to decode tracker response: {0}")]
    Decode(String),

    /// Client could not be built from the given configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

impl TrackerError {
    /// Classify this error for retry logic.
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::RateLimited { .. } => RetryCategory::RateLimit,
            Self::Transport(_) => RetryCategory::Transient,
            Self::Auth(_) | Self::Http { .. } | Self::Decode(_) | Self::Config(_) => {
                RetryCategory::Fatal
            }
        }
    }

    /// Returns `true` if the retry loop may try again after this error.
    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }

    /// Server-provided wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            // timeouts, connect failures, resets and body read errors
            Self::Transport(err.to_string())
        }
    }
}
