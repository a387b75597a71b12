//! Error types for websift.
//!
//! Transport and conversion failures are modelled as their own error types so
//! that coordinators can turn them into per-item [`ItemFailure`] records
//! instead of failing a whole batch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::config::RetryConfig;

/// The main error type for websift operations that are not per-item.
#[derive(Debug, Error)]
pub enum WebsiftError {
    /// A fetch failed.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// A document conversion failed.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error raised by a [`Fetcher`](crate::protocols::Fetcher).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, TLS, proxy or body read failure.
    #[error("Network error fetching {url}: {message}")]
    Network {
        /// The requested URL.
        url: String,
        /// Transport error message.
        message: String,
    },

    /// The request exceeded its timeout budget.
    #[error("Timed out fetching {url} after {timeout_ms}ms")]
    Timeout {
        /// The requested URL.
        url: String,
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// The server answered with a non-2xx status.
    #[error("Unexpected status {status} fetching {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL could not be parsed.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parse error message.
        message: String,
    },
}

impl FetchError {
    /// Creates a network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// The URL the failed request targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. }
            | Self::Timeout { url, .. }
            | Self::Status { url, .. }
            | Self::InvalidUrl { url, .. } => url,
        }
    }

    /// Whether the failure happened before a response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Whether another attempt may succeed under the given retry policy.
    #[must_use]
    pub fn is_retryable(&self, retry: &RetryConfig) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => retry.should_retry_status(*status),
            Self::InvalidUrl { .. } => false,
        }
    }
}

/// Error raised when a fetched document cannot be converted to text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Conversion failed: {message}")]
pub struct ConversionError {
    /// The error message.
    pub message: String,
}

impl ConversionError {
    /// Creates a new conversion error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Category of a per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network error or timeout.
    Transport,
    /// Non-2xx response or unusable URL.
    Status,
    /// Document conversion failed.
    Conversion,
    /// The worker running the item panicked or was aborted.
    Worker,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Status => "status",
            Self::Conversion => "conversion",
            Self::Worker => "worker",
        };
        f.write_str(name)
    }
}

/// A failure attached to a single query or URL.
///
/// Coordinators record these instead of propagating errors, so one bad item
/// never aborts its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} failure: {detail}")]
pub struct ItemFailure {
    /// The failure category.
    pub kind: FailureKind,
    /// Human readable detail.
    pub detail: String,
}

impl ItemFailure {
    /// Creates a new item failure.
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Creates a worker failure from a join error message.
    #[must_use]
    pub fn worker(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Worker, detail)
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind.to_string()));
        map.insert("detail".to_string(), serde_json::json!(self.detail));
        map
    }
}

impl From<FetchError> for ItemFailure {
    fn from(err: FetchError) -> Self {
        let kind = if err.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Status
        };
        Self::new(kind, err.to_string())
    }
}

impl From<ConversionError> for ItemFailure {
    fn from(err: ConversionError) -> Self {
        Self::new(FailureKind::Conversion, err.message)
    }
}
