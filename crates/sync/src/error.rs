//! Error types for the synchronization layer.
//!
//! None of these cross a store boundary as an `Err`: stores convert every
//! failure into a log line plus an entry in their error slot (see
//! [`crate::stores`]). Error slots hold `Arc<SyncError>` so state snapshots
//! stay cheap to clone.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the remote service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed (connection refused, DNS, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A created record came back without a server-assigned identifier.
    #[error("server response is missing an identifier")]
    MissingIdentifier,
}

/// Errors that can occur when reading or writing the persistent cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be used as a storage address.
    #[error("invalid cache key: {0:?}")]
    InvalidKey(String),

    /// The snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A failure recorded by a store.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote service failure.
    #[error("remote: {0}")]
    Remote(#[from] RemoteError),

    /// Persistent cache failure.
    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    /// The operation did not settle in time.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl SyncError {
    /// Whether the failure came from the remote service (including timeouts).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Timeout(_))
    }
}
