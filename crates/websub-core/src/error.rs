//! Core error types.

use thiserror::Error;

/// Core hub errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Outbound HTTP call failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure of an outbound HTTP call: no response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
    },

    /// The URL could not be parsed.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// Target URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Connection, protocol or body-read failure.
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying failure.
        reason: String,
    },
}

/// Protocol-level validation failure, surfaced synchronously to the caller.
///
/// The `Display` output is the exact message returned with the Bad Request
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// A required request parameter was absent.
    #[error("Missing required parameter value for {0}")]
    MissingParameter(&'static str),

    /// `hub.mode` was absent or not one of the supported intents.
    #[error("Unsupported value for hub.mode: {0}")]
    UnsupportedMode(String),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
