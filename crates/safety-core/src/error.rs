//! Error types for model operations.

use thiserror::Error;

/// Errors that can occur while talking to a hosted model.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// The client is misconfigured (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the provider or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered but the body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A classifier answer was neither true nor false.
    #[error("invalid verdict: {0}")]
    InvalidVerdict(String),
}
