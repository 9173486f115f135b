//! Error types for content-safety operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can escape the content-safety pipeline.
///
/// Classifier failures never appear here; they collapse to defaults inside
/// the bank.
#[derive(Debug, Error)]
pub enum ContentSafetyError {
    /// Metrics row could not be written.
    #[error("metrics write failed: {0}")]
    Database(#[from] DatabaseError),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),
}
