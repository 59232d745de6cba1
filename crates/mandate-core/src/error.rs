//! # Error Types
//!
//! Errors shared across the workspace. All use `thiserror`.
//!
//! Contract-level failures (unauthorized callers, duplicate references, ...)
//! live in `mandate-contract` next to the transitions that produce them.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum MandateError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A digest string could not be parsed.
    #[error("invalid digest {value:?}: {reason}")]
    InvalidDigest {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An identifier failed validation.
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be integers in the asset's minor unit.
    #[error("float values are not permitted in canonical representations; use an integer amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
