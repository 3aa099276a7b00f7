//! # Validation Errors
//!
//! Input-shape failures detected before any registry state is consulted.
//! The registry wraps these in its own error type; they are never retried.

use thiserror::Error;

/// A value failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The holder is the null principal.
    #[error("holder must not be the null principal")]
    InvalidHolder,

    /// Category id `0` is reserved.
    #[error("category id 0 is reserved")]
    InvalidCategory,

    /// The off-registry content pointer is empty.
    #[error("content reference must not be empty")]
    EmptyContent,

    /// A category name is empty.
    #[error("category name must not be empty")]
    EmptyName,

    /// A principal address could not be parsed.
    #[error("invalid principal address {input:?}: {reason}")]
    MalformedPrincipal {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
