//! Error types for base address recovery.
//!
//! Structured with thiserror so callers can match on the failure class.
//! An inconclusive analysis is not an error: it is reported through
//! [`crate::pipeline::BaseEstimate::Inconclusive`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for basefind operations.
#[derive(Debug, Error)]
pub enum BasefindError {
    /// Blob unreadable or missing; raised before any computation.
    #[error("cannot read input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration, rejected before extraction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Arithmetic inconsistency during reconstruction. Cannot occur while
    /// the modulus set is pairwise coprime; treated as an internal defect.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for basefind operations
pub type Result<T> = std::result::Result<T, BasefindError>;
