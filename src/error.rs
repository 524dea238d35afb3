//! Error types for the Civet library.
//!
//! This module provides error handling for all Civet operations. All errors
//! are represented by the [`CivetError`] enum, which carries enough detail to
//! tell configuration mistakes apart from missing data and from problems in
//! the wrapped store.
//!
//! # Examples
//!
//! ```
//! use civet::error::{CivetError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     // Return an error
//!     Err(CivetError::config("term vectors are not stored"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Civet operations.
///
/// Construction-time failures (`Config`, some `Unsupported`) abort adapter
/// creation entirely; per-call failures are returned to the immediate caller
/// and never retried, since the wrapped store is assumed immutable and local.
#[derive(Error, Debug)]
pub enum CivetError {
    /// I/O errors from the wrapped store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required capability or field was missing at open time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A structure or feature was requested that this adapter mode does not provide.
    #[error("Unsupported capability: {0}")]
    Unsupported(String),

    /// A term, term id or document id was required but is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An invariant of the wrapped store does not hold.
    #[error("Corrupted index: {0}")]
    Corrupted(String),

    /// An operation was invoked in a state that does not allow it.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Errors reported by the wrapped segment store.
    #[error("Store error: {0}")]
    Store(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with CivetError.
pub type Result<T> = std::result::Result<T, CivetError>;

impl CivetError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        CivetError::Config(msg.into())
    }

    /// Create a new unsupported-capability error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        CivetError::Unsupported(msg.into())
    }

    /// Create a new not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        CivetError::NotFound(msg.into())
    }

    /// Create a new corrupted-index error.
    pub fn corrupted<S: Into<String>>(msg: S) -> Self {
        CivetError::Corrupted(msg.into())
    }

    /// Create a new invalid-operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        CivetError::InvalidOperation(msg.into())
    }

    /// Create a new store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        CivetError::Store(msg.into())
    }
}
