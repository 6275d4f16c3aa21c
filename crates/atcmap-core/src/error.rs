//! Error handling for ATCMap
//!
//! Provides the error types shared by every crate in the workspace:
//! - Store errors (tool library / settings persistence)
//! - Mapping errors (invalid pocket assignments)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Persistence error type
///
/// Represents data in one of the externally owned stores that could not be used.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Stored data did not have the expected shape
    #[error("Malformed {store}: {reason}")]
    Malformed {
        /// Which store held the malformed data.
        store: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Pocket mapping error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Pocket number outside of the magazine
    #[error("Pocket {pocket} is outside the magazine (1..={capacity})")]
    PocketOutOfRange {
        /// The requested pocket.
        pocket: u32,
        /// The magazine capacity.
        capacity: u32,
    },

    /// A mapping value that is neither a pocket nor the not-in-magazine sentinel
    #[error("Invalid pocket value: {value}")]
    InvalidPocketValue {
        /// The raw value as read.
        value: i64,
    },

    /// A mapping value that could not be read as a number
    #[error("Unparsable pocket value: {value}")]
    UnparsablePocket {
        /// The raw value as read.
        value: String,
    },
}

/// Main error type for ATCMap
#[derive(Error, Debug)]
pub enum Error {
    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mapping error
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a store error
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Io(_) | Error::Json(_))
    }

    /// Check if this is a mapping error
    pub fn is_mapping_error(&self) -> bool {
        matches!(self, Error::Mapping(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
