//! Error types for the settings crate.
//!
//! This module provides structured error types for settings management,
//! tool library persistence, and validation.

use std::io;
use thiserror::Error;

/// Errors that can occur during settings and store operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A store could not be loaded.
    #[error("Failed to load {0}")]
    LoadError(String),

    /// A store could not be saved.
    #[error("Failed to save {0}")]
    SaveError(String),

    /// A settings value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Stored data does not have the expected shape.
    #[error("Malformed {store}: {reason}")]
    Malformed { store: String, reason: String },

    /// The data directory could not be found or created.
    #[error("Data directory error: {0}")]
    DataDirectory(String),

    /// The settings file format is not supported.
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

impl From<SettingsError> for atcmap_core::Error {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::IoError(e) => atcmap_core::Error::Io(e),
            SettingsError::JsonError(e) => atcmap_core::Error::Json(e),
            SettingsError::Malformed { store, reason } => {
                atcmap_core::StoreError::Malformed { store, reason }.into()
            }
            other => atcmap_core::Error::other(other.to_string()),
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
