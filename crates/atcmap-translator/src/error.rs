//! Error types for the translator crate.

use atcmap_core::{MappingError, ToolId};
use atcmap_settings::SettingsError;
use thiserror::Error;

/// Errors raised while remapping pockets or driving a translation pass.
///
/// Scanning, classification and rewriting never fail; they only see text.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The requested pocket assignment is not valid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A store read or write failed where the operation cannot continue.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Tool identifier zero is not a tool.
    #[error("{0} is not a valid tool")]
    InvalidTool(ToolId),
}

impl From<TranslateError> for atcmap_core::Error {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::Mapping(e) => atcmap_core::Error::Mapping(e),
            TranslateError::Settings(e) => e.into(),
            other => atcmap_core::Error::other(other.to_string()),
        }
    }
}

/// Result type alias for translator operations.
pub type TranslateResult<T> = Result<T, TranslateError>;
