//! # ATCMap Core
//!
//! Core types for ATCMap.
//! Provides the persisted tool library model, the manual pocket mapping
//! model, and the error types shared across the workspace.

pub mod data;
pub mod error;

pub use data::{
    ManualMappings, MappingState, PocketOverride, ToolId, ToolLibrary, ToolMetadata, ToolOffsets,
    ToolRecord, ToolType, NOT_IN_MAGAZINE,
};

pub use error::{Error, MappingError, Result, StoreError};
