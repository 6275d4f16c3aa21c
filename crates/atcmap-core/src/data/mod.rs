//! Data models
//!
//! Tool library records and the operator's manual pocket overrides.

pub mod mappings;
pub mod tools;

pub use mappings::{ManualMappings, MappingState, PocketOverride, NOT_IN_MAGAZINE};
pub use tools::{ToolId, ToolLibrary, ToolMetadata, ToolOffsets, ToolRecord, ToolType};
