//! # ATCMap
//!
//! Translates the tool numbers a CAM package writes into G-code (`M6 T12`)
//! into the pocket numbers of an automatic tool changer's magazine
//! (`M6 T3`), using a persisted tool library and operator overrides.
//!
//! ## Architecture
//!
//! ATCMap is organized as a workspace with multiple crates:
//!
//! 1. **atcmap-core** - Tool records, tool library, manual pocket mappings, errors
//! 2. **atcmap-settings** - Settings, machine configuration, the injectable store
//! 3. **atcmap-translator** - Scanner, classifier, rewriter, remap, sync, load hook
//! 4. **atcmap** - Console binary driving the operator loop over stdin

pub mod console;

pub use atcmap_core::{
    Error, ManualMappings, MappingState, PocketOverride, Result, ToolId, ToolLibrary, ToolRecord,
};
pub use atcmap_settings::{JsonFileStore, MemoryStore, Store, TranslatorSettings};
pub use atcmap_translator::{
    Classification, Decision, LoadContext, LoadOutcome, MappingSummary, OperatorPrompt, Status,
    ToolTranslator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Initialize logging with the default configuration
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(LogFormat::Text, tracing::Level::INFO)
}

/// Initialize logging
///
/// Events go to stderr so that stdout can carry the translated program.
/// `RUST_LOG` directives are honoured on top of `level`.
pub fn init_logging_with(format: LogFormat, level: tracing::Level) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    match format {
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
