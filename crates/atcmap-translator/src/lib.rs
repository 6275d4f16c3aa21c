//! ATCMap Translator
//!
//! Translates CAM tool numbers in G-code into magazine pocket numbers:
//! - [`scanner`]: finds tool-change commands
//! - [`classifier`]: in-magazine / manual change / unknown buckets
//! - [`rewriter`]: substitutes pockets into the text
//! - [`remap`] and [`sync`]: operator overrides and writing them back
//! - [`hook`]: the program-load entry point driving an [`OperatorPrompt`]

pub mod classifier;
pub mod error;
pub mod hook;
pub mod interaction;
pub mod remap;
pub mod rewriter;
pub mod scanner;
pub mod sync;

pub use classifier::{analyze, classify, Bucket, Classification, Status};
pub use error::{TranslateError, TranslateResult};
pub use hook::{LoadContext, LoadOutcome, ToolTranslator, TranslatedProgram};
pub use interaction::{Decision, MappingSummary, OperatorPrompt};
pub use remap::{
    apply_remap, effective_pocket, plan_remap, reconcile_session, validate_pocket, RemapPlan,
};
pub use rewriter::{rewrite_program, RewriteOptions, RewriteResult, TranslationMap};
pub use scanner::{find_tool_change, scan_program, ToolReference};
pub use sync::{sync_library, sync_records, SyncReport};
