//! Program-load hook
//!
//! Ties the pieces together for one program load: classify, let the operator
//! decide (re-classifying after every remap or refresh), then sync the
//! library and rewrite the text.

use crate::classifier::{analyze, Classification};
use crate::interaction::{Decision, MappingSummary, OperatorPrompt};
use crate::remap::{apply_remap, plan_remap, reconcile_session};
use crate::rewriter::{rewrite_program, RewriteOptions, RewriteResult, TranslationMap};
use crate::sync::{sync_library, SyncReport};
use atcmap_core::{ManualMappings, PocketOverride, ToolId};
use atcmap_settings::{
    load_library_or_default, load_settings_or_default, magazine_capacity_or_default, Store,
    TranslatorSettings,
};

/// Information about the program being loaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadContext {
    /// File name shown to the operator
    pub file_name: String,
}

impl LoadContext {
    /// Context for a named file
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// A program after translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedProgram {
    /// Rewritten text and change counts
    pub rewrite: RewriteResult,
    /// Map the text was rewritten with
    pub translation_map: TranslationMap,
    /// Classification the operator accepted
    pub classification: Classification,
    /// What was written back to the library
    pub sync: SyncReport,
}

/// Result of a program load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Load the program as it was
    Original(String),
    /// Load the rewritten program
    Translated(TranslatedProgram),
    /// Do not load anything
    Aborted,
}

impl LoadOutcome {
    /// Text to load, or `None` when aborted
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Original(text) => Some(text),
            Self::Translated(program) => Some(program.rewrite.text),
            Self::Aborted => None,
        }
    }
}

/// Translates tool numbers in programs as they are loaded
pub struct ToolTranslator<S, P> {
    store: S,
    prompt: P,
}

impl<S: Store, P: OperatorPrompt> ToolTranslator<S, P> {
    /// Create a translator over a store and an operator prompt
    pub fn new(store: S, prompt: P) -> Self {
        Self { store, prompt }
    }

    /// The injected store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The injected prompt
    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Classify a program against the current stores without prompting
    pub async fn analyze(&self, content: &str, session: &ManualMappings) -> Classification {
        let library = load_library_or_default(&self.store).await;
        let settings = load_settings_or_default(&self.store).await;
        analyze(
            content,
            &library,
            &settings.manual_tool_mappings.overlay(session),
        )
    }

    /// Handle a program load
    pub async fn on_program_load(&self, content: &str, context: &LoadContext) -> LoadOutcome {
        let mut settings = load_settings_or_default(&self.store).await;
        tracing::info!("Tool number translation enabled: {}", settings.enable_translation);
        if !settings.enable_translation {
            return LoadOutcome::Original(content.to_string());
        }

        let mut session = self
            .reconcile(&ManualMappings::new(), &ManualMappings::new())
            .await;
        let mut classification = self.analyze(content, &session).await;
        if classification.is_empty() {
            tracing::info!("No tool changes found in {}", context.file_name);
            return LoadOutcome::Original(content.to_string());
        }

        loop {
            let capacity = magazine_capacity_or_default(&self.store).await;
            let summary = MappingSummary::new(
                context.file_name.clone(),
                classification.clone(),
                capacity,
                session.clone(),
            );

            let decision = self.prompt.show(&summary).await.unwrap_or(Decision::Bypass);
            tracing::debug!("Operator decision: {:?}", decision);

            let previous = session.clone();
            match decision {
                Decision::Bypass => {
                    tracing::info!("Tool mapping bypassed, loading original program");
                    return LoadOutcome::Original(content.to_string());
                }
                Decision::Cancel => {
                    tracing::info!("Program load cancelled");
                    return LoadOutcome::Aborted;
                }
                Decision::Map => break,
                Decision::Remap { tool_id, pocket } => {
                    self.remap(tool_id, pocket, capacity, &mut session).await;
                }
                Decision::Refresh { session_mappings } => {
                    if let Some(mappings) = session_mappings {
                        session = mappings;
                    }
                }
            }
            session = self.reconcile(&session, &previous).await;

            settings = load_settings_or_default(&self.store).await;
            classification = self.analyze(content, &session).await;
            tracing::info!(
                "Status after refresh: {}, in magazine: {}, manual: {}, unknown: {}",
                classification.status(),
                classification.in_magazine.len(),
                classification.needs_manual_change.len(),
                classification.unknown.len()
            );
        }

        LoadOutcome::Translated(self.translate(content, classification, &settings).await)
    }

    async fn reconcile(
        &self,
        incoming: &ManualMappings,
        previous: &ManualMappings,
    ) -> ManualMappings {
        let library = load_library_or_default(&self.store).await;
        let settings = load_settings_or_default(&self.store).await;
        let capacity = magazine_capacity_or_default(&self.store).await;
        reconcile_session(
            incoming,
            previous,
            &library,
            &settings.manual_tool_mappings,
            capacity,
        )
    }

    async fn remap(
        &self,
        tool: ToolId,
        target: PocketOverride,
        capacity: u32,
        session: &mut ManualMappings,
    ) {
        let library = load_library_or_default(&self.store).await;
        let settings = load_settings_or_default(&self.store).await;
        let plan = match plan_remap(
            tool,
            target,
            &library,
            &settings.manual_tool_mappings,
            session,
            capacity,
        ) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("Cannot move {} to {}: {}", tool, target, e);
                return;
            }
        };
        if let Err(e) = apply_remap(&self.store, &plan, session).await {
            tracing::warn!("Failed to save mapping for {}: {}", tool, e);
        }
    }

    async fn translate(
        &self,
        content: &str,
        classification: Classification,
        settings: &TranslatorSettings,
    ) -> TranslatedProgram {
        let sync = sync_library(&self.store, &classification).await;
        let translation_map = TranslationMap::from_classification(&classification);
        let options = RewriteOptions {
            annotation_label: settings.annotation_label.clone(),
        };
        let rewrite = rewrite_program(content, &translation_map, &options);
        TranslatedProgram {
            rewrite,
            translation_map,
            classification,
            sync,
        }
    }
}
