//! Operator interaction
//!
//! Defines the prompt interface the translation loop talks to and the
//! decisions an operator can return.

use crate::classifier::{Classification, Status};
use crate::scanner::ToolReference;
use async_trait::async_trait;
use atcmap_core::{ManualMappings, PocketOverride, ToolId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Operator response to a mapping summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    /// Load the program untranslated
    Bypass,
    /// Abort loading
    Cancel,
    /// Translate with the current mapping
    Map,
    /// Move a tool to a pocket (or out of the magazine) and show again
    Remap {
        /// Tool to move
        #[serde(rename = "toolId")]
        tool_id: ToolId,
        /// Destination
        pocket: PocketOverride,
    },
    /// Re-read the stores and show again
    Refresh {
        /// Replacement session overrides; `None` keeps the current ones
        #[serde(default, rename = "sessionMappings")]
        session_mappings: Option<ManualMappings>,
    },
}

impl Decision {
    /// Decode a dialog response.
    ///
    /// Accepts a bare action string or an object with an `action` field.
    /// Anything unrecognized gives `None`, which the loop treats as bypass.
    pub fn from_payload(payload: &Value) -> Option<Decision> {
        if let Value::String(action) = payload {
            return match action.trim().to_ascii_lowercase().as_str() {
                "bypass" => Some(Decision::Bypass),
                "cancel" => Some(Decision::Cancel),
                "map" => Some(Decision::Map),
                "refresh" => Some(Decision::Refresh {
                    session_mappings: None,
                }),
                other => {
                    tracing::warn!("Unrecognized dialog action {:?}", other);
                    None
                }
            };
        }

        match serde_json::from_value(payload.clone()) {
            Ok(decision) => Some(decision),
            Err(e) => {
                tracing::warn!("Unrecognized dialog response: {}", e);
                None
            }
        }
    }
}

/// Everything shown to the operator for one round of the loop
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSummary {
    /// Program file name
    pub file_name: String,
    /// Current classification
    pub classification: Classification,
    /// Overall status
    pub status: Status,
    /// Number of magazine pockets
    pub magazine_capacity: u32,
    /// Overrides held for this pass only
    pub session_mappings: ManualMappings,
}

impl MappingSummary {
    /// Build a summary for a classification
    pub fn new(
        file_name: impl Into<String>,
        classification: Classification,
        magazine_capacity: u32,
        session_mappings: ManualMappings,
    ) -> Self {
        let status = classification.status();
        Self {
            file_name: file_name.into(),
            classification,
            status,
            magazine_capacity,
            session_mappings,
        }
    }

    /// Every pocket in the magazine
    pub fn pockets(&self) -> Vec<u32> {
        (1..=self.magazine_capacity).collect()
    }

    /// Pockets no referenced tool is using
    pub fn free_pockets(&self) -> Vec<u32> {
        let used: Vec<u32> = self
            .classification
            .in_magazine
            .iter()
            .filter_map(|r| r.pocket)
            .collect();
        self.pockets()
            .into_iter()
            .filter(|pocket| !used.contains(pocket))
            .collect()
    }
}

fn write_rows(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    refs: &[ToolReference],
    row: impl Fn(&ToolReference) -> String,
) -> fmt::Result {
    if refs.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "{} ({}):", heading, refs.len())?;
    for reference in refs {
        let marker = if reference.has_override { " *" } else { "" };
        writeln!(
            f,
            "  {:<6} {:<12} {}{}  (line {})",
            reference.tool.to_string(),
            row(reference),
            reference.display_name(),
            marker,
            reference.line
        )?;
    }
    Ok(())
}

impl fmt::Display for MappingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} [{}]", self.file_name, self.status.title(), self.status)?;
        writeln!(f, "{}", self.status.message(&self.classification))?;

        write_rows(f, "In magazine", &self.classification.in_magazine, |r| {
            r.pocket
                .map(|pocket| format!("-> T{}", pocket))
                .unwrap_or_default()
        })?;
        write_rows(
            f,
            "Manual change",
            &self.classification.needs_manual_change,
            |_| "Manual".to_string(),
        )?;
        write_rows(f, "Unknown", &self.classification.unknown, |_| {
            "Unknown".to_string()
        })?;

        let free = self
            .free_pockets()
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f)?;
        write!(
            f,
            "Magazine: {} pocket(s), free: {}",
            self.magazine_capacity,
            if free.is_empty() { "none" } else { free.as_str() }
        )
    }
}

/// Presents a summary to the operator and waits for a decision
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Show the summary. `None` means the prompt was dismissed.
    async fn show(&self, summary: &MappingSummary) -> Option<Decision>;
}
