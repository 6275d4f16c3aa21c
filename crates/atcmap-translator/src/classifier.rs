//! Classifier
//!
//! Buckets each scanned tool as in-magazine, needs-manual-change or unknown.
//! A manual override takes precedence over the library; the library's pocket
//! is used otherwise.

use crate::scanner::{scan_program, ToolReference};
use atcmap_core::{ManualMappings, MappingState, ToolId, ToolLibrary};
use serde::{Deserialize, Serialize};

/// Where a referenced tool ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    /// Tool has a pocket and can be changed automatically
    InMagazine,
    /// Tool is known but has no pocket
    NeedsManualChange,
    /// Tool is not in the library
    Unknown,
}

/// Overall status of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Every tool is in the magazine
    Ready,
    /// Some tools need a manual change
    NeedsAttention,
    /// Some tools are not in the library
    Blocking,
}

impl Status {
    /// Short heading for the operator
    pub fn title(self) -> &'static str {
        match self {
            Self::Ready => "All Tools Ready for ATC",
            Self::NeedsAttention => "Manual Tool Changes Required",
            Self::Blocking => "Tools Not Found in Library",
        }
    }

    /// Explanation for the operator
    pub fn message(self, classification: &Classification) -> String {
        match self {
            Self::Ready => "All tools are in the tool library and assigned to magazine pockets. \
                 Tool numbers will be mapped to pocket numbers."
                .to_string(),
            Self::NeedsAttention => format!(
                "{} tool(s) are in the tool library but not in the magazine. \
                 These will require manual tool changes.",
                classification.needs_manual_change.len()
            ),
            Self::Blocking => format!(
                "{} tool(s) are not in the tool library. If you map tools, known tools \
                 will be translated and unknown tools will remain as-is.",
                classification.unknown.len()
            ),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::NeedsAttention => write!(f, "needs attention"),
            Self::Blocking => write!(f, "blocking"),
        }
    }
}

/// Result of classifying a program's tool references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Every referenced tool, in first-use order
    pub all: Vec<ToolReference>,
    /// Tools with a resolved pocket
    pub in_magazine: Vec<ToolReference>,
    /// Known tools without a pocket, or forced out of the magazine
    pub needs_manual_change: Vec<ToolReference>,
    /// Tools not in the library
    pub unknown: Vec<ToolReference>,
    /// Referenced tools the library knows about (display only)
    pub in_library: Vec<ToolId>,
}

impl Classification {
    /// Overall status
    pub fn status(&self) -> Status {
        if !self.unknown.is_empty() {
            Status::Blocking
        } else if !self.needs_manual_change.is_empty() {
            Status::NeedsAttention
        } else {
            Status::Ready
        }
    }

    /// Nothing to translate
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Bucket holding a tool, if the program references it
    pub fn bucket_of(&self, tool: ToolId) -> Option<Bucket> {
        let holds = |refs: &[ToolReference]| refs.iter().any(|r| r.tool == tool);
        if holds(&self.in_magazine) {
            Some(Bucket::InMagazine)
        } else if holds(&self.needs_manual_change) {
            Some(Bucket::NeedsManualChange)
        } else if holds(&self.unknown) {
            Some(Bucket::Unknown)
        } else {
            None
        }
    }

    /// Reference for a tool, if the program uses it
    pub fn reference(&self, tool: ToolId) -> Option<&ToolReference> {
        self.all.iter().find(|r| r.tool == tool)
    }
}

/// Classify scanned references.
///
/// Pure: the same inputs always give the same classification.
pub fn classify(
    references: &[ToolReference],
    library: &ToolLibrary,
    mappings: &ManualMappings,
) -> Classification {
    let mut classification = Classification::default();

    for reference in references {
        let mut reference = reference.clone();
        reference.entry = library.get(reference.tool).cloned();
        reference.has_override = mappings.contains(reference.tool);
        let known = reference.entry.is_some();

        let bucket = match mappings.state(reference.tool) {
            MappingState::Pocket(pocket) => {
                reference.pocket = Some(pocket);
                Bucket::InMagazine
            }
            MappingState::NotInMagazine => {
                reference.pocket = None;
                Bucket::NeedsManualChange
            }
            MappingState::Unset if known => {
                reference.pocket = library.pocket_of(reference.tool);
                if reference.pocket.is_some() {
                    Bucket::InMagazine
                } else {
                    Bucket::NeedsManualChange
                }
            }
            MappingState::Unset => {
                reference.pocket = None;
                Bucket::Unknown
            }
        };

        tracing::debug!(
            "{} classified as {:?} (pocket {:?})",
            reference.tool,
            bucket,
            reference.pocket
        );

        if known {
            classification.in_library.push(reference.tool);
        }
        match bucket {
            Bucket::InMagazine => classification.in_magazine.push(reference.clone()),
            Bucket::NeedsManualChange => classification.needs_manual_change.push(reference.clone()),
            Bucket::Unknown => classification.unknown.push(reference.clone()),
        }
        classification.all.push(reference);
    }

    classification
}

/// Scan and classify a program in one step
pub fn analyze(program: &str, library: &ToolLibrary, mappings: &ManualMappings) -> Classification {
    classify(&scan_program(program, library, mappings), library, mappings)
}
