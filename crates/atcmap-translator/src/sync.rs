//! Library synchronizer
//!
//! On a `map` decision, writes the pockets the operator settled on back into
//! the tool library so the next program does not need mapping again. Only
//! tools the library already knows are touched. Failures are logged and the
//! translation carries on.

use crate::classifier::Classification;
use atcmap_core::{ToolId, ToolLibrary};
use atcmap_settings::Store;
use std::collections::HashMap;

/// What a sync changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tools given a new pocket
    pub assigned: Vec<(ToolId, u32)>,
    /// Tools forced out of the magazine whose pocket was cleared
    pub cleared: Vec<ToolId>,
    /// Other tools that still held an assigned pocket
    pub vacated: Vec<ToolId>,
    /// Whether the library was written
    pub saved: bool,
    /// Read or write failure, if any
    pub failure: Option<String>,
}

impl SyncReport {
    /// Number of records changed
    pub fn updates(&self) -> usize {
        self.assigned.len() + self.cleared.len() + self.vacated.len()
    }
}

/// Bring an in-memory library in line with a classification
pub fn sync_records(library: &mut ToolLibrary, classification: &Classification) -> SyncReport {
    let mut report = SyncReport::default();
    let mut owners: HashMap<u32, ToolId> = HashMap::new();

    for reference in &classification.in_magazine {
        let Some(pocket) = reference.pocket else {
            continue;
        };
        if !library.contains(reference.tool) {
            continue;
        }
        owners.insert(pocket, reference.tool);
        if library.pocket_of(reference.tool) != Some(pocket) {
            library.set_pocket(reference.tool, Some(pocket));
            tracing::debug!("Library: {} -> pocket {}", reference.tool, pocket);
            report.assigned.push((reference.tool, pocket));
        }
    }

    for reference in &classification.needs_manual_change {
        if !reference.has_override || library.pocket_of(reference.tool).is_none() {
            continue;
        }
        library.set_pocket(reference.tool, None);
        tracing::debug!("Library: {} -> not in magazine", reference.tool);
        report.cleared.push(reference.tool);
    }

    let stale: Vec<ToolId> = library
        .iter()
        .filter(|record| {
            record
                .pocket_number
                .and_then(|pocket| owners.get(&pocket))
                .is_some_and(|owner| *owner != record.id)
        })
        .map(|record| record.id)
        .collect();
    for tool in stale {
        library.set_pocket(tool, None);
        tracing::debug!("Library: {} vacated", tool);
        report.vacated.push(tool);
    }

    report
}

/// Write the classification's pockets back into the stored library.
///
/// Never fails; see [`SyncReport::failure`].
pub async fn sync_library<S: Store + ?Sized>(
    store: &S,
    classification: &Classification,
) -> SyncReport {
    let records = match store.load_tools().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Error syncing tool library: {}", e);
            return SyncReport {
                failure: Some(e.to_string()),
                ..Default::default()
            };
        }
    };

    let mut library = ToolLibrary::from_records(records);
    let mut report = sync_records(&mut library, classification);
    if report.updates() == 0 {
        tracing::info!("No library updates needed");
        return report;
    }

    match store.save_tools(&library.into_records()).await {
        Ok(()) => {
            report.saved = true;
            tracing::info!("Synced {} tool(s) in library", report.updates());
        }
        Err(e) => {
            tracing::warn!("Error syncing tool library: {}", e);
            report.failure = Some(e.to_string());
        }
    }
    report
}
