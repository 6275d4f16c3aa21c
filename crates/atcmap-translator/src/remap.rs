//! Pocket remapping
//!
//! Moving a tool into a pocket that another tool already holds swaps the two:
//! the occupant takes the moved tool's old pocket, or leaves the magazine if
//! the moved tool had none. Planning is pure. Applying the plan writes the
//! tool library once (the whole collection) and then the settings once.
//!
//! Tools the library does not know cannot hold a persisted pocket. Their
//! assignments live in the session mappings for the current pass only.

use crate::error::{TranslateError, TranslateResult};
use atcmap_core::{ManualMappings, MappingError, MappingState, PocketOverride, ToolId, ToolLibrary};
use atcmap_settings::Store;

/// Changes needed to move one tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapPlan {
    /// Tool being moved
    pub tool: Option<ToolId>,
    /// Pocket the tool held before the move
    pub previous_pocket: Option<u32>,
    /// Tools pushed out of their pocket and where they go
    pub displaced: Vec<(ToolId, Option<u32>)>,
    /// Library pocket changes, applied in one write
    pub library_updates: Vec<(ToolId, Option<u32>)>,
    /// Persisted override changes (`None` removes the override)
    pub persisted_updates: Vec<(ToolId, Option<PocketOverride>)>,
    /// Session override changes (`None` removes the override)
    pub session_updates: Vec<(ToolId, Option<PocketOverride>)>,
}

impl RemapPlan {
    /// Whether the tool library needs a write
    pub fn touches_library(&self) -> bool {
        !self.library_updates.is_empty()
    }

    /// Whether the settings need a write
    pub fn touches_settings(&self) -> bool {
        !self.persisted_updates.is_empty()
    }

    /// Apply the library changes to an in-memory library
    pub fn apply_to_library(&self, library: &mut ToolLibrary) -> usize {
        let mut updated = 0;
        for &(tool, pocket) in &self.library_updates {
            match library.set_pocket(tool, pocket) {
                Some(previous) if previous != pocket => updated += 1,
                Some(_) => {}
                None => tracing::warn!("{} is no longer in the tool library", tool),
            }
        }
        updated
    }

    /// Apply the persisted override changes
    pub fn apply_to_persisted(&self, mappings: &mut ManualMappings) {
        apply_overrides(mappings, &self.persisted_updates);
    }

    /// Apply the session override changes
    pub fn apply_to_session(&self, mappings: &mut ManualMappings) {
        apply_overrides(mappings, &self.session_updates);
    }
}

fn apply_overrides(mappings: &mut ManualMappings, updates: &[(ToolId, Option<PocketOverride>)]) {
    for &(tool, value) in updates {
        match value {
            Some(value) => {
                mappings.set(tool, value);
            }
            None => {
                mappings.remove(tool);
            }
        }
    }
}

/// Pocket a tool resolves to after overrides
pub fn effective_pocket(tool: ToolId, library: &ToolLibrary, mappings: &ManualMappings) -> Option<u32> {
    match mappings.state(tool) {
        MappingState::Pocket(pocket) => Some(pocket),
        MappingState::NotInMagazine => None,
        MappingState::Unset => library.pocket_of(tool),
    }
}

/// Check a pocket against the magazine size
pub fn validate_pocket(pocket: u32, capacity: u32) -> Result<(), MappingError> {
    if pocket == 0 || pocket > capacity {
        return Err(MappingError::PocketOutOfRange { pocket, capacity });
    }
    Ok(())
}

/// Plan moving `tool` to `target`.
///
/// `persisted` are the overrides stored in the settings and `session` the
/// overrides held for this pass only; `session` wins where both name a tool.
pub fn plan_remap(
    tool: ToolId,
    target: PocketOverride,
    library: &ToolLibrary,
    persisted: &ManualMappings,
    session: &ManualMappings,
    capacity: u32,
) -> TranslateResult<RemapPlan> {
    if tool.0 == 0 {
        return Err(TranslateError::InvalidTool(tool));
    }
    if let PocketOverride::Pocket(pocket) = target {
        validate_pocket(pocket, capacity)?;
    }

    let effective = persisted.overlay(session);
    let pocket_of = |t: ToolId| effective_pocket(t, library, &effective);
    let previous = pocket_of(tool);

    let mut others: Vec<ToolId> = library.iter().map(|r| r.id).collect();
    for (t, _) in effective.iter() {
        if !others.contains(&t) {
            others.push(t);
        }
    }
    others.retain(|&t| t != tool);

    let mut displaced: Vec<(ToolId, Option<u32>)> = Vec::new();
    if let Some(pocket) = target.pocket() {
        let mut handoff = previous.filter(|&old| old != pocket);
        for &t in &others {
            if pocket_of(t) == Some(pocket) {
                displaced.push((t, handoff.take()));
            }
        }
        // Anything else still sitting in the handed-off pocket has to leave.
        if let Some(old) = displaced.first().and_then(|(_, dest)| *dest) {
            for &t in &others {
                if pocket_of(t) == Some(old) && !displaced.iter().any(|(d, _)| *d == t) {
                    displaced.push((t, None));
                }
            }
        }
    }

    let mut plan = RemapPlan {
        tool: Some(tool),
        previous_pocket: previous,
        displaced: displaced.clone(),
        ..Default::default()
    };

    record_change(&mut plan, tool, target, library, persisted, session, true);
    for &(t, dest) in &displaced {
        let value = PocketOverride::from_pocket(dest);
        record_change(&mut plan, t, value, library, persisted, session, false);
    }

    let assigned: Vec<u32> = target
        .pocket()
        .into_iter()
        .chain(displaced.iter().filter_map(|(_, dest)| *dest))
        .collect();
    let changed: Vec<ToolId> = std::iter::once(tool)
        .chain(displaced.iter().map(|(t, _)| *t))
        .collect();
    for record in library.iter() {
        if changed.contains(&record.id) {
            continue;
        }
        if record.pocket_number.is_some_and(|p| assigned.contains(&p)) {
            plan.library_updates.push((record.id, None));
        }
    }

    tracing::debug!(
        "Remap {} to {}: {} displaced, {} library update(s)",
        tool,
        target,
        plan.displaced.len(),
        plan.library_updates.len()
    );
    Ok(plan)
}

fn record_change(
    plan: &mut RemapPlan,
    tool: ToolId,
    value: PocketOverride,
    library: &ToolLibrary,
    persisted: &ManualMappings,
    session: &ManualMappings,
    requested: bool,
) {
    if library.contains(tool) {
        if library.pocket_of(tool) != value.pocket() {
            plan.library_updates.push((tool, value.pocket()));
        }
        plan.persisted_updates.push((tool, Some(value)));
        if session.contains(tool) {
            plan.session_updates.push((tool, None));
        }
        return;
    }

    // A displaced session-only tool with nowhere to go drops its override
    // and is unknown again.
    let session_value = if requested || value.pocket().is_some() {
        Some(value)
    } else {
        None
    };
    plan.session_updates.push((tool, session_value));
    if persisted.contains(tool) {
        plan.persisted_updates.push((tool, None));
    }
}

fn claimants_of(pocket: u32, library: &ToolLibrary, effective: &ManualMappings) -> Vec<ToolId> {
    let mut tools = library.occupants_of(pocket);
    for tool in effective.tools_in_pocket(pocket) {
        if !tools.contains(&tool) {
            tools.push(tool);
        }
    }
    tools.retain(|&t| effective_pocket(t, library, effective) == Some(pocket));
    tools
}

fn first_collision(
    session: &ManualMappings,
    library: &ToolLibrary,
    persisted: &ManualMappings,
) -> Option<(u32, Vec<ToolId>)> {
    let effective = persisted.overlay(session);
    let mut pockets: Vec<u32> = library
        .iter()
        .filter_map(|r| r.pocket_number)
        .chain(effective.iter().filter_map(|(_, value)| value.pocket()))
        .collect();
    pockets.sort_unstable();
    pockets.dedup();
    pockets
        .into_iter()
        .map(|pocket| (pocket, claimants_of(pocket, library, &effective)))
        .find(|(_, tools)| tools.len() > 1)
}

fn claim_rank(
    tool: ToolId,
    session: &ManualMappings,
    previous: &ManualMappings,
    persisted: &ManualMappings,
) -> u8 {
    match session.get(tool) {
        Some(value) if previous.get(tool) != Some(value) => 0,
        Some(_) => 1,
        None if persisted.contains(tool) => 2,
        None => 3,
    }
}

/// Check session mappings handed back by the operator.
///
/// Pockets outside the magazine are dropped. When two tools resolve to the
/// same pocket the most recent choice keeps it: a changed session entry,
/// then an unchanged one, then a persisted override, then the library. The
/// other tool takes the winner's old pocket if that is free, otherwise it
/// leaves the magazine for this pass. Nothing is written to the stores.
pub fn reconcile_session(
    incoming: &ManualMappings,
    previous: &ManualMappings,
    library: &ToolLibrary,
    persisted: &ManualMappings,
    capacity: u32,
) -> ManualMappings {
    let mut session: ManualMappings = incoming
        .iter()
        .filter(|&(tool, value)| {
            if tool.0 == 0 {
                tracing::warn!("Dropping session mapping for {}: not a tool", tool);
                return false;
            }
            match value.pocket().map(|pocket| validate_pocket(pocket, capacity)) {
                Some(Err(e)) => {
                    tracing::warn!("Dropping session mapping for {}: {}", tool, e);
                    false
                }
                _ => true,
            }
        })
        .collect();

    let before = persisted.overlay(previous);
    while let Some((pocket, claimants)) = first_collision(&session, library, persisted) {
        let Some(winner) = claimants
            .iter()
            .copied()
            .min_by_key(|&t| claim_rank(t, &session, previous, persisted))
        else {
            break;
        };
        let mut handoff = effective_pocket(winner, library, &before)
            .filter(|&old| old != pocket && validate_pocket(old, capacity).is_ok());

        for loser in claimants.into_iter().filter(|&t| t != winner) {
            let effective = persisted.overlay(&session);
            let dest = handoff
                .take()
                .filter(|&old| claimants_of(old, library, &effective).is_empty());
            match dest {
                Some(old) => {
                    session.set(loser, PocketOverride::Pocket(old));
                }
                None if library.contains(loser) || persisted.contains(loser) => {
                    session.set(loser, PocketOverride::NotInMagazine);
                }
                None => {
                    session.remove(loser);
                }
            }
            tracing::warn!(
                "{} and {} both resolved to pocket {}; {} now {}",
                winner,
                loser,
                pocket,
                loser,
                dest.map_or_else(|| "out of the magazine".to_string(), |p| format!("in pocket {}", p))
            );
        }
    }

    session
}

/// Apply a plan: one tool library write, then one settings write, then the
/// session changes.
///
/// The library and settings are re-read right before writing so edits made
/// elsewhere are kept.
pub async fn apply_remap<S: Store + ?Sized>(
    store: &S,
    plan: &RemapPlan,
    session: &mut ManualMappings,
) -> TranslateResult<()> {
    if plan.touches_library() {
        let mut library = ToolLibrary::from_records(store.load_tools().await?);
        let updated = plan.apply_to_library(&mut library);
        store.save_tools(&library.into_records()).await?;
        tracing::info!("Updated {} tool pocket(s) in library", updated);
    }

    if plan.touches_settings() {
        let mut settings = store.load_settings().await?;
        plan.apply_to_persisted(&mut settings.manual_tool_mappings);
        store.save_settings(&settings).await?;
    }

    plan.apply_to_session(session);
    Ok(())
}
