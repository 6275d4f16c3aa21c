use atcmap_core::{ManualMappings, PocketOverride, ToolId, ToolLibrary, ToolRecord};
use atcmap_translator::{
    analyze, effective_pocket, plan_remap, reconcile_session, rewrite_program, RewriteOptions, Status,
    TranslationMap,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn program_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..20).prop_map(|t| format!("M6 T{t}")),
        (1u32..20).prop_map(|t| format!("T{t} M06")),
        (1u32..20).prop_map(|t| format!("G43 H{t} Z5")),
        (1u32..20).prop_map(|t| format!("(T{t} tool comment)")),
        "[GXYZ0-9 .;()-]{0,20}",
    ]
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(program_line(), 0..20).prop_map(|lines| lines.join("\n"))
}

fn library() -> impl Strategy<Value = ToolLibrary> {
    prop::collection::btree_map(1u32..20, prop::option::of(1u32..10), 0..12).prop_map(|tools| {
        tools
            .into_iter()
            .map(|(id, pocket)| {
                let record = ToolRecord::new(id, format!("tool {id}"));
                match pocket {
                    Some(p) => record.with_pocket(p),
                    None => record,
                }
            })
            .collect()
    })
}

fn mappings() -> impl Strategy<Value = ManualMappings> {
    prop::collection::btree_map(1u32..20, prop::option::of(1u32..10), 0..6).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, pocket)| (ToolId(id), PocketOverride::from_pocket(pocket)))
            .collect()
    })
}

proptest! {
    #[test]
    fn proptest_empty_map_is_identity(text in any::<String>()) {
        let result = rewrite_program(&text, &TranslationMap::new(), &RewriteOptions::default());
        prop_assert_eq!(result.text, text);
    }

    #[test]
    fn proptest_unmapped_program_is_unchanged(text in program()) {
        let map: TranslationMap = [(ToolId(500), 1)].into_iter().collect();
        let result = rewrite_program(&text, &map, &RewriteOptions::default());
        prop_assert_eq!(result.text, text);
    }

    #[test]
    fn proptest_buckets_partition_references(
        text in program(),
        library in library(),
        mappings in mappings(),
    ) {
        let classification = analyze(&text, &library, &mappings);
        let mut seen = HashSet::new();
        for reference in classification
            .in_magazine
            .iter()
            .chain(&classification.needs_manual_change)
            .chain(&classification.unknown)
        {
            prop_assert!(seen.insert(reference.tool));
        }
        let all: HashSet<ToolId> = classification.all.iter().map(|r| r.tool).collect();
        prop_assert_eq!(seen, all);
        prop_assert_eq!(classification.all.len(), classification_len(&classification));

        if !classification.unknown.is_empty() {
            prop_assert_eq!(classification.status(), Status::Blocking);
        }
    }

    #[test]
    fn proptest_classification_is_repeatable(
        text in program(),
        library in library(),
        mappings in mappings(),
    ) {
        prop_assert_eq!(
            analyze(&text, &library, &mappings),
            analyze(&text, &library, &mappings)
        );
    }

    #[test]
    fn proptest_remaps_keep_pockets_unique(
        pockets in Just((1u32..=6).collect::<Vec<_>>()).prop_shuffle(),
        loaded in prop::collection::vec(any::<bool>(), 6),
        moves in prop::collection::vec((1u32..=9, prop::option::of(1u32..=8)), 1..12),
    ) {
        // Tools 1..=6 are in the library with distinct pockets; 7..=9 are not.
        let mut library: ToolLibrary = (1u32..=6)
            .map(|id| {
                let record = ToolRecord::new(id, format!("tool {id}"));
                if loaded[(id - 1) as usize] {
                    record.with_pocket(pockets[(id - 1) as usize])
                } else {
                    record
                }
            })
            .collect();
        let mut persisted = ManualMappings::new();
        let mut session = ManualMappings::new();

        for (tool, pocket) in moves {
            let plan = plan_remap(
                ToolId(tool),
                PocketOverride::from_pocket(pocket),
                &library,
                &persisted,
                &session,
                8,
            )
            .unwrap();
            plan.apply_to_library(&mut library);
            plan.apply_to_persisted(&mut persisted);
            plan.apply_to_session(&mut session);

            let effective = persisted.overlay(&session);
            let mut used = HashSet::new();
            for id in 1u32..=9 {
                if let Some(p) = effective_pocket(ToolId(id), &library, &effective) {
                    prop_assert!(used.insert(p), "pocket {} assigned twice", p);
                }
            }
            prop_assert!(library.duplicate_pockets().is_empty());
        }
    }

    #[test]
    fn proptest_reconciled_session_keeps_pockets_unique(
        library in library(),
        persisted in in_range_mappings(8),
        previous in in_range_mappings(8),
        incoming in in_range_mappings(12),
    ) {
        let session = reconcile_session(&incoming, &previous, &library, &persisted, 8);

        for (_, value) in session.iter() {
            if let Some(pocket) = value.pocket() {
                prop_assert!((1..=8).contains(&pocket));
            }
        }

        let effective = persisted.overlay(&session);
        let mut used = HashSet::new();
        for id in 1u32..20 {
            if let Some(p) = effective_pocket(ToolId(id), &library, &effective) {
                prop_assert!(used.insert(p), "pocket {} assigned twice", p);
            }
        }
    }
}

fn in_range_mappings(max_pocket: u32) -> impl Strategy<Value = ManualMappings> {
    prop::collection::btree_map(1u32..20, prop::option::of(1u32..=max_pocket), 0..6).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(id, pocket)| (ToolId(id), PocketOverride::from_pocket(pocket)))
                .collect()
        },
    )
}

fn classification_len(classification: &atcmap_translator::Classification) -> usize {
    classification.in_magazine.len()
        + classification.needs_manual_change.len()
        + classification.unknown.len()
}
