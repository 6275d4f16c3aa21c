use crate::common::ScriptedPrompt;
use async_trait::async_trait;
use atcmap_core::{ManualMappings, PocketOverride, ToolId, ToolRecord};
use atcmap_settings::{MemoryStore, TranslatorSettings};
use atcmap_translator::{
    Bucket, Decision, LoadContext, LoadOutcome, MappingSummary, OperatorPrompt, Status,
    ToolTranslator, TranslationMap,
};
use parking_lot::Mutex;
use std::sync::Arc;

const PROGRAM: &str = "(T12 6mm flat)\nM6 T12\nG43 H12\nM6 T5\nM6 T99\nM30\n";

fn store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_tools(vec![
                ToolRecord::new(12, "6mm flat").with_pocket(3),
                ToolRecord::new(5, "drill"),
            ])
            .with_magazine_capacity(6),
    )
}

fn context() -> LoadContext {
    LoadContext::new("part.nc")
}

fn assert_one_tool_per_pocket(map: &TranslationMap) {
    let mut pockets: Vec<u32> = map.iter().map(|(_, pocket)| pocket).collect();
    let total = pockets.len();
    pockets.sort_unstable();
    pockets.dedup();
    assert_eq!(pockets.len(), total, "pocket shared in {:?}", map);
}

#[tokio::test]
async fn test_disabled_translation_returns_original() {
    let store = store();
    store.replace_settings_externally(TranslatorSettings {
        enable_translation: false,
        ..Default::default()
    });
    let translator = ToolTranslator::new(store, ScriptedPrompt::answering(vec![Decision::Map]));

    let outcome = translator.on_program_load(PROGRAM, &context()).await;
    assert_eq!(outcome, LoadOutcome::Original(PROGRAM.to_string()));
    assert_eq!(translator.prompt().times_shown(), 0);
}

#[tokio::test]
async fn test_program_without_tool_changes_is_not_shown() {
    let translator = ToolTranslator::new(store(), ScriptedPrompt::answering(vec![Decision::Map]));
    let program = "G0 X0 Y0\n(T12 in a comment only)\nM30";

    let outcome = translator.on_program_load(program, &context()).await;
    assert_eq!(outcome, LoadOutcome::Original(program.to_string()));
    assert_eq!(translator.prompt().times_shown(), 0);
}

#[tokio::test]
async fn test_dismissed_prompt_bypasses() {
    let translator = ToolTranslator::new(store(), ScriptedPrompt::new(vec![None]));
    let outcome = translator.on_program_load(PROGRAM, &context()).await;
    assert_eq!(outcome, LoadOutcome::Original(PROGRAM.to_string()));
}

#[tokio::test]
async fn test_cancel_aborts() {
    let store = store();
    let translator =
        ToolTranslator::new(store.clone(), ScriptedPrompt::answering(vec![Decision::Cancel]));
    let outcome = translator.on_program_load(PROGRAM, &context()).await;
    assert_eq!(outcome, LoadOutcome::Aborted);
    assert_eq!(store.tool_writes(), 0);
}

#[tokio::test]
async fn test_map_translates_known_tools_only() {
    let translator = ToolTranslator::new(store(), ScriptedPrompt::answering(vec![Decision::Map]));
    let outcome = translator.on_program_load(PROGRAM, &context()).await;

    let LoadOutcome::Translated(program) = outcome else {
        panic!("expected a translated program");
    };
    assert_eq!(
        program.rewrite.text,
        "(T3 [Fusion: tool 12] 6mm flat)\nM6 T3\nG43 H3\nM6 T5\nM6 T99\nM30\n"
    );
    assert_eq!(program.rewrite.tool_numbers, 1);
    assert_eq!(program.rewrite.comments, 1);
    assert_eq!(program.classification.status(), Status::Blocking);

    let summary = &translator.prompt().shown()[0];
    assert_eq!(summary.file_name, "part.nc");
    assert_eq!(summary.magazine_capacity, 6);
    assert_eq!(summary.free_pockets(), vec![1, 2, 4, 5, 6]);
}

#[tokio::test]
async fn test_refresh_applies_session_mappings() {
    let store = store();
    let session: ManualMappings = [(ToolId(99), PocketOverride::Pocket(5))]
        .into_iter()
        .collect();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Refresh {
            session_mappings: Some(session),
        },
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let outcome = translator.on_program_load(PROGRAM, &context()).await;
    let text = outcome.into_text().unwrap();
    assert!(text.contains("M6 T5\nM6 T5\n"));

    let shown = translator.prompt().shown();
    assert_eq!(shown[1].status, Status::NeedsAttention);
    assert_eq!(
        shown[1].classification.bucket_of(ToolId(99)),
        Some(Bucket::InMagazine)
    );
    assert_eq!(store.tool_writes(), 0);
}

#[tokio::test]
async fn test_remap_of_library_tool_persists_and_syncs() {
    let store = store();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Remap {
            tool_id: ToolId(5),
            pocket: PocketOverride::Pocket(3),
        },
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let text = translator
        .on_program_load(PROGRAM, &context())
        .await
        .into_text()
        .unwrap();
    // Tool 5 took pocket 3; tool 12 had to leave because tool 5 had no pocket.
    assert!(text.contains("M6 T12\nG43 H12\nM6 T3\n"));

    let tools = store.tools();
    let pocket = |id: u32| {
        tools
            .iter()
            .find(|t| t.id == ToolId(id))
            .and_then(|t| t.pocket_number)
    };
    assert_eq!(pocket(5), Some(3));
    assert_eq!(pocket(12), None);
}

#[tokio::test]
async fn test_invalid_remap_is_ignored() {
    let store = store();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Remap {
            tool_id: ToolId(5),
            pocket: PocketOverride::Pocket(7),
        },
        Decision::Bypass,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let outcome = translator.on_program_load(PROGRAM, &context()).await;
    assert_eq!(outcome, LoadOutcome::Original(PROGRAM.to_string()));
    assert_eq!(translator.prompt().times_shown(), 2);
    assert_eq!(store.tool_writes(), 0);
    assert_eq!(store.settings_writes(), 0);
}

#[tokio::test]
async fn test_read_failures_degrade_to_defaults() {
    let store = store();
    store.set_fail_reads(true);
    let translator =
        ToolTranslator::new(store.clone(), ScriptedPrompt::answering(vec![Decision::Map]));

    let LoadOutcome::Translated(program) = translator.on_program_load(PROGRAM, &context()).await
    else {
        panic!("expected a translated program");
    };
    assert_eq!(program.rewrite.text, PROGRAM);
    assert_eq!(program.classification.unknown.len(), 3);
    assert!(program.sync.failure.is_some());
    assert_eq!(translator.prompt().shown()[0].magazine_capacity, 8);
}

#[tokio::test]
async fn test_sync_write_failure_does_not_stop_translation() {
    let store = store();
    store.set_fail_writes(true);
    let session: ManualMappings = [(ToolId(5), PocketOverride::Pocket(2))]
        .into_iter()
        .collect();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Refresh {
            session_mappings: Some(session),
        },
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let LoadOutcome::Translated(program) = translator.on_program_load(PROGRAM, &context()).await
    else {
        panic!("expected a translated program");
    };
    assert!(program.rewrite.text.contains("M6 T2\n"));
    assert_eq!(program.sync.assigned, vec![(ToolId(5), 2)]);
    assert!(!program.sync.saved);
    assert!(program.sync.failure.is_some());
}

/// Prompt that edits the library behind the translator's back on first show.
struct EditingPrompt {
    store: Arc<MemoryStore>,
    rounds: Mutex<Vec<MappingSummary>>,
}

#[async_trait]
impl OperatorPrompt for EditingPrompt {
    async fn show(&self, summary: &MappingSummary) -> Option<Decision> {
        let mut rounds = self.rounds.lock();
        rounds.push(summary.clone());
        if rounds.len() == 1 {
            self.store.replace_tools_externally(vec![
                ToolRecord::new(12, "6mm flat").with_pocket(3),
                ToolRecord::new(5, "drill").with_pocket(1),
                ToolRecord::new(99, "engraver").with_pocket(2),
            ]);
            return Some(Decision::Refresh {
                session_mappings: None,
            });
        }
        Some(Decision::Map)
    }
}

#[tokio::test]
async fn test_refresh_rereads_external_edits() {
    let store = store();
    let prompt = EditingPrompt {
        store: store.clone(),
        rounds: Mutex::new(Vec::new()),
    };
    let translator = ToolTranslator::new(store.clone(), prompt);

    let text = translator
        .on_program_load(PROGRAM, &context())
        .await
        .into_text()
        .unwrap();
    assert!(text.contains("M6 T1\nM6 T2\n"));

    let rounds = translator.prompt().rounds.lock();
    assert_eq!(rounds[0].status, Status::Blocking);
    assert_eq!(rounds[1].status, Status::Ready);
}

#[tokio::test]
async fn test_refresh_onto_occupied_pocket_keeps_pockets_unique() {
    let store = store();
    let session: ManualMappings = [(ToolId(99), PocketOverride::Pocket(3))]
        .into_iter()
        .collect();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Refresh {
            session_mappings: Some(session),
        },
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let LoadOutcome::Translated(program) = translator
        .on_program_load("M6 T12\nM6 T99", &context())
        .await
    else {
        panic!("expected a translated program");
    };
    assert_one_tool_per_pocket(&program.translation_map);
    assert_eq!(program.rewrite.text, "M6 T12\nM6 T3");
    assert_eq!(
        program.classification.bucket_of(ToolId(12)),
        Some(Bucket::NeedsManualChange)
    );

    // The library no longer claims pocket 3 for tool 12; settings are untouched.
    assert_eq!(store.settings_writes(), 0);
    let tools = store.tools();
    let twelve = tools.iter().find(|t| t.id == ToolId(12)).unwrap();
    assert_eq!(twelve.pocket_number, None);
}

#[tokio::test]
async fn test_persisted_override_sharing_library_pocket_is_resolved() {
    let store = store();
    let mut settings = TranslatorSettings::default();
    settings
        .manual_tool_mappings
        .set(ToolId(99), PocketOverride::Pocket(3));
    store.replace_settings_externally(settings);
    let translator = ToolTranslator::new(store.clone(), ScriptedPrompt::answering(vec![Decision::Map]));

    let LoadOutcome::Translated(program) = translator.on_program_load(PROGRAM, &context()).await
    else {
        panic!("expected a translated program");
    };
    assert_one_tool_per_pocket(&program.translation_map);
    assert_eq!(program.translation_map.get(ToolId(99)), Some(3));
    assert_eq!(program.translation_map.get(ToolId(12)), None);
    assert!(program.rewrite.text.contains("M6 T12\nG43 H12\nM6 T5\nM6 T3\n"));

    let first = &translator.prompt().shown()[0];
    assert_eq!(
        first.session_mappings.get(ToolId(12)),
        Some(PocketOverride::NotInMagazine)
    );
}

#[tokio::test]
async fn test_refresh_drops_pockets_beyond_the_magazine() {
    let store = store();
    let session: ManualMappings = [(ToolId(99), PocketOverride::Pocket(42))]
        .into_iter()
        .collect();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Refresh {
            session_mappings: Some(session),
        },
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let LoadOutcome::Translated(program) = translator.on_program_load("M6 T99", &context()).await
    else {
        panic!("expected a translated program");
    };
    assert_eq!(program.rewrite.text, "M6 T99");
    assert_eq!(program.classification.bucket_of(ToolId(99)), Some(Bucket::Unknown));

    let shown = translator.prompt().shown();
    assert!(shown[1].session_mappings.is_empty());
}

#[tokio::test]
async fn test_bare_refresh_keeps_session_mappings() {
    let store = store();
    let refresh = Decision::from_payload(&serde_json::json!({ "action": "refresh" })).unwrap();
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Remap {
            tool_id: ToolId(70),
            pocket: PocketOverride::Pocket(4),
        },
        refresh,
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store.clone(), prompt);

    let text = translator
        .on_program_load("M6 T70", &context())
        .await
        .into_text()
        .unwrap();
    assert_eq!(text, "M6 T4");

    let shown = translator.prompt().shown();
    assert_eq!(shown.len(), 3);
    assert_eq!(
        shown[2].session_mappings.get(ToolId(70)),
        Some(PocketOverride::Pocket(4))
    );
}
