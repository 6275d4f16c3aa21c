use crate::common::ScriptedPrompt;
use atcmap_core::{PocketOverride, ToolId};
use atcmap_settings::{JsonFileStore, Store};
use atcmap_translator::{Decision, LoadContext, ToolTranslator};

#[tokio::test]
async fn test_remap_and_map_against_json_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tools.json"),
        r#"[
            { "id": 12, "toolNumber": 1, "name": "6mm flat", "type": "flat", "diameter": 6.0, "vendor": "x" },
            { "id": 4, "toolNumber": null, "name": "chamfer", "type": "v-bit", "diameter": 12.0 }
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{ "tool": { "count": 4 } }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("plugin-settings.json"),
        r#"{ "enableToolNumberTranslation": true, "manualToolMappings": { "null": 2 } }"#,
    )
    .unwrap();

    let store = JsonFileStore::new(dir.path());
    let prompt = ScriptedPrompt::answering(vec![
        Decision::Remap {
            tool_id: ToolId(4),
            pocket: PocketOverride::Pocket(1),
        },
        Decision::Map,
    ]);
    let translator = ToolTranslator::new(store, prompt);

    let text = translator
        .on_program_load("M6 T12\n(T4 chamfer)\nM6 T4\n", &LoadContext::new("job.nc"))
        .await
        .into_text()
        .unwrap();
    assert_eq!(text, "M6 T12\n(T1 [Fusion: tool 4] chamfer)\nM6 T1\n");

    let tools = translator.store().load_tools().await.unwrap();
    assert_eq!(tools[0].id, ToolId(12));
    assert_eq!(tools[0].pocket_number, None);
    assert_eq!(tools[0].extra.get("vendor"), Some(&serde_json::json!("x")));
    assert_eq!(tools[1].pocket_number, Some(1));

    let raw = std::fs::read_to_string(dir.path().join("plugin-settings.json")).unwrap();
    let settings: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(settings["manualToolMappings"]["4"], 1);
    assert_eq!(settings["manualToolMappings"]["12"], -1);
    assert!(settings["manualToolMappings"].get("null").is_none());

    let shown = translator.prompt().shown();
    assert_eq!(shown[0].magazine_capacity, 4);
}
