// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for the songbook
//!
//! These tests drive the public API end to end: editing, persistence,
//! migration and exchange between catalogues.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use songbook::document::{Document, Token};
use songbook::editor::{ClickMode, Editor, MemoryClipboard, SilentPreview};
use songbook::exchange::{
    bundle_to_json, encode_share_code, export_bundle, import_bundle, import_share_code,
    ConflictChoice, FixedDecider,
};
use songbook::music::FingeringChart;
use songbook::store::{
    all_storage_keys, storage_key, CatalogueStore, FileStore, KeyValueStore, MemoryStore,
};
use tempfile::tempdir;

fn notes(doc: &Document) -> Vec<String> {
    doc.base_tokens().iter().map(|t| t.to_string()).collect()
}

fn names_in_order(doc: &Document) -> Vec<String> {
    doc.arrangement()
        .iter()
        .filter_map(|inst| doc.section(&inst.section_id).map(|s| s.name.clone()))
        .collect()
}

/// A song with two sections, one placed twice
fn composed() -> Editor {
    let mut editor = Editor::new(Document::create_default(), 0);
    for n in ["C4", "E4", "G4"] {
        editor.insert(Token::from(n));
    }
    editor.insert_break();
    let chorus = editor.create_section("Chorus");
    editor.insert(Token::from("A4"));
    editor.insert_rest();
    let chorus_section = editor.document().instance(&chorus).unwrap().section_id.clone();
    editor.replicate_section(&chorus_section);
    editor
}

#[test]
fn test_transpose_is_display_only() {
    let dir = tempdir().unwrap();
    let mut editor = Editor::new(Document::create_default(), 0);
    for n in ["C4", "—", "D4"] {
        editor.insert(Token::from(n));
    }
    {
        let mut catalogue = CatalogueStore::new(FileStore::open(dir.path()).unwrap());
        catalogue.save("Example", editor.document(), 2, "", "").unwrap();
    }

    let mut catalogue = CatalogueStore::new(FileStore::open(dir.path()).unwrap());
    let loaded = catalogue.load("Example").unwrap();
    let shown: Vec<String> = loaded
        .document
        .display(loaded.transpose, &FingeringChart::builtin())
        .iter()
        .map(|d| d.shown.to_string())
        .collect();
    assert_eq!(shown, vec!["D4", "—", "E4"]);

    let raw = catalogue.store().get(&storage_key(6)).unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    let entry = &value["songs"]["Example"];
    assert_eq!(entry["transpose"], 2);
    let section_id = entry["arrangement"][0]["sectionId"].as_str().unwrap();
    assert_eq!(entry["sections"][section_id]["notes"], json!(["C4", "—", "D4"]));

    // saving the loaded song again does not compound the shift
    catalogue
        .save("Example", &loaded.document, loaded.transpose, "", "")
        .unwrap();
    assert_eq!(notes(&catalogue.load("Example").unwrap().document), vec!["C4", "—", "D4"]);
}

#[test]
fn test_legacy_store_migrates_once() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let v3 = json!({
        "version": 3,
        "songs": {
            "Old": {"notes": ["C4", "SPACE", "D4"], "transpose": -1},
            "Broken": "???"
        }
    });
    store.set(&storage_key(3), &v3.to_string()).unwrap();
    store.set(&storage_key(1), r#"{"Ancient":[{"note":"G4"}]}"#).unwrap();

    let mut catalogue = CatalogueStore::new(store);
    let first = catalogue.read_catalogue();
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["Old"]);
    let old = &first["Old"];
    assert_eq!(old.transpose, -1);
    assert_eq!(old.category, "");
    assert_eq!(old.subcategory, "");

    // written through under the current key; older keys left alone
    assert!(catalogue.store().get(&storage_key(6)).unwrap().is_some());
    assert!(catalogue.store().get(&storage_key(3)).unwrap().is_some());

    let loaded = catalogue.load("Old").unwrap();
    assert_eq!(notes(&loaded.document), vec!["C4", "—", "D4"]);
    assert_eq!(names_in_order(&loaded.document), vec!["General"]);

    let second = catalogue.read_catalogue();
    assert_eq!(first, second);

    catalogue.clear_all().unwrap();
    for key in all_storage_keys() {
        assert!(catalogue.store().get(&key).unwrap().is_none(), "{}", key);
    }
    assert!(catalogue.read_catalogue().is_empty());
}

#[test]
fn test_direct_upgrade_matches_store_migration() {
    let payload = json!({"version": 4, "songs": {"Tune": {"notes": ["E4", "⏎"], "transpose": 3, "category": "Folk"}}});

    let mut store = MemoryStore::new();
    store.set(&storage_key(4), &payload.to_string()).unwrap();
    let mut migrated = CatalogueStore::new(store);
    let via_store = migrated.entry("Tune").unwrap();

    let text = payload.to_string();
    let mut imported = CatalogueStore::new(MemoryStore::new());
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    rt.block_on(import_bundle(&mut imported, &text, &mut FixedDecider::new(ConflictChoice::Skip)))
        .unwrap();
    let via_import = imported.entry("Tune").unwrap();

    assert_eq!(via_store.base_tokens(), via_import.base_tokens());
    assert_eq!(via_store.transpose, 3);
    assert_eq!(via_import.transpose, 3);
    assert_eq!(via_store.category, via_import.category);
}

#[tokio::test]
async fn test_export_import_between_catalogues() {
    let editor = composed();
    let mut source = CatalogueStore::new(MemoryStore::new());
    source.save("Song", editor.document(), 1, "Folk", "Dance").unwrap();
    source.save("Other", &Document::create_default(), 0, "Pop", "").unwrap();

    let songs = source.read_catalogue();
    let folk: Vec<String> = vec!["Song".to_string()];
    let text = bundle_to_json(&export_bundle(&songs, Some(&folk))).unwrap();

    let mut target = CatalogueStore::new(MemoryStore::new());
    let mut decider = FixedDecider::new(ConflictChoice::Overwrite);
    let report = import_bundle(&mut target, &text, &mut decider).await.unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(target.list_names(), vec!["Song"]);

    let loaded = target.load("Song").unwrap();
    assert_eq!(notes(&loaded.document), notes(editor.document()));
    assert_eq!(names_in_order(&loaded.document), vec!["General", "Chorus", "Chorus"]);
    assert_eq!(loaded.document.sections().len(), 2);
    assert_eq!((loaded.category.as_str(), loaded.subcategory.as_str()), ("Folk", "Dance"));

    let again = import_bundle(&mut target, &text, &mut decider).await.unwrap();
    assert_eq!(again.identical, 1);
    assert_eq!(again.written(), 0);
}

#[tokio::test]
async fn test_share_code_between_catalogues() {
    let editor = composed();
    let mut alice = CatalogueStore::new(MemoryStore::new());
    alice.save("Gift", editor.document(), -2, "", "").unwrap();
    let code = encode_share_code("Gift", &alice.entry("Gift").unwrap(), true).unwrap();
    assert!(code.starts_with("OC6GZ:"));

    let dir = tempdir().unwrap();
    let mut bob = CatalogueStore::new(FileStore::open(dir.path()).unwrap());
    let mut decider = FixedDecider::new(ConflictChoice::SaveAs);
    let report = import_share_code(&mut bob, &code, &mut decider).await.unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(bob.transpose_of("Gift"), Some(-2));

    // a changed song with the same name is saved alongside
    let mut edited = Editor::new(bob.load("Gift").unwrap().document, -2);
    edited.insert(Token::from("B4"));
    alice.save("Gift", edited.document(), -2, "", "").unwrap();
    let code = encode_share_code("Gift", &alice.entry("Gift").unwrap(), false).unwrap();
    let report = import_share_code(&mut bob, &code, &mut decider).await.unwrap();
    assert_eq!(report.renamed, 1);
    assert_eq!(bob.list_names(), vec!["Gift", "Gift 1"]);
}

#[test]
fn test_editing_session_round_trips_through_storage() {
    let mut rng = StdRng::seed_from_u64(7);
    let pitches = ["C4", "D4", "E4", "F#4", "G4", "A4", "B4", "C5"];
    let mut editor = Editor::new(Document::create_default(), 0);
    let mut clipboard = MemoryClipboard::new();

    for _ in 0..200 {
        let doc = editor.snapshot();
        let flat = doc.flatten();
        match rng.gen_range(0..10) {
            0..=3 => {
                let p = pitches[rng.gen_range(0..pitches.len())];
                editor.insert(Token::from(p));
            }
            4 => {
                editor.insert_rest();
            }
            5 if !flat.is_empty() => {
                let pick = &flat[rng.gen_range(0..flat.len())];
                let mode = if rng.gen_bool(0.5) { ClickMode::Range } else { ClickMode::Toggle };
                editor.click(&pick.instance_id, &pick.item_id, mode, &mut SilentPreview);
            }
            6 => {
                editor.copy(&mut clipboard);
                editor.paste(&clipboard);
            }
            7 => {
                editor.create_section("Part");
            }
            8 => {
                let sections: Vec<_> = doc.sections().keys().cloned().collect();
                let pick = &sections[rng.gen_range(0..sections.len())];
                if rng.gen_bool(0.5) {
                    editor.replicate_section(pick);
                } else {
                    editor.duplicate_section(pick, "Part");
                }
            }
            _ => {
                let arrangement = doc.arrangement();
                let pick = arrangement[rng.gen_range(0..arrangement.len())].id.clone();
                if rng.gen_bool(0.5) {
                    editor.remove_instance(&pick);
                } else {
                    editor.reorder_instance(&pick, rng.gen_range(0..arrangement.len()));
                }
            }
        }

        let doc = editor.document();
        assert!(!doc.sections().is_empty());
        assert!(!doc.arrangement().is_empty());
        assert!(doc.arrangement().iter().all(|i| doc.section(&i.section_id).is_some()));
        let total: usize = doc.sections().values().map(|s| s.items.len()).sum();
        assert_eq!(doc.item_ids().len(), total, "item ids must be unique");
    }

    let restored = Document::from_storage(&editor.document().to_storage());
    assert_eq!(notes(&restored), notes(editor.document()));
    assert_eq!(names_in_order(&restored), names_in_order(editor.document()));
}

#[test]
fn test_removing_last_section_resets_document() {
    let mut editor = Editor::new(Document::create_default(), 0);
    editor.insert(Token::from("C4"));
    let only = editor.document().arrangement()[0].id.clone();
    assert!(editor.remove_instance(&only));

    let doc = editor.document();
    let fresh = Document::create_default();
    assert_eq!(doc.sections().len(), fresh.sections().len());
    assert_eq!(doc.arrangement().len(), fresh.arrangement().len());
    assert_eq!(names_in_order(doc), names_in_order(&fresh));
    assert!(notes(doc).is_empty());
}
