// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Schema generations and the upgrade chain between them.
//!
//! | Generation | Song entry shape |
//! |---|---|
//! | 1 | `[{id, note, fingering}, ...]` (optionally unwrapped: a bare name map) |
//! | 2 | `{notes}` |
//! | 3 | `{notes, transpose}` |
//! | 4 | `{notes, transpose, category}` |
//! | 5 | `{notes, transpose, category, subcategory}` |
//! | 6 | `{transpose, category, subcategory, sections, arrangement}` |
//!
//! Each step only adds what its generation introduced, so a v7 is one more
//! entry appended to [`MIGRATIONS`].

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::catalogue::{Catalogue, CatalogueEntry};
use crate::document::{SectionId, StoredDocument};

/// Generation written by this version of the software
pub const CURRENT_VERSION: u32 = 6;

/// Oldest generation still readable
pub const OLDEST_VERSION: u32 = 1;

/// Store key for a generation, e.g. `ocarina.songs.v6`
pub fn storage_key(version: u32) -> String {
    format!("ocarina.songs.v{}", version)
}

/// Every generation's key, newest first
pub fn all_storage_keys() -> Vec<String> {
    (OLDEST_VERSION..=CURRENT_VERSION)
        .rev()
        .map(storage_key)
        .collect()
}

/// Raw song map as found in a payload
pub type SongMap = Map<String, Value>;

/// One upgrade step on a single song entry
pub struct Migration {
    /// Generation this step reads
    pub from: u32,
    /// What the step adds
    pub describe: &'static str,
    /// Returns `None` when the entry is not shaped like `from`
    pub upgrade: fn(Value) -> Option<Value>,
}

/// The full chain, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        from: 1,
        describe: "note events to plain note list",
        upgrade: events_to_notes,
    },
    Migration {
        from: 2,
        describe: "transpose",
        upgrade: add_transpose,
    },
    Migration {
        from: 3,
        describe: "category",
        upgrade: add_category,
    },
    Migration {
        from: 4,
        describe: "subcategory",
        upgrade: add_subcategory,
    },
    Migration {
        from: 5,
        describe: "single General section",
        upgrade: wrap_in_section,
    },
];

fn events_to_notes(entry: Value) -> Option<Value> {
    let Value::Array(events) = entry else {
        return None;
    };
    let notes: Vec<Value> = events
        .into_iter()
        .filter_map(|e| match e.get("note") {
            Some(Value::String(n)) if !n.is_empty() => Some(Value::String(n.clone())),
            _ => None,
        })
        .collect();
    Some(json!({ "notes": notes }))
}

fn with_default(entry: Value, key: &str, keep: fn(&Value) -> bool, default: Value) -> Option<Value> {
    let Value::Object(mut obj) = entry else {
        return None;
    };
    if !obj.get(key).map(keep).unwrap_or(false) {
        obj.insert(key.to_string(), default);
    }
    Some(Value::Object(obj))
}

fn add_transpose(entry: Value) -> Option<Value> {
    let Value::Object(mut obj) = entry else {
        return None;
    };
    let transpose = coerce_transpose(obj.get("transpose"));
    obj.insert("transpose".to_string(), json!(transpose));
    Some(Value::Object(obj))
}

/// Numbers are rounded and clamped into `i32`; anything else is 0
fn coerce_transpose(value: Option<&Value>) -> i64 {
    let clamp = |n: i64| n.clamp(i32::MIN as i64, i32::MAX as i64);
    match value {
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => clamp(i),
            (None, Some(_), _) => i32::MAX as i64,
            (None, None, Some(f)) if f.is_finite() => {
                clamp(f.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
            }
            _ => 0,
        },
        _ => 0,
    }
}

fn coerce_notes(notes: Vec<Value>) -> Vec<Value> {
    notes
        .into_iter()
        .filter_map(|n| match n {
            Value::String(s) => Some(Value::String(s)),
            Value::Null => None,
            other => Some(Value::String(other.to_string())),
        })
        .collect()
}

/// Loosely typed current-generation fields: wrong-typed transpose, category
/// and subcategory take their defaults, non-string notes are stringified and
/// unusable sections or arrangement entries are dropped.
fn coerce_fields(entry: Value) -> Option<Value> {
    let entry = add_transpose(entry)?;
    let entry = add_category(entry)?;
    let Value::Object(mut obj) = add_subcategory(entry)? else {
        return None;
    };
    let sections = match obj.remove("sections") {
        Some(Value::Object(sections)) => sections
            .into_iter()
            .filter_map(|(id, section)| {
                let Value::Object(mut section) = section else {
                    return None;
                };
                if !section.get("name").map(Value::is_string).unwrap_or(true) {
                    section.remove("name");
                }
                let notes = match section.remove("notes") {
                    Some(Value::Array(notes)) => coerce_notes(notes),
                    _ => Vec::new(),
                };
                section.insert("notes".to_string(), Value::Array(notes));
                Some((id, Value::Object(section)))
            })
            .collect(),
        _ => Map::new(),
    };
    let arrangement: Vec<Value> = match obj.remove("arrangement") {
        Some(Value::Array(instances)) => instances
            .into_iter()
            .filter(|inst| inst.get("sectionId").map(Value::is_string).unwrap_or(false))
            .collect(),
        _ => Vec::new(),
    };
    obj.insert("sections".to_string(), Value::Object(sections));
    obj.insert("arrangement".to_string(), Value::Array(arrangement));
    Some(Value::Object(obj))
}

fn add_category(entry: Value) -> Option<Value> {
    with_default(entry, "category", Value::is_string, json!(""))
}

fn add_subcategory(entry: Value) -> Option<Value> {
    with_default(entry, "subcategory", Value::is_string, json!(""))
}

fn wrap_in_section(entry: Value) -> Option<Value> {
    let Value::Object(mut obj) = entry else {
        return None;
    };
    if obj.contains_key("sections") && obj.contains_key("arrangement") {
        obj.remove("notes");
        return Some(Value::Object(obj));
    }
    let notes: Vec<String> = match obj.remove("notes") {
        Some(Value::Array(notes)) => coerce_notes(notes)
            .into_iter()
            .filter_map(|n| n.as_str().map(str::to_string))
            .collect(),
        _ => return None,
    };
    let stored = StoredDocument::single_section(SectionId::generate().as_str(), notes);
    let stored = serde_json::to_value(stored).ok()?;
    if let Value::Object(doc) = stored {
        obj.extend(doc);
    }
    Some(Value::Object(obj))
}

/// Generation an entry's shape belongs to. `declared` refines the
/// note-list shapes (2 through 5), which look alike.
pub fn entry_generation(declared: Option<u32>, entry: &Value) -> Option<u32> {
    match entry {
        Value::Array(_) => Some(1),
        Value::Object(obj) if obj.contains_key("sections") && obj.contains_key("arrangement") => {
            Some(CURRENT_VERSION)
        }
        Value::Object(obj) if obj.get("notes").map(Value::is_array).unwrap_or(false) => {
            match declared {
                Some(v) if (2..CURRENT_VERSION).contains(&v) => Some(v),
                _ => Some(2),
            }
        }
        _ => None,
    }
}

/// Run the chain from `from` up to the current generation
pub fn upgrade_entry(from: u32, mut entry: Value) -> Option<Value> {
    for step in MIGRATIONS.iter().filter(|m| m.from >= from) {
        entry = (step.upgrade)(entry)?;
    }
    Some(entry)
}

/// Bring one song entry of any generation to a current entry
pub fn normalize_entry(declared: Option<u32>, entry: &Value) -> Option<CatalogueEntry> {
    let generation = entry_generation(declared, entry)?;
    let upgraded = coerce_fields(upgrade_entry(generation, entry.clone())?)?;
    match serde_json::from_value::<CatalogueEntry>(upgraded) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("song entry does not parse after upgrade: {}", e);
            None
        }
    }
}

/// A payload's song map and the generation it declares
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedSongs {
    /// `None` for a bare name map or an unknown version
    pub declared: Option<u32>,
    pub songs: SongMap,
}

/// Recognize `{version, songs}` wrappers of any generation, or a bare song map.
/// A wrapper whose `songs` is not a map is rejected.
pub fn split_payload(value: &Value) -> Option<VersionedSongs> {
    let obj = value.as_object()?;
    if obj.contains_key("version") {
        let songs = obj.get("songs")?.as_object()?;
        let declared = obj
            .get("version")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .filter(|v| (OLDEST_VERSION..=CURRENT_VERSION).contains(v));
        return Some(VersionedSongs {
            declared,
            songs: songs.clone(),
        });
    }
    Some(VersionedSongs {
        declared: None,
        songs: obj.clone(),
    })
}

/// Upgrade a whole song map. Malformed or unnamed entries are dropped.
pub fn migrate_songs(payload: &VersionedSongs) -> (Catalogue, usize) {
    let mut out = BTreeMap::new();
    let mut skipped = 0;
    for (name, entry) in &payload.songs {
        if name.trim().is_empty() {
            skipped += 1;
            continue;
        }
        match normalize_entry(payload.declared, entry) {
            Some(parsed) => {
                out.insert(name.clone(), parsed);
            }
            None => {
                warn!("skipping malformed song entry \"{}\"", name);
                skipped += 1;
            }
        }
    }
    (out, skipped)
}
