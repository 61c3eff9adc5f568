// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Portable multi-song bundles.

use serde_json::Value;

use crate::error::ImportError;
use crate::store::migrate::{split_payload, VersionedSongs};
use crate::store::{Catalogue, CatalogueFile, CURRENT_VERSION};

/// A bundle is the catalogue's persisted shape, possibly restricted to some songs
pub type Bundle = CatalogueFile;

/// Result of a pre-import check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    /// The declared version as written in the file, or `"unknown"`
    pub version_label: String,
    pub song_count: usize,
}

/// Build a current-version bundle from all songs, or only the named ones
pub fn export_bundle(songs: &Catalogue, scope: Option<&[String]>) -> Bundle {
    let songs = match scope {
        None => songs.clone(),
        Some(names) => names
            .iter()
            .filter_map(|name| songs.get(name).map(|e| (name.clone(), e.clone())))
            .collect(),
    };
    Bundle {
        version: CURRENT_VERSION,
        songs,
    }
}

/// Pretty-printed bundle text
pub fn bundle_to_json(bundle: &Bundle) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(bundle)
}

/// Parse bundle text of any generation into its song map
pub fn parse_bundle(text: &str) -> Result<VersionedSongs, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    parse_bundle_value(&value)
}

/// Recognize the song map in already-parsed bundle JSON
pub fn parse_bundle_value(value: &Value) -> Result<VersionedSongs, ImportError> {
    split_payload(value).ok_or(ImportError::InvalidFile)
}

/// Check bundle text before importing it. Empty bundles are rejected.
pub fn inspect_bundle(text: &str) -> Result<BundleSummary, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let songs = parse_bundle_value(&value)?;
    if songs.songs.is_empty() {
        return Err(ImportError::InvalidFile);
    }
    let version_label = match value.get("version") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    };
    Ok(BundleSummary {
        version_label,
        song_count: songs.songs.len(),
    })
}

/// File-system safe name: reserved and control characters become spaces,
/// runs of whitespace collapse to `_`
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                ' '
            } else {
                c
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `<label>_<stamp>.json`, falling back to `songbook` for an empty label
pub fn export_file_name(label: &str, stamp: &str) -> String {
    let base = sanitize_file_name(label);
    let base = if base.is_empty() { "songbook".to_string() } else { base };
    let stamp = sanitize_file_name(stamp);
    if stamp.is_empty() {
        format!("{}.json", base)
    } else {
        format!("{}_{}.json", base, stamp)
    }
}
