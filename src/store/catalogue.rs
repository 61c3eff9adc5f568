// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The song catalogue: every saved song, keyed by name.
//!
//! Reads try the current generation's key first and then each older key,
//! newest first. The first older payload that parses is upgraded and written
//! back under the current key, so migration happens once. Reads never fail;
//! an unreadable store is an empty catalogue. Writes report failures to the
//! caller but leave the previous stored value in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::kv::KeyValueStore;
use super::migrate::{
    all_storage_keys, migrate_songs, split_payload, storage_key, CURRENT_VERSION, OLDEST_VERSION,
};
use crate::document::{Document, StoredDocument, Token};
use crate::error::StoreError;
use crate::music::Semitones;

/// One persisted song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    /// Display/playback shift; stored notes are never shifted
    #[serde(default)]
    pub transpose: Semitones,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(flatten)]
    pub document: StoredDocument,
}

impl CatalogueEntry {
    /// Build an entry from a document
    pub fn new(
        document: &Document,
        transpose: Semitones,
        category: &str,
        subcategory: &str,
    ) -> Self {
        Self {
            transpose,
            category: category.trim().to_string(),
            subcategory: subcategory.trim().to_string(),
            document: document.to_storage(),
        }
    }

    /// The flattened base content in arrangement order
    pub fn base_tokens(&self) -> Vec<Token> {
        self.document
            .arrangement
            .iter()
            .filter_map(|inst| self.document.sections.get(&inst.section_id))
            .flat_map(|s| s.notes.iter().map(|n| Token::parse(n)))
            .collect()
    }
}

/// All songs by name
pub type Catalogue = BTreeMap<String, CatalogueEntry>;

/// The persisted wrapper `{version, songs}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueFile {
    pub version: u32,
    pub songs: Catalogue,
}

/// A loaded song ready for editing
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSong {
    pub document: Document,
    pub transpose: Semitones,
    pub category: String,
    pub subcategory: String,
}

/// Name and grouping of a saved song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongSummary {
    pub name: String,
    pub category: String,
    pub subcategory: String,
}

/// Whether a rename may replace an existing song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Refuse when the destination exists
    Refuse,
    /// The user confirmed replacing the destination
    Confirmed,
}

/// Result of a rename request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// Source and destination are the same name
    Unchanged,
    /// No song with the source name
    NotFound,
    /// Destination exists and overwriting was not confirmed
    DestinationExists,
}

/// Sort names case-insensitively, ties broken by the raw name
fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
}

/// Catalogue operations over a host key-value store
#[derive(Debug)]
pub struct CatalogueStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CatalogueStore<S> {
    /// Wrap a host store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Unwrap the host store
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Read every song, migrating older generations forward when needed
    pub fn read_catalogue(&mut self) -> Catalogue {
        if let Some(songs) = self.read_current() {
            return songs;
        }
        for version in (OLDEST_VERSION..CURRENT_VERSION).rev() {
            let Some(songs) = self.read_legacy(version) else {
                continue;
            };
            info!(
                "migrated {} songs from generation {} to {}",
                songs.len(),
                version,
                CURRENT_VERSION
            );
            if let Err(e) = self.write_catalogue(&songs) {
                warn!("could not persist migrated catalogue: {}", e);
            }
            return songs;
        }
        Catalogue::new()
    }

    fn read_raw(&self, version: u32) -> Option<serde_json::Value> {
        let key = storage_key(version);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("could not read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} is not valid JSON: {}", key, e);
                None
            }
        }
    }

    fn read_current(&self) -> Option<Catalogue> {
        let value = self.read_raw(CURRENT_VERSION)?;
        let payload = split_payload(&value)?;
        if payload.declared != Some(CURRENT_VERSION) {
            warn!("current catalogue key holds an unexpected shape");
            return None;
        }
        let (songs, skipped) = migrate_songs(&payload);
        if skipped > 0 {
            warn!("dropped {} unreadable songs from the catalogue", skipped);
        }
        Some(songs)
    }

    fn read_legacy(&self, version: u32) -> Option<Catalogue> {
        let value = self.read_raw(version)?;
        let mut payload = split_payload(&value)?;
        if payload.declared.is_none() {
            payload.declared = Some(version);
        }
        debug!(
            "found generation {} payload under {} ({} entries)",
            payload.declared.unwrap_or(version),
            storage_key(version),
            payload.songs.len()
        );
        Some(migrate_songs(&payload).0)
    }

    /// Persist the full catalogue under the current key only
    pub fn write_catalogue(&mut self, songs: &Catalogue) -> Result<(), StoreError> {
        let file = CatalogueFile {
            version: CURRENT_VERSION,
            songs: songs.clone(),
        };
        let result = serde_json::to_string(&file)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set(&storage_key(CURRENT_VERSION), &json));
        if let Err(e) = &result {
            warn!("catalogue write dropped: {}", e);
        }
        result
    }

    fn update<F>(&mut self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Catalogue),
    {
        let mut songs = self.read_catalogue();
        mutate(&mut songs);
        self.write_catalogue(&songs)
    }

    /// Song names, sorted
    pub fn list_names(&mut self) -> Vec<String> {
        let mut names: Vec<String> = self.read_catalogue().into_keys().collect();
        sort_names(&mut names);
        names
    }

    /// Every song with its grouping, sorted by name
    pub fn list_songs(&mut self) -> Vec<SongSummary> {
        let songs = self.read_catalogue();
        let mut names: Vec<String> = songs.keys().cloned().collect();
        sort_names(&mut names);
        names
            .into_iter()
            .filter_map(|name| {
                songs.get(&name).map(|e| SongSummary {
                    category: e.category.clone(),
                    subcategory: e.subcategory.clone(),
                    name,
                })
            })
            .collect()
    }

    /// Distinct non-empty categories, sorted
    pub fn list_categories(&mut self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .read_catalogue()
            .into_values()
            .map(|e| e.category)
            .filter(|c| !c.is_empty())
            .collect();
        let mut out: Vec<String> = set.into_iter().collect();
        sort_names(&mut out);
        out
    }

    /// Distinct non-empty subcategories used within a category, sorted
    pub fn list_subcategories(&mut self, category: &str) -> Vec<String> {
        let set: BTreeSet<String> = self
            .read_catalogue()
            .into_values()
            .filter(|e| e.category == category)
            .map(|e| e.subcategory)
            .filter(|s| !s.is_empty())
            .collect();
        let mut out: Vec<String> = set.into_iter().collect();
        sort_names(&mut out);
        out
    }

    /// Trim a category and reuse the spelling of an existing one that
    /// matches case-insensitively
    pub fn normalize_category(&mut self, input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        let lower = trimmed.to_lowercase();
        self.list_categories()
            .into_iter()
            .find(|c| c.to_lowercase() == lower)
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Whether a song exists
    pub fn contains(&mut self, name: &str) -> bool {
        self.read_catalogue().contains_key(name)
    }

    /// The stored entry for a song
    pub fn entry(&mut self, name: &str) -> Option<CatalogueEntry> {
        self.read_catalogue().remove(name)
    }

    /// Load a song as a fresh document
    pub fn load(&mut self, name: &str) -> Option<LoadedSong> {
        let entry = self.entry(name)?;
        Some(LoadedSong {
            document: Document::from_storage(&entry.document),
            transpose: entry.transpose,
            category: entry.category,
            subcategory: entry.subcategory,
        })
    }

    /// A song's transpose
    pub fn transpose_of(&mut self, name: &str) -> Option<Semitones> {
        self.entry(name).map(|e| e.transpose)
    }

    /// Save a document under a name, replacing any song with that name
    pub fn save(
        &mut self,
        name: &str,
        document: &Document,
        transpose: Semitones,
        category: &str,
        subcategory: &str,
    ) -> Result<(), StoreError> {
        self.save_entry(name, CatalogueEntry::new(document, transpose, category, subcategory))
    }

    /// Save a prepared entry under a name
    pub fn save_entry(&mut self, name: &str, entry: CatalogueEntry) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidName);
        }
        let name = name.to_string();
        self.update(move |songs| {
            songs.insert(name, entry);
        })
    }

    /// Delete a song. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        let mut songs = self.read_catalogue();
        if songs.remove(name).is_none() {
            return Ok(false);
        }
        self.write_catalogue(&songs)?;
        Ok(true)
    }

    /// Move a song to a new name. An existing destination is only replaced
    /// with [`Overwrite::Confirmed`].
    pub fn rename(
        &mut self,
        from: &str,
        to: &str,
        overwrite: Overwrite,
    ) -> Result<RenameOutcome, StoreError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(StoreError::InvalidName);
        }
        if from == to {
            return Ok(RenameOutcome::Unchanged);
        }
        let mut songs = self.read_catalogue();
        if songs.contains_key(to) && overwrite == Overwrite::Refuse {
            return Ok(RenameOutcome::DestinationExists);
        }
        let Some(entry) = songs.remove(from) else {
            return Ok(RenameOutcome::NotFound);
        };
        songs.insert(to.to_string(), entry);
        self.write_catalogue(&songs)?;
        info!("renamed song \"{}\" to \"{}\"", from, to);
        Ok(RenameOutcome::Renamed)
    }

    fn set_field<F>(&mut self, name: &str, apply: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut CatalogueEntry),
    {
        let mut songs = self.read_catalogue();
        let Some(entry) = songs.get_mut(name) else {
            return Ok(false);
        };
        apply(entry);
        self.write_catalogue(&songs)?;
        Ok(true)
    }

    /// Set one song's category. Returns whether the song exists.
    pub fn set_category(&mut self, name: &str, category: &str) -> Result<bool, StoreError> {
        let category = category.trim().to_string();
        self.set_field(name, move |e| e.category = category)
    }

    /// Set one song's subcategory. Returns whether the song exists.
    pub fn set_subcategory(&mut self, name: &str, subcategory: &str) -> Result<bool, StoreError> {
        let subcategory = subcategory.trim().to_string();
        self.set_field(name, move |e| e.subcategory = subcategory)
    }

    fn rename_group<F, G>(&mut self, matches: F, apply: G) -> Result<usize, StoreError>
    where
        F: Fn(&CatalogueEntry) -> bool,
        G: Fn(&mut CatalogueEntry),
    {
        let mut songs = self.read_catalogue();
        let mut changed = 0;
        for entry in songs.values_mut().filter(|e| matches(e)) {
            apply(entry);
            changed += 1;
        }
        if changed > 0 {
            self.write_catalogue(&songs)?;
        }
        Ok(changed)
    }

    /// Move every song in category `old` to `new`. An empty `new` uncategorizes them.
    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<usize, StoreError> {
        let new = new.trim().to_string();
        self.rename_group(|e| e.category == old, |e| e.category = new.clone())
    }

    /// Move every song with subcategory `old` to `new`. An empty `new` clears it.
    pub fn rename_subcategory(&mut self, old: &str, new: &str) -> Result<usize, StoreError> {
        let new = new.trim().to_string();
        self.rename_group(|e| e.subcategory == old, |e| e.subcategory = new.clone())
    }

    /// Remove every generation's key
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        for key in all_storage_keys() {
            self.store.remove(&key)?;
        }
        info!("cleared all catalogue keys");
        Ok(())
    }
}
