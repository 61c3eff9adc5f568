// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bundle import with per-song conflict resolution.
//!
//! Songs are processed one at a time and each accepted song is written
//! immediately, so an interrupted import keeps whatever it already wrote.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::bundle::parse_bundle;
use super::share_code::decode_share_code;
use crate::document::{Document, Token};
use crate::error::{ImportError, ShareCodeError, StoreError};
use crate::store::migrate::{normalize_entry, VersionedSongs};
use crate::store::{CatalogueEntry, CatalogueStore, KeyValueStore};

/// Name used when a song name reduces to nothing
pub const FALLBACK_SONG_NAME: &str = "Song";

/// How to resolve an incoming song whose name exists with different notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Skip,
    Overwrite,
    SaveAs,
}

/// A name collision with differing content
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub name: String,
    pub existing: Vec<Token>,
    pub incoming: Vec<Token>,
}

impl Conflict {
    fn line(tokens: &[Token]) -> String {
        tokens
            .iter()
            .map(Token::as_storage)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Existing notes as one line
    pub fn existing_line(&self) -> String {
        Self::line(&self.existing)
    }

    /// Incoming notes as one line
    pub fn incoming_line(&self) -> String {
        Self::line(&self.incoming)
    }
}

/// Answers the questions an import asks. Implementations may prompt a user.
#[async_trait]
pub trait ImportDecider: Send {
    /// Choose what to do about a conflict
    async fn resolve_conflict(&mut self, conflict: &Conflict) -> ConflictChoice;

    /// Name for a save-as, pre-filled with `suggested`. `None` cancels.
    async fn choose_name(&mut self, suggested: &str) -> Option<String>;
}

/// Gives the same answer to every conflict and accepts suggested names
#[derive(Debug, Clone, Copy)]
pub struct FixedDecider {
    choice: ConflictChoice,
}

impl FixedDecider {
    pub fn new(choice: ConflictChoice) -> Self {
        Self { choice }
    }
}

#[async_trait]
impl ImportDecider for FixedDecider {
    async fn resolve_conflict(&mut self, _conflict: &Conflict) -> ConflictChoice {
        self.choice
    }

    async fn choose_name(&mut self, suggested: &str) -> Option<String> {
        Some(suggested.to_string())
    }
}

/// Outcome counts of one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// New names written
    pub imported: usize,
    /// Existing songs replaced
    pub overwritten: usize,
    /// Written under a different name
    pub renamed: usize,
    /// Same notes as the existing song; nothing written
    pub identical: usize,
    /// Declined or cancelled
    pub skipped: usize,
    /// Unreadable entries
    pub malformed: usize,
    /// Accepted but the store refused the write
    pub failed: usize,
}

impl ImportReport {
    /// Songs written by this import
    pub fn written(&self) -> usize {
        self.imported + self.overwritten + self.renamed
    }
}

/// `name` without a trailing ` N`, or the fallback name when that leaves nothing
pub fn base_root_name(name: &str) -> String {
    let trimmed = name.trim();
    let root = match trimmed.rsplit_once(char::is_whitespace) {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => {
            head.trim()
        }
        _ => trimmed,
    };
    if root.is_empty() {
        FALLBACK_SONG_NAME.to_string()
    } else {
        root.to_string()
    }
}

/// `<root> N` for the smallest N >= 1 that `exists` rejects
pub fn suggest_unique_name<F>(name: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = base_root_name(name);
    (1..)
        .map(|i| format!("{} {}", base, i))
        .find(|candidate| !exists(candidate))
        .unwrap_or(base)
}

/// Re-run the document through load so ids, names and instances are sound
fn canonical_entry(entry: CatalogueEntry) -> CatalogueEntry {
    let doc = Document::from_storage(&entry.document);
    CatalogueEntry::new(&doc, entry.transpose, &entry.category, &entry.subcategory)
}

async fn ask_save_as_name<S, D>(
    store: &mut CatalogueStore<S>,
    decider: &mut D,
    original: &str,
) -> Option<String>
where
    S: KeyValueStore,
    D: ImportDecider,
{
    let names = store.list_names();
    let mut proposed = suggest_unique_name(original, |n| names.iter().any(|m| m == n));
    loop {
        let input = decider.choose_name(&proposed).await?;
        let trimmed = input.trim();
        if trimmed.is_empty() {
            debug!("rejected empty save-as name");
            continue;
        }
        if names.iter().any(|m| m == trimmed) {
            debug!("save-as name \"{}\" already exists", trimmed);
            proposed = suggest_unique_name(trimmed, |n| names.iter().any(|m| m == n));
            continue;
        }
        return Some(trimmed.to_string());
    }
}

fn record_write(
    result: Result<(), StoreError>,
    name: &str,
    counter: &mut usize,
    failed: &mut usize,
) {
    match result {
        Ok(()) => *counter += 1,
        Err(e) => {
            warn!("could not import \"{}\": {}", name, e);
            *failed += 1;
        }
    }
}

/// Import every song of a parsed bundle into the store
pub async fn import_songs<S, D>(
    store: &mut CatalogueStore<S>,
    payload: &VersionedSongs,
    decider: &mut D,
) -> ImportReport
where
    S: KeyValueStore,
    D: ImportDecider,
{
    let mut report = ImportReport::default();
    for (raw_name, raw_entry) in &payload.songs {
        let name = raw_name.trim();
        if name.is_empty() {
            report.malformed += 1;
            continue;
        }
        let Some(incoming) = normalize_entry(payload.declared, raw_entry).map(canonical_entry) else {
            warn!("skipping malformed song \"{}\"", name);
            report.malformed += 1;
            continue;
        };

        let Some(existing) = store.entry(name) else {
            let result = store.save_entry(name, incoming);
            record_write(result, name, &mut report.imported, &mut report.failed);
            continue;
        };

        let conflict = Conflict {
            name: name.to_string(),
            existing: existing.base_tokens(),
            incoming: incoming.base_tokens(),
        };
        if conflict.existing == conflict.incoming {
            debug!("\"{}\" is unchanged", name);
            report.identical += 1;
            continue;
        }

        match decider.resolve_conflict(&conflict).await {
            ConflictChoice::Skip => report.skipped += 1,
            ConflictChoice::Overwrite => {
                let result = store.save_entry(name, incoming);
                record_write(result, name, &mut report.overwritten, &mut report.failed);
            }
            ConflictChoice::SaveAs => match ask_save_as_name(store, decider, name).await {
                Some(new_name) => {
                    let result = store.save_entry(&new_name, incoming);
                    record_write(result, &new_name, &mut report.renamed, &mut report.failed);
                }
                None => report.skipped += 1,
            },
        }
    }
    info!(
        "import finished: {} new, {} overwritten, {} renamed, {} identical, {} skipped, {} malformed",
        report.imported,
        report.overwritten,
        report.renamed,
        report.identical,
        report.skipped,
        report.malformed
    );
    report
}

/// Parse bundle text and import it. A file with no recognizable song map
/// fails before anything is written.
pub async fn import_bundle<S, D>(
    store: &mut CatalogueStore<S>,
    text: &str,
    decider: &mut D,
) -> Result<ImportReport, ImportError>
where
    S: KeyValueStore,
    D: ImportDecider,
{
    let payload = parse_bundle(text)?;
    Ok(import_songs(store, &payload, decider).await)
}

/// Decode a share code and import its song through the same conflict rules
pub async fn import_share_code<S, D>(
    store: &mut CatalogueStore<S>,
    code: &str,
    decider: &mut D,
) -> Result<ImportReport, ShareCodeError>
where
    S: KeyValueStore,
    D: ImportDecider,
{
    let payload = decode_share_code(code).await?;
    Ok(import_songs(store, &payload, decider).await)
}
