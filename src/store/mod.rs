// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Persistence for the song catalogue.
//!
//! This module provides:
//! - A host key-value store abstraction with memory and directory backends
//! - The versioned catalogue with automatic upgrades from older generations
//! - Per-song and per-category operations

pub mod catalogue;
pub mod kv;
pub mod migrate;

pub use catalogue::{
    Catalogue, CatalogueEntry, CatalogueFile, CatalogueStore, LoadedSong, Overwrite,
    RenameOutcome, SongSummary,
};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use migrate::{all_storage_keys, storage_key, CURRENT_VERSION, OLDEST_VERSION};
