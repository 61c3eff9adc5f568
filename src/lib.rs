// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Ocarina songbook: compose fingering sequences from reusable sections,
//! keep them in a versioned local catalogue, and exchange them as bundles
//! or share codes.

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod exchange;
pub mod music;
pub mod store;

pub use config::AppConfig;
pub use document::{Document, Token};
pub use editor::Editor;
pub use error::{ImportError, ShareCodeError, StoreError};
pub use store::{CatalogueStore, FileStore, KeyValueStore, MemoryStore};
