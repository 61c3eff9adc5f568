// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Moving songs between catalogues.
//!
//! This module provides:
//! - Bundles: versioned multi-song JSON files for export and import
//! - Import: per-song conflict resolution through an async decider
//! - Share codes: compact single-song text codes

pub mod bundle;
pub mod import;
pub mod share_code;

pub use bundle::{
    bundle_to_json, export_bundle, export_file_name, inspect_bundle, parse_bundle, Bundle,
    BundleSummary,
};
pub use import::{
    import_bundle, import_share_code, import_songs, suggest_unique_name, Conflict,
    ConflictChoice, FixedDecider, ImportDecider, ImportReport,
};
pub use share_code::{decode_share_code, encode_share_code};
