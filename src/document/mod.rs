// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song document model.
//!
//! This module provides:
//! - Items: pitches and rest/break markers with opaque ids
//! - Section definitions: named item lists, shareable between instances
//! - Documents: definitions plus the arrangement, updated copy-on-write
//! - Storage: the compact persisted form and its inverse

pub mod ids;
pub mod section;
pub mod song;
pub mod storage;
pub mod token;

pub use ids::{InstanceId, ItemId, SectionId};
pub use section::{
    duplicate_items, make_unique_name, normalize_section_name, ArrangementInstance, Item,
    SectionDefinition, DEFAULT_SECTION_NAME,
};
pub use song::{DisplayItem, Document, FlatItemRef, DOCUMENT_VERSION};
pub use storage::{from_storage, to_storage, StoredDocument, StoredInstance, StoredSection};
pub use token::{Token, BREAK, REST};
