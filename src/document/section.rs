// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Items, section definitions and arrangement instances.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ids::{InstanceId, ItemId, SectionId};
use super::token::Token;

/// Name given to sections created without one
pub const DEFAULT_SECTION_NAME: &str = "General";

/// One slot in a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "note")]
    pub token: Token,
}

impl Item {
    /// Create an item with a fresh id
    pub fn new(token: Token) -> Self {
        Self {
            id: ItemId::generate(),
            token,
        }
    }
}

/// A named, ordered list of items, shared by every instance that references it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDefinition {
    pub id: SectionId,
    pub name: String,
    pub items: Vec<Item>,
}

impl SectionDefinition {
    /// Create an empty section
    pub fn new(id: SectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Index of an item in storage order
    pub fn position(&self, item: &ItemId) -> Option<usize> {
        self.items.iter().position(|it| &it.id == item)
    }

    /// Whether this section holds the item
    pub fn contains(&self, item: &ItemId) -> bool {
        self.position(item).is_some()
    }
}

/// A placement of a section definition in the play order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrangementInstance {
    pub id: InstanceId,
    pub section_id: SectionId,
}

impl ArrangementInstance {
    /// Place a section with a fresh instance id
    pub fn new(section_id: SectionId) -> Self {
        Self {
            id: InstanceId::generate(),
            section_id,
        }
    }
}

/// Trimmed name, or the default name when blank
pub fn normalize_section_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        DEFAULT_SECTION_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `desired`, or `desired N` for the smallest free N >= 2. Case-insensitive.
pub fn make_unique_name<S: AsRef<str>>(desired: &str, existing: &[S]) -> String {
    let base = normalize_section_name(desired);
    let used: HashSet<String> = existing
        .iter()
        .map(|n| n.as_ref().to_lowercase())
        .collect();
    if !used.contains(&base.to_lowercase()) {
        return base;
    }
    (2..)
        .map(|i| format!("{} {}", base, i))
        .find(|candidate| !used.contains(&candidate.to_lowercase()))
        .unwrap_or(base)
}

/// Same contents, fresh ids
pub fn duplicate_items(items: &[Item]) -> Vec<Item> {
    items.iter().map(|it| Item::new(it.token.clone())).collect()
}
