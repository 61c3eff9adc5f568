// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Compact storage form of a document.
//!
//! Items are flattened to their raw strings; item and instance ids are not
//! persisted and are regenerated on load. Section ids survive as map keys.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ids::SectionId;
use super::section::{
    make_unique_name, ArrangementInstance, Item, SectionDefinition, DEFAULT_SECTION_NAME,
};
use super::song::Document;
use super::token::Token;

fn default_section_name() -> String {
    DEFAULT_SECTION_NAME.to_string()
}

/// A stored section definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSection {
    #[serde(default = "default_section_name")]
    pub name: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// A stored arrangement entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInstance {
    #[serde(rename = "sectionId")]
    pub section_id: String,
}

/// `{ sections: {id: {name, notes}}, arrangement: [{sectionId}] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(default)]
    pub sections: BTreeMap<String, StoredSection>,
    #[serde(default)]
    pub arrangement: Vec<StoredInstance>,
}

impl StoredDocument {
    /// A single section holding a flat note list, as pre-section generations stored songs
    pub fn single_section(section_id: &str, notes: Vec<String>) -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(
            section_id.to_string(),
            StoredSection {
                name: default_section_name(),
                notes,
            },
        );
        Self {
            sections,
            arrangement: vec![StoredInstance {
                section_id: section_id.to_string(),
            }],
        }
    }
}

/// Flatten a document for persistence
pub fn to_storage(doc: &Document) -> StoredDocument {
    let sections = doc
        .sections()
        .iter()
        .map(|(id, s)| {
            (
                id.as_str().to_string(),
                StoredSection {
                    name: s.name.clone(),
                    notes: s.items.iter().map(|it| it.token.as_storage().to_string()).collect(),
                },
            )
        })
        .collect();
    let arrangement = doc
        .arrangement()
        .iter()
        .map(|inst| StoredInstance {
            section_id: inst.section_id.as_str().to_string(),
        })
        .collect();
    StoredDocument {
        sections,
        arrangement,
    }
}

/// Rebuild a document with fresh item and instance ids. Falls back to the
/// default document when nothing usable is present, and disambiguates
/// duplicate section names.
pub fn from_storage(payload: &StoredDocument) -> Document {
    let mut sections: Vec<SectionDefinition> = payload
        .sections
        .iter()
        .map(|(id, s)| SectionDefinition {
            id: SectionId::from(id.as_str()),
            name: s.name.clone(),
            items: s.notes.iter().map(|n| Item::new(Token::parse(n))).collect(),
        })
        .collect();

    let known: HashSet<&str> = payload.sections.keys().map(|k| k.as_str()).collect();
    let arrangement: Vec<ArrangementInstance> = payload
        .arrangement
        .iter()
        .filter(|inst| known.contains(inst.section_id.as_str()))
        .map(|inst| ArrangementInstance::new(SectionId::from(inst.section_id.as_str())))
        .collect();

    if sections.is_empty() || arrangement.is_empty() {
        return Document::create_default();
    }

    let mut seen: HashSet<String> = HashSet::new();
    for idx in 0..sections.len() {
        if seen.contains(&sections[idx].name.to_lowercase()) {
            let names: Vec<String> = sections.iter().map(|s| s.name.clone()).collect();
            sections[idx].name = make_unique_name(&sections[idx].name, &names);
        }
        seen.insert(sections[idx].name.to_lowercase());
    }

    Document::from_parts(sections, arrangement)
}

impl Document {
    /// See [`to_storage`]
    pub fn to_storage(&self) -> StoredDocument {
        to_storage(self)
    }

    /// See [`from_storage`]
    pub fn from_storage(payload: &StoredDocument) -> Self {
        from_storage(payload)
    }
}
