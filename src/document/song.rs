// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The song document: section definitions plus the arrangement that places them.
//!
//! A document always has at least one definition and one instance, and every
//! instance resolves to a definition. Several instances may reference the
//! same definition; edits to that definition show through all of them.

use std::collections::{BTreeMap, HashSet};

use serde_json::json;

use super::ids::{InstanceId, ItemId, SectionId};
use super::section::{ArrangementInstance, Item, SectionDefinition, DEFAULT_SECTION_NAME};
use super::token::Token;
use crate::music::{Fingering, FingeringLookup, Semitones};

/// In-memory document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Position of one item in arrangement order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItemRef {
    pub instance_id: InstanceId,
    pub section_id: SectionId,
    pub item_id: ItemId,
}

/// One item as rendered with a transpose applied
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub instance_id: InstanceId,
    pub item_id: ItemId,
    /// Stored, untransposed content
    pub base: Token,
    /// Content shifted by the transpose
    pub shown: Token,
    /// Fingering for the shown pitch; `None` for markers
    pub fingering: Option<Fingering>,
}

/// A song
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    version: u32,
    sections_by_id: BTreeMap<SectionId, SectionDefinition>,
    arrangement: Vec<ArrangementInstance>,
}

impl Document {
    /// One empty "General" section placed once
    pub fn create_default() -> Self {
        let section = SectionDefinition::new(SectionId::generate(), DEFAULT_SECTION_NAME);
        let instance = ArrangementInstance::new(section.id.clone());
        let mut sections_by_id = BTreeMap::new();
        sections_by_id.insert(section.id.clone(), section);
        Self {
            version: DOCUMENT_VERSION,
            sections_by_id,
            arrangement: vec![instance],
        }
    }

    /// Assemble a document from parts, repairing any broken invariant
    pub fn from_parts(
        sections: impl IntoIterator<Item = SectionDefinition>,
        arrangement: Vec<ArrangementInstance>,
    ) -> Self {
        let mut doc = Self {
            version: DOCUMENT_VERSION,
            sections_by_id: sections.into_iter().map(|s| (s.id.clone(), s)).collect(),
            arrangement,
        };
        doc.repair();
        doc
    }

    /// Document format version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// All definitions keyed by id
    pub fn sections(&self) -> &BTreeMap<SectionId, SectionDefinition> {
        &self.sections_by_id
    }

    /// Mutable definitions. Use inside [`Document::with_patch`].
    pub fn sections_mut(&mut self) -> &mut BTreeMap<SectionId, SectionDefinition> {
        &mut self.sections_by_id
    }

    /// Look up a definition
    pub fn section(&self, id: &SectionId) -> Option<&SectionDefinition> {
        self.sections_by_id.get(id)
    }

    /// Mutable definition lookup. Use inside [`Document::with_patch`].
    pub fn section_mut(&mut self, id: &SectionId) -> Option<&mut SectionDefinition> {
        self.sections_by_id.get_mut(id)
    }

    /// Play order
    pub fn arrangement(&self) -> &[ArrangementInstance] {
        &self.arrangement
    }

    /// Mutable play order. Use inside [`Document::with_patch`].
    pub fn arrangement_mut(&mut self) -> &mut Vec<ArrangementInstance> {
        &mut self.arrangement
    }

    /// Look up an instance
    pub fn instance(&self, id: &InstanceId) -> Option<&ArrangementInstance> {
        self.arrangement.iter().find(|inst| &inst.id == id)
    }

    /// Every definition name
    pub fn section_names(&self) -> Vec<String> {
        self.sections_by_id.values().map(|s| s.name.clone()).collect()
    }

    /// How many instances place a definition
    pub fn instance_count(&self, section: &SectionId) -> usize {
        self.arrangement
            .iter()
            .filter(|inst| &inst.section_id == section)
            .count()
    }

    /// The definition holding an item, and the item's index in it
    pub fn locate(&self, item: &ItemId) -> Option<(&SectionId, usize)> {
        self.sections_by_id
            .iter()
            .find_map(|(id, s)| s.position(item).map(|idx| (id, idx)))
    }

    /// Look up an item anywhere in the document
    pub fn item(&self, item: &ItemId) -> Option<&Item> {
        self.sections_by_id
            .values()
            .find_map(|s| s.items.iter().find(|it| &it.id == item))
    }

    /// Every item id in the document
    pub fn item_ids(&self) -> HashSet<ItemId> {
        self.sections_by_id
            .values()
            .flat_map(|s| s.items.iter().map(|it| it.id.clone()))
            .collect()
    }

    /// Items in arrangement order; an aliased definition appears once per instance
    pub fn flatten(&self) -> Vec<FlatItemRef> {
        let mut out = Vec::new();
        for inst in &self.arrangement {
            let Some(section) = self.sections_by_id.get(&inst.section_id) else {
                continue;
            };
            for item in &section.items {
                out.push(FlatItemRef {
                    instance_id: inst.id.clone(),
                    section_id: section.id.clone(),
                    item_id: item.id.clone(),
                });
            }
        }
        out
    }

    /// The flattened base content, ignoring ids
    pub fn base_tokens(&self) -> Vec<Token> {
        self.arrangement
            .iter()
            .filter_map(|inst| self.sections_by_id.get(&inst.section_id))
            .flat_map(|s| s.items.iter().map(|it| it.token.clone()))
            .collect()
    }

    /// Render every item with a transpose applied, looking fingerings up for
    /// the shifted pitch
    pub fn display<F: FingeringLookup + ?Sized>(
        &self,
        transpose: Semitones,
        fingerings: &F,
    ) -> Vec<DisplayItem> {
        let mut out = Vec::new();
        for inst in &self.arrangement {
            let Some(section) = self.sections_by_id.get(&inst.section_id) else {
                continue;
            };
            for item in &section.items {
                let shown = item.token.displayed(transpose);
                let fingering = shown.pitch().map(|p| fingerings.lookup(p));
                out.push(DisplayItem {
                    instance_id: inst.id.clone(),
                    item_id: item.id.clone(),
                    base: item.token.clone(),
                    shown,
                    fingering,
                });
            }
        }
        out
    }

    /// Stable summary of content, names and transpose for change detection.
    /// Item and instance ids are not part of it.
    pub fn fingerprint(&self, transpose: Semitones) -> String {
        let sections: Vec<_> = self
            .sections_by_id
            .values()
            .map(|s| {
                json!({
                    "id": s.id.as_str(),
                    "name": s.name,
                    "notes": s.items.iter().map(|it| it.token.as_storage()).collect::<Vec<_>>(),
                })
            })
            .collect();
        let arrangement: Vec<&str> = self
            .arrangement
            .iter()
            .map(|inst| inst.section_id.as_str())
            .collect();
        json!({ "v": self.version, "t": transpose, "arrangement": arrangement, "sections": sections })
            .to_string()
    }

    /// Copy-on-write update. `mutate` edits a structurally independent draft
    /// and returns `false` to abandon it; otherwise the repaired draft is
    /// returned and `self` is left untouched either way.
    pub fn with_patch<F>(&self, mutate: F) -> Option<Document>
    where
        F: FnOnce(&mut Document) -> bool,
    {
        let mut draft = self.clone();
        if !mutate(&mut draft) {
            return None;
        }
        draft.repair();
        Some(draft)
    }

    /// Drop dangling instances; fall back to the default document when
    /// either side ends up empty.
    fn repair(&mut self) {
        let sections = &self.sections_by_id;
        self.arrangement
            .retain(|inst| sections.contains_key(&inst.section_id));
        if self.sections_by_id.is_empty() || self.arrangement.is_empty() {
            *self = Self::create_default();
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::create_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::FingeringChart;

    fn doc_with(notes: &[&str]) -> Document {
        Document::create_default()
            .with_patch(|d| {
                let id = d.arrangement()[0].section_id.clone();
                let s = d.section_mut(&id).unwrap();
                s.items = notes.iter().map(|n| Item::new(Token::from(*n))).collect();
                true
            })
            .unwrap()
    }

    #[test]
    fn test_create_default() {
        let doc = Document::create_default();
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.arrangement().len(), 1);
        let section = doc.section(&doc.arrangement()[0].section_id).unwrap();
        assert_eq!(section.name, "General");
        assert!(section.items.is_empty());
    }

    #[test]
    fn test_with_patch_leaves_original_untouched() {
        let original = doc_with(&["C4"]);
        let next = original
            .with_patch(|d| {
                for s in d.sections_mut().values_mut() {
                    s.items.clear();
                }
                true
            })
            .unwrap();
        assert_eq!(original.base_tokens().len(), 1);
        assert!(next.base_tokens().is_empty());
    }

    #[test]
    fn test_with_patch_abandoned() {
        let original = doc_with(&["C4"]);
        assert!(original.with_patch(|_| false).is_none());
    }

    #[test]
    fn test_repair_resets_empty_document() {
        let doc = doc_with(&["C4"]);
        let next = doc
            .with_patch(|d| {
                d.sections_mut().clear();
                true
            })
            .unwrap();
        assert_eq!(next.sections().len(), 1);
        assert_eq!(next.arrangement().len(), 1);
        assert!(next.base_tokens().is_empty());
    }

    #[test]
    fn test_flatten_follows_aliases() {
        let doc = doc_with(&["C4", "D4"]);
        let doc = doc
            .with_patch(|d| {
                let sid = d.arrangement()[0].section_id.clone();
                d.arrangement_mut().push(ArrangementInstance::new(sid));
                true
            })
            .unwrap();
        let flat = doc.flatten();
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[0].item_id, flat[2].item_id);
        assert_ne!(flat[0].instance_id, flat[2].instance_id);
    }

    #[test]
    fn test_display_shifts_pitches_only() {
        let doc = doc_with(&["C4", "—", "D4"]);
        let shown: Vec<String> = doc
            .display(2, &FingeringChart::builtin())
            .iter()
            .map(|d| d.shown.to_string())
            .collect();
        assert_eq!(shown, vec!["D4", "—", "E4"]);
        let base: Vec<String> = doc.base_tokens().iter().map(|t| t.to_string()).collect();
        assert_eq!(base, vec!["C4", "—", "D4"]);
    }

    #[test]
    fn test_display_fingering_uses_shifted_pitch() {
        let chart = FingeringChart::builtin();
        let doc = doc_with(&["C4", "—"]);
        let items = doc.display(2, &chart);
        assert_eq!(items[0].fingering.as_ref(), Some(&chart.lookup("D4")));
        assert!(items[1].fingering.is_none());
    }

    #[test]
    fn test_fingerprint_ignores_item_ids() {
        let doc = doc_with(&["C4", "D4"]);
        let same = doc
            .with_patch(|d| {
                for s in d.sections_mut().values_mut() {
                    s.items = crate::document::duplicate_items(&s.items);
                }
                true
            })
            .unwrap();
        assert_eq!(doc.fingerprint(0), same.fingerprint(0));
        assert_ne!(doc.fingerprint(0), doc.fingerprint(1));
    }
}
