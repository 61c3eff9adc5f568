// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Selection state: an anchor item plus a member set.

use std::collections::HashSet;

use crate::document::{Document, ItemId};

/// How an item was clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickMode {
    /// No modifier: select only the clicked item
    #[default]
    Plain,
    /// Accessory modifier: add or remove the clicked item
    Toggle,
    /// Shift: select from the anchor to the clicked item
    Range,
    /// Shift plus accessory: add the range to the current members
    RangeUnion,
}

impl ClickMode {
    /// Mode from the two modifier states
    pub fn from_modifiers(shift: bool, accessory: bool) -> Self {
        match (shift, accessory) {
            (false, false) => ClickMode::Plain,
            (false, true) => ClickMode::Toggle,
            (true, false) => ClickMode::Range,
            (true, true) => ClickMode::RangeUnion,
        }
    }

    fn is_range(self) -> bool {
        matches!(self, ClickMode::Range | ClickMode::RangeUnion)
    }
}

/// Selected items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    anchor: Option<ItemId>,
    members: HashSet<ItemId>,
}

impl Selection {
    /// Nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference item for insertion and range selection
    pub fn anchor(&self) -> Option<&ItemId> {
        self.anchor.as_ref()
    }

    /// Selected item ids
    pub fn members(&self) -> &HashSet<ItemId> {
        &self.members
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.members.contains(item)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// No anchor and no members
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.members.is_empty()
    }

    /// Drop anchor and members
    pub fn clear(&mut self) {
        self.anchor = None;
        self.members.clear();
    }

    /// Select exactly one item
    pub fn select_only(&mut self, item: ItemId) {
        self.members.clear();
        self.members.insert(item.clone());
        self.anchor = Some(item);
    }

    /// Select a block with the anchor on `anchor`
    pub fn select_block(&mut self, items: impl IntoIterator<Item = ItemId>, anchor: ItemId) {
        self.members = items.into_iter().collect();
        self.members.insert(anchor.clone());
        self.anchor = Some(anchor);
    }

    /// Add or remove an item; it becomes the anchor either way
    pub fn toggle(&mut self, item: ItemId) {
        if !self.members.remove(&item) {
            self.members.insert(item.clone());
        }
        self.anchor = Some(item);
    }

    /// Select from the anchor to `to` in storage order of their shared
    /// section. Returns `false` without changing anything when there is no
    /// anchor or the two items are in different sections.
    pub fn extend_range(&mut self, doc: &Document, to: &ItemId, union: bool) -> bool {
        let Some(anchor) = self.anchor.as_ref() else {
            return false;
        };
        let (Some((from_section, a)), Some((to_section, b))) = (doc.locate(anchor), doc.locate(to))
        else {
            return false;
        };
        if from_section != to_section {
            return false;
        }
        let Some(section) = doc.section(from_section) else {
            return false;
        };
        let (lo, hi) = (a.min(b), a.max(b));
        let range = section.items[lo..=hi].iter().map(|it| it.id.clone());
        if !union {
            self.members.clear();
        }
        self.members.extend(range);
        self.anchor = Some(to.clone());
        true
    }

    /// Apply a click. Returns `true` when the result is a plain single
    /// selection, including a range that fell back to one.
    pub fn click(&mut self, doc: &Document, item: &ItemId, mode: ClickMode) -> bool {
        if mode.is_range() && self.extend_range(doc, item, mode == ClickMode::RangeUnion) {
            return false;
        }
        if mode == ClickMode::Toggle {
            self.toggle(item.clone());
            return false;
        }
        self.select_only(item.clone());
        true
    }

    /// Forget ids that no longer exist in `doc`
    pub fn retain_existing(&mut self, doc: &Document) {
        let ids = doc.item_ids();
        self.members.retain(|id| ids.contains(id));
        if self.anchor.as_ref().is_some_and(|a| !ids.contains(a)) {
            self.anchor = None;
        }
    }

    /// Items to act on: the members, or the anchor alone when there are none
    pub fn targets(&self) -> HashSet<ItemId> {
        if !self.members.is_empty() {
            return self.members.clone();
        }
        self.anchor.iter().cloned().collect()
    }

    /// Targets in document order. Aliased items appear once.
    pub fn ordered_targets(&self, doc: &Document) -> Vec<ItemId> {
        let targets = self.targets();
        let mut seen = HashSet::new();
        doc.flatten()
            .into_iter()
            .map(|r| r.item_id)
            .filter(|id| targets.contains(id) && seen.insert(id.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Item, SectionDefinition, SectionId, Token};

    /// One section `[A..E]` and a second section with one item
    fn fixture() -> (Document, Vec<ItemId>, ItemId) {
        let mut doc = Document::create_default();
        let mut ids = Vec::new();
        let mut other = ItemId::generate();
        doc = doc
            .with_patch(|d| {
                let sid = d.arrangement()[0].section_id.clone();
                let section = d.section_mut(&sid).unwrap();
                for note in ["C4", "D4", "E4", "F4", "G4"] {
                    let item = Item::new(Token::from(note));
                    ids.push(item.id.clone());
                    section.items.push(item);
                }
                let mut second = SectionDefinition::new(SectionId::generate(), "Chorus");
                let item = Item::new(Token::from("A4"));
                other = item.id.clone();
                second.items.push(item);
                d.arrangement_mut()
                    .push(crate::document::ArrangementInstance::new(second.id.clone()));
                d.sections_mut().insert(second.id.clone(), second);
                true
            })
            .unwrap();
        (doc, ids, other)
    }

    fn set(ids: &[&ItemId]) -> HashSet<ItemId> {
        ids.iter().map(|id| (*id).clone()).collect()
    }

    #[test]
    fn test_plain_click() {
        let (doc, ids, _) = fixture();
        let mut sel = Selection::new();
        assert!(sel.click(&doc, &ids[1], ClickMode::Plain));
        assert_eq!(sel.anchor(), Some(&ids[1]));
        assert_eq!(sel.members(), &set(&[&ids[1]]));
    }

    #[test]
    fn test_range_selects_by_index() {
        let (doc, ids, _) = fixture();
        let mut sel = Selection::new();
        sel.click(&doc, &ids[1], ClickMode::Plain);
        sel.click(&doc, &ids[3], ClickMode::Range);
        assert_eq!(sel.members(), &set(&[&ids[1], &ids[2], &ids[3]]));
        assert_eq!(sel.anchor(), Some(&ids[3]));

        // backwards from the new anchor
        sel.click(&doc, &ids[0], ClickMode::Range);
        assert_eq!(sel.members(), &set(&[&ids[0], &ids[1], &ids[2], &ids[3]]));
    }

    #[test]
    fn test_range_union_keeps_existing() {
        let (doc, ids, _) = fixture();
        let mut sel = Selection::new();
        sel.click(&doc, &ids[0], ClickMode::Plain);
        sel.click(&doc, &ids[3], ClickMode::Toggle);
        sel.click(&doc, &ids[4], ClickMode::RangeUnion);
        assert_eq!(sel.members(), &set(&[&ids[0], &ids[3], &ids[4]]));

        let mut replaced = Selection::new();
        replaced.click(&doc, &ids[0], ClickMode::Plain);
        replaced.click(&doc, &ids[3], ClickMode::Toggle);
        replaced.click(&doc, &ids[4], ClickMode::Range);
        assert_eq!(replaced.members(), &set(&[&ids[3], &ids[4]]));
    }

    #[test]
    fn test_range_across_sections_falls_back() {
        let (doc, ids, other) = fixture();
        let mut sel = Selection::new();
        sel.click(&doc, &ids[1], ClickMode::Plain);
        assert!(sel.click(&doc, &other, ClickMode::Range));
        assert_eq!(sel.members(), &set(&[&other]));
        assert_eq!(sel.anchor(), Some(&other));
    }

    #[test]
    fn test_toggle() {
        let (doc, ids, _) = fixture();
        let mut sel = Selection::new();
        sel.click(&doc, &ids[0], ClickMode::Plain);
        sel.click(&doc, &ids[2], ClickMode::Toggle);
        assert_eq!(sel.len(), 2);
        sel.click(&doc, &ids[0], ClickMode::Toggle);
        assert_eq!(sel.members(), &set(&[&ids[2]]));
        assert_eq!(sel.anchor(), Some(&ids[0]));
    }

    #[test]
    fn test_clear() {
        let (doc, ids, _) = fixture();
        let mut sel = Selection::new();
        sel.click(&doc, &ids[0], ClickMode::Plain);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn test_ordered_targets_follow_document() {
        let (doc, ids, other) = fixture();
        let mut sel = Selection::new();
        sel.click(&doc, &other, ClickMode::Plain);
        sel.click(&doc, &ids[4], ClickMode::Toggle);
        sel.click(&doc, &ids[0], ClickMode::Toggle);
        assert_eq!(sel.ordered_targets(&doc), vec![ids[0].clone(), ids[4].clone(), other]);
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(ClickMode::from_modifiers(true, true), ClickMode::RangeUnion);
        assert_eq!(ClickMode::from_modifiers(false, true), ClickMode::Toggle);
    }
}
