// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The composing session: current document, active container and selection.
//!
//! Every edit goes through [`Document::with_patch`] and publishes a new
//! `Arc<Document>`. Snapshots handed out earlier never change.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::clipboard::{decode_tokens, encode_items, Clipboard};
use super::selection::{ClickMode, Selection};
use crate::document::{
    DisplayItem, Document, InstanceId, Item, ItemId, SectionId, Token,
};
use crate::music::{FingeringLookup, Semitones};

/// Plays a short preview of a pitch
pub trait NotePreview {
    fn preview(&mut self, pitch: &str);
}

/// Preview sink that plays nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPreview;

impl NotePreview for SilentPreview {
    fn preview(&mut self, _pitch: &str) {}
}

/// Editing state for one open song
#[derive(Debug, Clone)]
pub struct Editor {
    document: Arc<Document>,
    active_instance: Option<InstanceId>,
    selection: Selection,
    transpose: Semitones,
    baseline: String,
}

impl Editor {
    /// Open a document. It starts out clean.
    pub fn new(document: Document, transpose: Semitones) -> Self {
        let baseline = document.fingerprint(transpose);
        Self {
            document: Arc::new(document),
            active_instance: None,
            selection: Selection::new(),
            transpose,
            baseline,
        }
    }

    /// The current document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// A shared handle to the current document
    pub fn snapshot(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn transpose(&self) -> Semitones {
        self.transpose
    }

    /// Change the display shift. Stored pitches are untouched.
    pub fn set_transpose(&mut self, transpose: Semitones) {
        self.transpose = transpose;
    }

    /// Items as displayed with the current transpose
    pub fn display<F: FingeringLookup + ?Sized>(&self, fingerings: &F) -> Vec<DisplayItem> {
        self.document.display(self.transpose, fingerings)
    }

    /// Record the current state as saved
    pub fn mark_saved(&mut self) {
        self.baseline = self.document.fingerprint(self.transpose);
    }

    /// Whether content, names, arrangement or transpose changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.document.fingerprint(self.transpose) != self.baseline
    }

    /// The instance receiving inserts: the chosen one if it still exists, else the last
    pub fn active_instance(&self) -> Option<InstanceId> {
        let arrangement = self.document.arrangement();
        self.active_instance
            .as_ref()
            .and_then(|id| arrangement.iter().find(|inst| &inst.id == id))
            .or_else(|| arrangement.last())
            .map(|inst| inst.id.clone())
    }

    /// Make an instance the active container. Unknown ids are ignored.
    pub fn set_active_instance(&mut self, instance: &InstanceId) {
        if self.document.instance(instance).is_some() {
            self.active_instance = Some(instance.clone());
        }
    }

    fn active_section(&self) -> Option<SectionId> {
        let id = self.active_instance()?;
        self.document.instance(&id).map(|inst| inst.section_id.clone())
    }

    /// Publish a patched document and drop stale selection and container state
    pub(super) fn publish(&mut self, next: Option<Document>) -> bool {
        let Some(next) = next else {
            return false;
        };
        self.document = Arc::new(next);
        self.selection.retain_existing(&self.document);
        if self
            .active_instance
            .as_ref()
            .is_some_and(|id| self.document.instance(id).is_none())
        {
            self.active_instance = None;
        }
        true
    }

    /// Click an item shown in `instance`. A plain selection of a pitch
    /// previews its displayed pitch.
    pub fn click<P: NotePreview + ?Sized>(
        &mut self,
        instance: &InstanceId,
        item: &ItemId,
        mode: ClickMode,
        preview: &mut P,
    ) {
        if self.document.item(item).is_none() {
            return;
        }
        self.set_active_instance(instance);
        let plain = self.selection.click(&self.document, item, mode);
        if !plain {
            return;
        }
        let shown = self
            .document
            .item(item)
            .map(|it| it.token.displayed(self.transpose));
        if let Some(Token::Pitch(pitch)) = shown {
            preview.preview(&pitch);
        }
    }

    /// Clear the selection
    pub fn escape(&mut self) {
        self.selection.clear();
    }

    /// Where new items go in the active section: after the anchor when it
    /// is there, else at the end
    fn insertion_point(&self) -> Option<(SectionId, usize)> {
        let section_id = self.active_section()?;
        let section = self.document.section(&section_id)?;
        let index = self
            .selection
            .anchor()
            .and_then(|anchor| section.position(anchor))
            .map(|idx| idx + 1)
            .unwrap_or(section.items.len());
        Some((section_id, index))
    }

    fn insert_block(&mut self, items: Vec<Item>) -> bool {
        let Some(last) = items.last().map(|it| it.id.clone()) else {
            return false;
        };
        let Some((section_id, index)) = self.insertion_point() else {
            return false;
        };
        let ids: Vec<ItemId> = items.iter().map(|it| it.id.clone()).collect();
        let next = self.document.with_patch(|d| {
            let Some(section) = d.section_mut(&section_id) else {
                return false;
            };
            let tail = section.items.split_off(index.min(section.items.len()));
            section.items.extend(items);
            section.items.extend(tail);
            true
        });
        if !self.publish(next) {
            return false;
        }
        self.selection.select_block(ids, last);
        true
    }

    /// Insert a pitch or marker into the active container. Returns the new item's id.
    pub fn insert(&mut self, token: Token) -> Option<ItemId> {
        let item = Item::new(token);
        let id = item.id.clone();
        self.insert_block(vec![item]).then_some(id)
    }

    pub fn insert_rest(&mut self) -> Option<ItemId> {
        self.insert(Token::Rest)
    }

    pub fn insert_break(&mut self) -> Option<ItemId> {
        self.insert(Token::Break)
    }

    /// Remove the selected items (or the anchor alone). Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let targets = self.selection.targets();
        self.remove_items(&targets)
    }

    fn remove_items(&mut self, targets: &HashSet<ItemId>) -> usize {
        if targets.is_empty() {
            return 0;
        }
        let mut removed = 0;
        let next = self.document.with_patch(|d| {
            for section in d.sections_mut().values_mut() {
                let before = section.items.len();
                section.items.retain(|it| !targets.contains(&it.id));
                removed += before - section.items.len();
            }
            removed > 0
        });
        self.publish(next);
        removed
    }

    fn selected_items(&self) -> Vec<Item> {
        self.selection
            .ordered_targets(&self.document)
            .iter()
            .filter_map(|id| self.document.item(id).cloned())
            .collect()
    }

    /// Put the selection on the clipboard in document order. Returns how many items were copied.
    pub fn copy<C: Clipboard + ?Sized>(&self, clipboard: &mut C) -> usize {
        let items = self.selected_items();
        if items.is_empty() {
            return 0;
        }
        match encode_items(&items) {
            Ok(text) => {
                clipboard.write_text(&text);
                items.len()
            }
            Err(e) => {
                debug!("could not encode clipboard payload: {}", e);
                0
            }
        }
    }

    /// Copy, then remove the copied items
    pub fn cut<C: Clipboard + ?Sized>(&mut self, clipboard: &mut C) -> usize {
        if self.copy(clipboard) == 0 {
            return 0;
        }
        self.delete_selected()
    }

    /// Insert the clipboard's items with fresh ids after the anchor and
    /// select them. Foreign or empty clipboard text does nothing.
    pub fn paste<C: Clipboard + ?Sized>(&mut self, clipboard: &C) -> usize {
        let Some(tokens) = clipboard.read_text().as_deref().and_then(decode_tokens) else {
            return 0;
        };
        let items: Vec<Item> = tokens.into_iter().map(Item::new).collect();
        let count = items.len();
        if self.insert_block(items) {
            count
        } else {
            0
        }
    }

    /// Drag `dragged` into `to_section` before `before` (or to the end).
    /// The whole selection moves when `dragged` belongs to it. Returns
    /// whether anything moved.
    pub fn move_items(
        &mut self,
        dragged: &ItemId,
        to_section: &SectionId,
        before: Option<&ItemId>,
    ) -> bool {
        let moving: HashSet<ItemId> = if self.selection.contains(dragged) {
            self.selection.members().clone()
        } else {
            std::iter::once(dragged.clone()).collect()
        };
        if let Some(before) = before {
            let same_section = self
                .document
                .locate(before)
                .is_some_and(|(section, _)| section == to_section);
            if same_section && moving.contains(before) {
                return false;
            }
        }
        let mut seen = HashSet::new();
        let order: Vec<ItemId> = self
            .document
            .flatten()
            .into_iter()
            .map(|r| r.item_id)
            .filter(|id| moving.contains(id) && seen.insert(id.clone()))
            .collect();
        if order.is_empty() || self.document.section(to_section).is_none() {
            return false;
        }

        let original = Arc::clone(&self.document);
        let next = self.document.with_patch(|d| {
            let moved: Vec<Item> = order.iter().filter_map(|id| d.item(id).cloned()).collect();
            for section in d.sections_mut().values_mut() {
                section.items.retain(|it| !moving.contains(&it.id));
            }
            let Some(target) = d.section_mut(to_section) else {
                return false;
            };
            let at = before
                .and_then(|b| target.position(b))
                .unwrap_or(target.items.len());
            let tail = target.items.split_off(at);
            target.items.extend(moved);
            target.items.extend(tail);
            d.sections() != original.sections()
        });
        self.publish(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MemoryClipboard;
    use crate::music::FingeringChart;

    #[derive(Default)]
    struct RecordingPreview(Vec<String>);

    impl NotePreview for RecordingPreview {
        fn preview(&mut self, pitch: &str) {
            self.0.push(pitch.to_string());
        }
    }

    fn tokens(editor: &Editor) -> Vec<String> {
        editor
            .document()
            .base_tokens()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    fn editor_with(notes: &[&str]) -> (Editor, Vec<ItemId>) {
        let mut editor = Editor::new(Document::create_default(), 0);
        let ids = notes
            .iter()
            .map(|n| editor.insert(Token::from(*n)).unwrap())
            .collect();
        (editor, ids)
    }

    fn first_instance(editor: &Editor) -> InstanceId {
        editor.document().arrangement()[0].id.clone()
    }

    #[test]
    fn test_insert_appends_then_follows_anchor() {
        let (mut editor, ids) = editor_with(&["C4", "D4", "E4"]);
        assert_eq!(tokens(&editor), vec!["C4", "D4", "E4"]);
        assert_eq!(editor.selection().anchor(), Some(&ids[2]));

        let inst = first_instance(&editor);
        editor.click(&inst, &ids[0], ClickMode::Plain, &mut SilentPreview);
        editor.insert_rest().unwrap();
        editor.insert_break().unwrap();
        assert_eq!(tokens(&editor), vec!["C4", "—", "⏎", "D4", "E4"]);
    }

    #[test]
    fn test_insert_appends_when_anchor_elsewhere() {
        let (mut editor, ids) = editor_with(&["C4"]);
        let new_inst = editor.create_section("Verse");
        assert_eq!(editor.active_instance(), Some(new_inst));
        assert_eq!(editor.selection().anchor(), Some(&ids[0]));
        editor.insert(Token::from("G4")).unwrap();
        let verse = editor.document().arrangement()[1].section_id.clone();
        assert_eq!(editor.document().section(&verse).unwrap().items.len(), 1);
    }

    #[test]
    fn test_edits_publish_new_snapshots() {
        let (mut editor, _) = editor_with(&["C4"]);
        let before = editor.snapshot();
        editor.insert(Token::from("D4"));
        assert_eq!(before.base_tokens().len(), 1);
        assert_eq!(editor.document().base_tokens().len(), 2);
    }

    #[test]
    fn test_click_previews_displayed_pitch() {
        let (mut editor, ids) = editor_with(&["C4", "—"]);
        editor.set_transpose(2);
        let inst = first_instance(&editor);
        let mut preview = RecordingPreview::default();
        editor.click(&inst, &ids[0], ClickMode::Plain, &mut preview);
        editor.click(&inst, &ids[1], ClickMode::Plain, &mut preview);
        editor.click(&inst, &ids[0], ClickMode::Toggle, &mut preview);
        assert_eq!(preview.0, vec!["D4"]);
    }

    #[test]
    fn test_delete_selection_and_anchor() {
        let (mut editor, ids) = editor_with(&["C4", "D4", "E4", "F4"]);
        let inst = first_instance(&editor);
        editor.click(&inst, &ids[1], ClickMode::Plain, &mut SilentPreview);
        editor.click(&inst, &ids[2], ClickMode::Range, &mut SilentPreview);
        assert_eq!(editor.delete_selected(), 2);
        assert_eq!(tokens(&editor), vec!["C4", "F4"]);
        assert!(editor.selection().is_empty());
        assert_eq!(editor.delete_selected(), 0);
    }

    #[test]
    fn test_copy_paste_uses_fresh_ids() {
        let (mut editor, ids) = editor_with(&["C4", "D4", "E4"]);
        let inst = first_instance(&editor);
        let mut clip = MemoryClipboard::new();
        // clicked out of order; copied in document order
        editor.click(&inst, &ids[2], ClickMode::Plain, &mut SilentPreview);
        editor.click(&inst, &ids[0], ClickMode::Toggle, &mut SilentPreview);
        assert_eq!(editor.copy(&mut clip), 2);

        let existing = editor.document().item_ids();
        editor.click(&inst, &ids[1], ClickMode::Plain, &mut SilentPreview);
        assert_eq!(editor.paste(&clip), 2);
        assert_eq!(tokens(&editor), vec!["C4", "D4", "C4", "E4", "E4"]);

        let pasted = editor.selection().members().clone();
        assert_eq!(pasted.len(), 2);
        assert!(pasted.iter().all(|id| !existing.contains(id)));
        assert_eq!(editor.document().item_ids().len(), 5);
        let anchor = editor.selection().anchor().unwrap();
        assert_eq!(editor.document().locate(anchor).unwrap().1, 3);
    }

    #[test]
    fn test_paste_ignores_foreign_clipboard() {
        let (mut editor, _) = editor_with(&["C4"]);
        let mut clip = MemoryClipboard::new();
        assert_eq!(editor.paste(&clip), 0);
        clip.write_text("not ours");
        assert_eq!(editor.paste(&clip), 0);
        assert_eq!(tokens(&editor), vec!["C4"]);
    }

    #[test]
    fn test_cut() {
        let (mut editor, ids) = editor_with(&["C4", "D4"]);
        let inst = first_instance(&editor);
        let mut clip = MemoryClipboard::new();
        editor.click(&inst, &ids[0], ClickMode::Plain, &mut SilentPreview);
        assert_eq!(editor.cut(&mut clip), 1);
        assert_eq!(tokens(&editor), vec!["D4"]);
        editor.paste(&clip);
        assert_eq!(tokens(&editor), vec!["D4", "C4"]);
    }

    #[test]
    fn test_move_within_section() {
        let (mut editor, ids) = editor_with(&["C4", "D4", "E4", "F4"]);
        let inst = first_instance(&editor);
        let section = editor.document().arrangement()[0].section_id.clone();
        editor.click(&inst, &ids[2], ClickMode::Plain, &mut SilentPreview);
        editor.click(&inst, &ids[3], ClickMode::Range, &mut SilentPreview);
        assert!(editor.move_items(&ids[3], &section, Some(&ids[0])));
        assert_eq!(tokens(&editor), vec!["E4", "F4", "C4", "D4"]);

        // onto its own block
        assert!(!editor.move_items(&ids[2], &section, Some(&ids[3])));
        // to where it already is
        assert!(!editor.move_items(&ids[2], &section, Some(&ids[0])));
    }

    #[test]
    fn test_move_between_sections_appends() {
        let (mut editor, ids) = editor_with(&["C4", "D4"]);
        editor.create_section("Chorus");
        let chorus = editor.document().arrangement()[1].section_id.clone();
        editor.escape();
        assert!(editor.move_items(&ids[0], &chorus, None));
        let doc = editor.document();
        assert_eq!(doc.locate(&ids[0]).unwrap().0, &chorus);
        assert_eq!(tokens(&editor), vec!["D4", "C4"]);
    }

    fn add_section(editor: &mut Editor, name: &str, notes: &[&str]) -> (InstanceId, Vec<ItemId>) {
        let inst = editor.create_section(name);
        editor.set_active_instance(&inst);
        editor.escape();
        let ids = notes
            .iter()
            .map(|n| editor.insert(Token::from(*n)).unwrap())
            .collect();
        editor.escape();
        (inst, ids)
    }

    #[test]
    fn test_move_selection_from_two_sections_into_a_third() {
        let (mut editor, a) = editor_with(&["C4", "D4"]);
        let first = first_instance(&editor);
        let (second, b) = add_section(&mut editor, "Bridge", &["E4", "F4"]);
        let (third, c) = add_section(&mut editor, "Coda", &["G4", "A4"]);
        let coda = editor.document().instance(&third).unwrap().section_id.clone();

        // clicked out of document order
        editor.click(&second, &b[1], ClickMode::Plain, &mut SilentPreview);
        editor.click(&first, &a[0], ClickMode::Toggle, &mut SilentPreview);
        assert!(editor.move_items(&b[1], &coda, Some(&c[1])));

        let doc = editor.document();
        let items = |inst: &InstanceId| {
            let section = &doc.instance(inst).unwrap().section_id;
            doc.section(section).unwrap().items.iter().map(|it| it.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(items(&first), vec![a[1].clone()]);
        assert_eq!(items(&second), vec![b[0].clone()]);
        assert_eq!(items(&third), vec![c[0].clone(), a[0].clone(), b[1].clone(), c[1].clone()]);
        assert_eq!(tokens(&editor), vec!["D4", "E4", "G4", "C4", "F4", "A4"]);
    }

    #[test]
    fn test_move_before_item_in_another_section_appends() {
        let (mut editor, a) = editor_with(&["C4", "D4"]);
        let (third, _) = add_section(&mut editor, "Coda", &["G4"]);
        let coda = editor.document().instance(&third).unwrap().section_id.clone();
        assert!(editor.move_items(&a[0], &coda, Some(&a[1])));
        assert_eq!(tokens(&editor), vec!["D4", "G4", "C4"]);
    }

    #[test]
    fn test_dirty_tracking() {
        let (mut editor, _) = editor_with(&["C4"]);
        assert!(editor.is_dirty());
        editor.mark_saved();
        assert!(!editor.is_dirty());
        editor.set_transpose(3);
        assert!(editor.is_dirty());
        editor.set_transpose(0);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_display_with_chart() {
        let (mut editor, _) = editor_with(&["C4", "—", "D4"]);
        editor.set_transpose(2);
        let shown: Vec<String> = editor
            .display(&FingeringChart::builtin())
            .iter()
            .map(|d| d.shown.to_string())
            .collect();
        assert_eq!(shown, vec!["D4", "—", "E4"]);
        assert_eq!(tokens(&editor), vec!["C4", "—", "D4"]);
    }
}
