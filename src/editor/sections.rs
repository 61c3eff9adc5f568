// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Section and arrangement edits.

use tracing::debug;

use super::session::Editor;
use crate::document::{
    duplicate_items, make_unique_name, ArrangementInstance, InstanceId, SectionDefinition,
    SectionId,
};

impl Editor {
    fn add_placed_section(&mut self, section: SectionDefinition) -> Option<InstanceId> {
        let instance = ArrangementInstance::new(section.id.clone());
        let instance_id = instance.id.clone();
        let next = self.document().with_patch(|d| {
            d.sections_mut().insert(section.id.clone(), section);
            d.arrangement_mut().push(instance);
            true
        });
        if !self.publish(next) {
            return None;
        }
        self.set_active_instance(&instance_id);
        Some(instance_id)
    }

    /// Add an empty section at the end of the arrangement and make it active
    pub fn create_section(&mut self, name: &str) -> InstanceId {
        let name = make_unique_name(name, &self.document().section_names());
        let section = SectionDefinition::new(SectionId::generate(), name);
        // inserting into a valid document always succeeds
        self.add_placed_section(section)
            .unwrap_or_else(|| self.document().arrangement()[0].id.clone())
    }

    /// Copy a section's items with fresh ids into a new, independent section
    pub fn duplicate_section(&mut self, source: &SectionId, name: &str) -> Option<InstanceId> {
        let src = self.document().section(source)?;
        let name = make_unique_name(name, &self.document().section_names());
        let mut section = SectionDefinition::new(SectionId::generate(), name);
        section.items = duplicate_items(&src.items);
        self.add_placed_section(section)
    }

    /// Place an existing section again. Both placements share its items.
    pub fn replicate_section(&mut self, source: &SectionId) -> Option<InstanceId> {
        self.document().section(source)?;
        let instance = ArrangementInstance::new(source.clone());
        let instance_id = instance.id.clone();
        let next = self.document().with_patch(|d| {
            d.arrangement_mut().push(instance);
            true
        });
        if !self.publish(next) {
            return None;
        }
        self.set_active_instance(&instance_id);
        Some(instance_id)
    }

    /// Rename a section, disambiguated against the others. Returns the name applied.
    pub fn rename_section(&mut self, section: &SectionId, name: &str) -> Option<String> {
        let others: Vec<String> = self
            .document()
            .sections()
            .values()
            .filter(|s| &s.id != section)
            .map(|s| s.name.clone())
            .collect();
        let unique = make_unique_name(name, &others);
        let applied = unique.clone();
        let next = self.document().with_patch(|d| match d.section_mut(section) {
            Some(s) => {
                s.name = unique;
                true
            }
            None => false,
        });
        self.publish(next).then_some(applied)
    }

    /// Drop a placement. Its section goes too when nothing else places it.
    pub fn remove_instance(&mut self, instance: &InstanceId) -> bool {
        let Some(section_id) = self
            .document()
            .instance(instance)
            .map(|inst| inst.section_id.clone())
        else {
            return false;
        };
        let shared = self.document().instance_count(&section_id) > 1;
        let next = self.document().with_patch(|d| {
            d.arrangement_mut().retain(|inst| &inst.id != instance);
            if !shared {
                d.sections_mut().remove(&section_id);
            }
            true
        });
        debug!("removed instance {} (section kept: {})", instance, shared);
        self.publish(next)
    }

    /// Move a placement to `index`, clamped to the arrangement
    pub fn reorder_instance(&mut self, instance: &InstanceId, index: usize) -> bool {
        let next = self.document().with_patch(|d| {
            let arrangement = d.arrangement_mut();
            let Some(from) = arrangement.iter().position(|inst| &inst.id == instance) else {
                return false;
            };
            let moved = arrangement.remove(from);
            let to = index.min(arrangement.len());
            arrangement.insert(to, moved);
            to != from
        });
        self.publish(next)
    }
}
