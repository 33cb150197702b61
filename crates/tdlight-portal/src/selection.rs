//! The working list of objects the user has found and may classify.

use std::collections::HashSet;

use tdlight_common::CelestialObject;

/// One row of the object list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEntry {
    pub object: CelestialObject,
    pub selected: bool,
}

impl SelectionEntry {
    fn new(object: CelestialObject) -> Self {
        Self { object, selected: true }
    }
}

/// Ordered object list keyed by `source_id`. Never holds two entries with
/// the same identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list. Duplicates inside `objects` keep their first
    /// occurrence. Every entry starts selected.
    pub fn replace(&mut self, objects: Vec<CelestialObject>) -> usize {
        self.entries.clear();
        self.append(objects)
    }

    /// Add objects not already listed; returns how many were added.
    pub fn append(&mut self, objects: Vec<CelestialObject>) -> usize {
        let mut seen: HashSet<String> = self
            .entries
            .iter()
            .map(|e| e.object.source_id.as_str().to_string())
            .collect();
        let before = self.entries.len();
        for object in objects {
            if seen.insert(object.source_id.as_str().to_string()) {
                self.entries.push(SelectionEntry::new(object));
            }
        }
        self.entries.len() - before
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.get(source_id).is_some()
    }

    pub fn get(&self, source_id: &str) -> Option<&SelectionEntry> {
        self.entries.iter().find(|e| e.object.source_id.as_str() == source_id)
    }

    pub fn get_mut(&mut self, source_id: &str) -> Option<&mut SelectionEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.object.source_id.as_str() == source_id)
    }

    /// Flip one entry; returns its new state, or `None` if it is not listed.
    pub fn toggle(&mut self, source_id: &str) -> Option<bool> {
        let entry = self.get_mut(source_id)?;
        entry.selected = !entry.selected;
        Some(entry.selected)
    }

    pub fn set_selected(&mut self, source_id: &str, selected: bool) -> bool {
        match self.get_mut(source_id) {
            Some(entry) => {
                entry.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for entry in &mut self.entries {
            entry.selected = selected;
        }
    }

    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.selected).count()
    }

    /// Whether the classify action is available.
    pub fn can_submit(&self) -> bool {
        self.enabled_count() > 0
    }

    pub fn enabled(&self) -> impl Iterator<Item = &CelestialObject> {
        self.entries.iter().filter(|e| e.selected).map(|e| &e.object)
    }

    pub fn objects(&self) -> impl Iterator<Item = &CelestialObject> {
        self.entries.iter().map(|e| &e.object)
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
