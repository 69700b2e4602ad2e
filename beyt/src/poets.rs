//! Session-local poet directory
//!
//! The poets endpoint returns bare names. Filter pickers need ids, so each
//! name gets its 1-based position in the list. Those ids are only meaningful
//! for the list they came from: never persist them.

use crate::interface::PoetEntry;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PoetDirectory {
    entries: Vec<PoetEntry>,
    by_name: HashMap<String, u64>,
}

impl PoetDirectory {
    pub fn from_names(names: Vec<String>) -> Self {
        let mut by_name = HashMap::with_capacity(names.len());
        let entries: Vec<PoetEntry> = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let id = index as u64 + 1;
                // First occurrence wins for duplicated names
                by_name.entry(name.clone()).or_insert(id);
                PoetEntry { id, name }
            })
            .collect();
        Self { entries, by_name }
    }

    pub fn entries(&self) -> &[PoetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn id_for(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    pub fn name_for(&self, id: u64) -> Option<&str> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.entries.get(index).map(|e| e.name.as_str())
    }

    /// Translate selected ids into the names the search endpoint filters on.
    /// Unknown ids are skipped.
    pub fn names_for(&self, ids: &[u64]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.name_for(*id))
            .map(str::to_string)
            .collect()
    }
}
