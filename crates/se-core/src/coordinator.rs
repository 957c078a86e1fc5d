//! Combines processed sources into the final output sequence.

use crate::entry::Entry;
use crate::index::{InsertTime, NamespaceIndex, merge_entries};

/// Collects each source's flattened entries and merges them in order.
///
/// Sources anchored at a literal time (or not anchored at all) are merged
/// first, in the order they were pushed. Append sources then follow, each
/// shifted so its first entry lands one tick after everything merged so far.
#[derive(Debug, Default)]
pub struct MergeCoordinator {
    timed: Vec<Vec<Entry>>,
    appended: Vec<Vec<Entry>>,
}

impl MergeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands over a source's finished index.
    pub fn push(&mut self, insert_time: InsertTime, index: NamespaceIndex) {
        let entries = index.flatten();
        if insert_time.is_append() {
            self.appended.push(entries);
        } else {
            self.timed.push(entries);
        }
    }

    /// Number of sources pushed so far.
    pub fn len(&self) -> usize {
        self.timed.len() + self.appended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges every source into one ascending list.
    pub fn finish(self) -> Vec<Entry> {
        let mut merged = self
            .timed
            .into_iter()
            .fold(Vec::new(), merge_entries);

        for mut entries in self.appended {
            let running_max = merged.last().map_or(0, Entry::arrival_time);
            let Some(first) = entries.first().map(Entry::arrival_time) else {
                continue;
            };
            let shift = running_max + 1 - first;
            for entry in &mut entries {
                entry.set_arrival_time(entry.arrival_time() + shift);
            }
            tracing::debug!(running_max, shift, entries = entries.len(), "appended source");
            merged = merge_entries(merged, entries);
        }
        merged
    }
}
