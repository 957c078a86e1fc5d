//! Per-source namespace index.
//!
//! A snapshot is a flat, time-ordered list of entries. Rules address data by
//! namespace, so each source is first regrouped into one ordered entry list
//! per namespace. The index owns those lists while the source's rules run and
//! is flattened back into a single ascending list afterwards.
//!
//! Namespaces keep first-encounter order. That order decides how equal-time
//! entries from different namespaces interleave when the index is flattened,
//! so it must not depend on hashing.

use std::str::FromStr;

use crate::entry::Entry;
use crate::error::EditError;
use crate::pattern::{NamePattern, substitute};

/// How a source's timeline is anchored in the combined output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertTime {
    /// No anchor given: the source starts at 0.
    #[default]
    Absent,
    /// The source starts at this literal time.
    Offset(i64),
    /// The source starts right after everything merged before it.
    Append,
}

impl InsertTime {
    /// Literal offset applied at load and honored by trim windows.
    pub const fn offset(self) -> i64 {
        match self {
            Self::Offset(offset) => offset,
            Self::Absent | Self::Append => 0,
        }
    }

    pub const fn is_append(self) -> bool {
        matches!(self, Self::Append)
    }
}

impl FromStr for InsertTime {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "Append" {
            return Ok(Self::Append);
        }
        trimmed
            .parse::<i64>()
            .map(Self::Offset)
            .map_err(|_| EditError::InvalidLiteral {
                node: "InsertTime".to_string(),
                field: "value",
                value: s.to_string(),
            })
    }
}

/// Stable merge of two entry lists by arrival time.
///
/// Entries of `a` come before entries of `b` with the same arrival time.
pub fn merge_entries(mut a: Vec<Entry>, b: Vec<Entry>) -> Vec<Entry> {
    a.extend(b);
    a.sort_by_key(Entry::arrival_time);
    a
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    entries: Vec<Entry>,
}

/// Namespace name → ordered entries, for one source.
#[derive(Debug, Clone, Default)]
pub struct NamespaceIndex {
    slots: Vec<Slot>,
}

impl NamespaceIndex {
    /// Groups entries by namespace and re-anchors each namespace's timeline.
    ///
    /// Every entry of a namespace moves to `original - (start - offset)`,
    /// where `start` is the arrival time of the namespace's first entry and
    /// `offset` the literal insert time (0 unless one is given).
    pub fn build(entries: Vec<Entry>, insert_time: InsertTime) -> Self {
        let mut starts: Vec<Option<i64>> = Vec::new();
        let mut index = Self::default();
        for entry in entries {
            let Some(name) = entry.namespace() else {
                tracing::warn!(
                    arrival_time = entry.arrival_time(),
                    "skipping empty data group"
                );
                continue;
            };
            let pos = index.position(name).unwrap_or_else(|| {
                index.slots.push(Slot {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
                starts.push(None);
                index.slots.len() - 1
            });
            starts[pos].get_or_insert(entry.arrival_time());
            index.slots[pos].entries.push(entry);
        }

        let offset = insert_time.offset();
        for (slot, start) in index.slots.iter_mut().zip(starts) {
            let shift = start.unwrap_or_default() - offset;
            for entry in &mut slot.entries {
                entry.set_arrival_time(entry.arrival_time() - shift);
            }
            slot.entries.sort_by_key(Entry::arrival_time);
        }
        index
    }

    /// Groups entries by namespace without touching arrival times.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            let Some(name) = entry.namespace() else {
                tracing::warn!(
                    arrival_time = entry.arrival_time(),
                    "skipping empty data group"
                );
                continue;
            };
            match index.position(name) {
                Some(pos) => index.slots[pos].entries.push(entry),
                None => index.slots.push(Slot {
                    name: name.to_string(),
                    entries: vec![entry],
                }),
            }
        }
        for slot in &mut index.slots {
            slot.entries.sort_by_key(Entry::arrival_time);
        }
        index
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    fn require(&self, name: &str) -> Result<usize, EditError> {
        self.position(name)
            .ok_or_else(|| EditError::NamespaceNotFound(name.to_string()))
    }

    /// Number of namespaces.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Namespace names in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Whether a namespace with exactly this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn entries(&self, name: &str) -> Option<&[Entry]> {
        self.position(name).map(|pos| self.slots[pos].entries.as_slice())
    }

    pub(crate) fn entries_mut(&mut self, name: &str) -> Result<&mut Vec<Entry>, EditError> {
        let pos = self.require(name)?;
        Ok(&mut self.slots[pos].entries)
    }

    /// Takes a namespace's entries, leaving its slot empty. Absent
    /// namespaces yield nothing.
    pub(crate) fn take(&mut self, name: &str) -> Vec<Entry> {
        self.position(name)
            .map(|pos| std::mem::take(&mut self.slots[pos].entries))
            .unwrap_or_default()
    }

    /// Replaces a namespace's entries, creating the namespace at the end of
    /// the index if it does not exist yet.
    pub(crate) fn put(&mut self, name: &str, entries: Vec<Entry>) {
        match self.position(name) {
            Some(pos) => self.slots[pos].entries = entries,
            None => self.slots.push(Slot {
                name: name.to_string(),
                entries,
            }),
        }
    }

    /// Names of existing namespaces matching a case-insensitive wildcard
    /// pattern, in index order.
    pub fn match_namespaces(&self, pattern: &str) -> Vec<String> {
        let pattern = NamePattern::new(pattern);
        self.names()
            .filter(|name| pattern.matches(name))
            .map(str::to_string)
            .collect()
    }

    /// Total data points across all namespaces, group members included.
    pub fn point_count(&self) -> usize {
        self.slots
            .iter()
            .flat_map(|slot| &slot.entries)
            .map(Entry::point_count)
            .sum()
    }

    /// All entries in one ascending list.
    pub fn flatten(self) -> Vec<Entry> {
        let mut merged: Vec<Entry> = self.slots.into_iter().flat_map(|s| s.entries).collect();
        merged.sort_by_key(Entry::arrival_time);
        merged
    }

    /// Removes a namespace by exact name.
    pub fn remove_namespace(&mut self, name: &str) -> Result<Vec<Entry>, EditError> {
        let pos = self.require(name)?;
        let slot = self.slots.remove(pos);
        tracing::info!(namespace = %name, entries = slot.entries.len(), "removed namespace");
        Ok(slot.entries)
    }

    /// Removes every namespace matching `pattern`. Returns how many went.
    pub fn delete_namespaces(&mut self, pattern: &str) -> usize {
        let matches = self.match_namespaces(pattern);
        if matches.is_empty() {
            tracing::warn!(pattern, "cannot delete namespace: no match");
        }
        for name in &matches {
            if let Some(pos) = self.position(name) {
                self.slots.remove(pos);
                tracing::info!(namespace = %name, "namespace deleted");
            }
        }
        matches.len()
    }

    /// Renames one namespace. Returns the number of entries rewritten.
    ///
    /// The renamed list is built under the new key and swapped into the old
    /// slot, so the namespace keeps its place in the index.
    pub fn rename_namespace_one(&mut self, name: &str, new_name: &str) -> Result<usize, EditError> {
        if name == new_name {
            let pos = self.require(name)?;
            return Ok(self.slots[pos].entries.len());
        }
        if self.contains(new_name) {
            return Err(EditError::NamespaceExists(new_name.to_string()));
        }
        let pos = self.require(name)?;
        let mut entries = std::mem::take(&mut self.slots[pos].entries);
        for entry in &mut entries {
            entry.set_namespace(new_name);
        }
        let count = entries.len();
        self.slots[pos] = Slot {
            name: new_name.to_string(),
            entries,
        };
        tracing::info!(from = %name, to = %new_name, "renamed namespace");
        Ok(count)
    }

    /// Renames every namespace matching `pattern`; `*` in `new_pattern` is
    /// replaced by the matched name. Returns the number renamed.
    pub fn rename_namespace(&mut self, pattern: &str, new_pattern: &str) -> Result<usize, EditError> {
        let matches = self.match_namespaces(pattern);
        if matches.is_empty() {
            tracing::warn!(pattern, "cannot rename namespace: no match");
        }
        for name in &matches {
            self.rename_namespace_one(name, &substitute(new_pattern, name))?;
        }
        Ok(matches.len())
    }

    /// Deep-copies one namespace under a new name. Returns entries copied.
    pub fn copy_namespace_one(&mut self, name: &str, new_name: &str) -> Result<usize, EditError> {
        if self.contains(new_name) {
            return Err(EditError::NamespaceExists(new_name.to_string()));
        }
        let pos = self.require(name)?;
        let mut entries = self.slots[pos].entries.clone();
        for entry in &mut entries {
            entry.set_namespace(new_name);
        }
        let count = entries.len();
        self.slots.push(Slot {
            name: new_name.to_string(),
            entries,
        });
        tracing::info!(from = %name, to = %new_name, "duplicated namespace");
        Ok(count)
    }

    /// Copies every namespace matching `pattern` under a `*`-substituted
    /// name. Returns the number of namespaces copied.
    pub fn copy_namespace(&mut self, pattern: &str, new_pattern: &str) -> Result<usize, EditError> {
        let matches = self.match_namespaces(pattern);
        if matches.is_empty() {
            tracing::warn!(pattern, "cannot copy namespace: no match");
        }
        for name in &matches {
            self.copy_namespace_one(name, &substitute(new_pattern, name))?;
        }
        Ok(matches.len())
    }

    /// Merges a copy of `name` into `dest`, creating `dest` if needed.
    ///
    /// Entries already in `dest` precede copied entries with the same
    /// arrival time. Returns the number of entries merged in.
    pub fn merge_into(&mut self, name: &str, dest: &str) -> Result<usize, EditError> {
        if name == dest {
            return Err(EditError::SelfMerge(name.to_string()));
        }
        let pos = self.require(name)?;
        let mut copied = self.slots[pos].entries.clone();
        for entry in &mut copied {
            entry.set_namespace(dest);
        }
        let count = copied.len();
        let existing = self.take(dest);
        self.put(dest, merge_entries(existing, copied));
        tracing::info!(from = %name, into = %dest, entries = count, "merged namespace");
        Ok(count)
    }

    /// Merges every namespace matching `pattern` into `dest`.
    ///
    /// `dest` is skipped if it matches the pattern itself.
    pub fn merge_with_namespace(&mut self, pattern: &str, dest: &str) -> Result<usize, EditError> {
        let matches: Vec<String> = self
            .match_namespaces(pattern)
            .into_iter()
            .filter(|name| name != dest)
            .collect();
        if matches.is_empty() {
            return Err(EditError::NamespaceNotFound(pattern.to_string()));
        }
        let mut merged = 0;
        for name in &matches {
            merged += self.merge_into(name, dest)?;
        }
        Ok(merged)
    }
}
