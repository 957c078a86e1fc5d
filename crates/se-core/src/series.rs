//! Time and value operations on a single namespace.
//!
//! Every operation takes an exact namespace name (wildcards are resolved by
//! the caller) and returns how many entries or points it affected. Fatal
//! conditions return [`EditError`]; conditions that merely make an operation
//! a no-op are logged and reported as zero.

use std::collections::HashSet;

use crate::entry::{DataPoint, Entry};
use crate::error::EditError;
use crate::index::{NamespaceIndex, merge_entries};
use crate::pattern::{NamePattern, same_name, substitute};
use crate::value::{decimal_digits, format_fixed, format_natural, parse_numeric};

impl NamespaceIndex {
    fn has_id(&self, namespace: &str, id: &str) -> bool {
        self.entries(namespace).is_some_and(|entries| {
            entries
                .iter()
                .flat_map(Entry::points)
                .any(|point| same_name(&point.id, id))
        })
    }

    /// Keeps the entries whose `arrival_time - offset` falls in
    /// `[start, end]`. Returns the number of entries removed.
    ///
    /// An `end` beyond the namespace's last entry leaves the tail alone.
    pub fn trim(
        &mut self,
        namespace: &str,
        start: i64,
        end: i64,
        offset: i64,
    ) -> Result<usize, EditError> {
        if start < 0 || end < 0 || end < start {
            return Err(EditError::InvalidTrim { start, end });
        }
        let entries = self.entries_mut(namespace)?;
        let Some(last) = entries.last().map(Entry::arrival_time) else {
            tracing::info!(namespace, "namespace is empty, skipping trim");
            return Ok(0);
        };

        let first_kept = entries.partition_point(|e| e.arrival_time() - offset < start);
        let end_kept = if end > last - offset {
            tracing::warn!(namespace, end, "trim end is past the end of the namespace, ignoring");
            entries.len()
        } else {
            entries.partition_point(|e| e.arrival_time() - offset <= end)
        };

        let before = entries.len();
        entries.truncate(end_kept);
        let head = first_kept.min(entries.len());
        entries.drain(..head);
        let removed = before - entries.len();
        tracing::info!(namespace, start, end, removed, "trimmed namespace");
        Ok(removed)
    }

    /// Rescales a namespace's timeline so it covers `runtime`.
    ///
    /// Each arrival time becomes `round(time * runtime / (last - first))`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        reason = "arrival times are far below 2^52"
    )]
    pub fn span(&mut self, namespace: &str, runtime: i64) -> Result<usize, EditError> {
        if runtime < 0 {
            return Err(EditError::InvalidLiteral {
                node: "Span".to_string(),
                field: "RunTime",
                value: runtime.to_string(),
            });
        }
        let entries = self.entries_mut(namespace)?;
        let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
            tracing::info!(namespace, "namespace is empty, skipping span");
            return Ok(0);
        };
        let duration = last.arrival_time() - first.arrival_time();
        if duration == 0 {
            return Err(EditError::ZeroSpan(namespace.to_string()));
        }

        let factor = runtime as f64 / duration as f64;
        for entry in entries.iter_mut() {
            let scaled = (entry.arrival_time() as f64 * factor).round() as i64;
            entry.set_arrival_time(scaled);
        }
        tracing::info!(namespace, runtime, factor, "spanned namespace");
        Ok(entries.len())
    }

    /// Multiplies every numeric value whose ID matches `id_pattern`.
    ///
    /// With `precision` the result is rendered with that many decimals.
    /// Non-numeric values are skipped. At least one ID must match.
    pub fn scale(
        &mut self,
        namespace: &str,
        id_pattern: &str,
        factor: f64,
        precision: Option<usize>,
    ) -> Result<usize, EditError> {
        let pattern = NamePattern::new(id_pattern);
        let entries = self.entries_mut(namespace)?;
        let mut matched = 0;
        let mut scaled = 0;
        for point in entries
            .iter_mut()
            .flat_map(Entry::points_mut)
            .filter(|p| pattern.matches(&p.id))
        {
            matched += 1;
            let Some(value) = parse_numeric(&point.value) else {
                tracing::warn!(namespace, id = %point.id, value = %point.value, "not numeric, skipping scale");
                continue;
            };
            let result = value * factor;
            point.value = precision.map_or_else(
                || format_natural(result),
                |digits| format_fixed(result, digits),
            );
            scaled += 1;
        }
        if matched == 0 {
            return Err(EditError::IdNotFound {
                namespace: namespace.to_string(),
                id: id_pattern.to_string(),
            });
        }
        tracing::info!(namespace, id = id_pattern, factor, scaled, "scaled values");
        Ok(scaled)
    }

    /// Clamps numeric values into `[min, max]`. Returns how many changed.
    pub fn bound(
        &mut self,
        namespace: &str,
        id_pattern: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<usize, EditError> {
        if min.is_none() && max.is_none() {
            return Err(EditError::MissingBounds {
                namespace: namespace.to_string(),
            });
        }
        let pattern = NamePattern::new(id_pattern);
        let entries = self.entries_mut(namespace)?;
        let mut matched = 0;
        let mut clamped = 0;
        for point in entries
            .iter_mut()
            .flat_map(Entry::points_mut)
            .filter(|p| pattern.matches(&p.id))
        {
            matched += 1;
            let Some(value) = parse_numeric(&point.value) else {
                tracing::warn!(namespace, id = %point.id, value = %point.value, "not numeric, skipping bound");
                continue;
            };
            let mut bounded = None;
            if let Some(min) = min.filter(|min| value < *min) {
                bounded = Some(min);
            }
            if let Some(max) = max.filter(|max| bounded.unwrap_or(value) > *max) {
                bounded = Some(max);
            }
            if let Some(bounded) = bounded {
                point.value = format_natural(bounded);
                clamped += 1;
            }
        }
        if matched == 0 {
            tracing::warn!(namespace, id = id_pattern, "no matching IDs to bound");
        }
        tracing::info!(namespace, id = id_pattern, clamped, "bound values");
        Ok(clamped)
    }

    /// Adds `delta` to every numeric value whose ID matches.
    pub fn delta(&mut self, namespace: &str, id_pattern: &str, delta: f64) -> Result<usize, EditError> {
        let pattern = NamePattern::new(id_pattern);
        let entries = self.entries_mut(namespace)?;
        let mut matched = 0;
        let mut shifted = 0;
        for point in entries
            .iter_mut()
            .flat_map(Entry::points_mut)
            .filter(|p| pattern.matches(&p.id))
        {
            matched += 1;
            let Some(value) = parse_numeric(&point.value) else {
                tracing::warn!(namespace, id = %point.id, value = %point.value, "not numeric, skipping delta");
                continue;
            };
            point.value = format_natural(value + delta);
            shifted += 1;
        }
        if matched == 0 {
            tracing::warn!(namespace, id = id_pattern, "no matching IDs to shift");
        }
        tracing::info!(namespace, id = id_pattern, delta, shifted, "shifted values");
        Ok(shifted)
    }

    /// Adds a literal to every value of an existing ID.
    ///
    /// The result keeps as many decimals as the more precise operand.
    pub fn add_value(&mut self, namespace: &str, id: &str, literal: &str) -> Result<usize, EditError> {
        let addend = parse_numeric(literal).ok_or_else(|| EditError::InvalidLiteral {
            node: "AddValue".to_string(),
            field: "Value",
            value: literal.to_string(),
        })?;
        if !self.contains(namespace) {
            return Err(EditError::NamespaceNotFound(namespace.to_string()));
        }
        if !self.has_id(namespace, id) {
            return Err(EditError::IdNotFound {
                namespace: namespace.to_string(),
                id: id.to_string(),
            });
        }

        let literal_digits = decimal_digits(literal);
        let entries = self.entries_mut(namespace)?;
        let mut changed = 0;
        for point in entries
            .iter_mut()
            .flat_map(Entry::points_mut)
            .filter(|p| same_name(&p.id, id))
        {
            let value = parse_numeric(&point.value).ok_or_else(|| EditError::NonNumeric {
                namespace: namespace.to_string(),
                id: point.id.clone(),
                value: point.value.clone(),
            })?;
            let precision = literal_digits.max(decimal_digits(&point.value));
            point.value = format_fixed(value + addend, precision);
            changed += 1;
        }
        tracing::info!(namespace, id, literal, changed, "added value");
        Ok(changed)
    }

    /// Removes matching data points, and matching members from groups.
    ///
    /// A group survives as long as it keeps at least one member.
    pub fn delete_id(&mut self, namespace: &str, id_pattern: &str) -> Result<usize, EditError> {
        let pattern = NamePattern::new(id_pattern);
        let entries = self.entries_mut(namespace)?;
        let mut removed = 0;
        entries.retain_mut(|entry| match entry {
            Entry::Point(point) => {
                let matched = pattern.matches(&point.id);
                if matched {
                    removed += 1;
                }
                !matched
            }
            Entry::Group(group) => {
                let before = group.points.len();
                group.points.retain(|p| !pattern.matches(&p.id));
                removed += before - group.points.len();
                !group.points.is_empty()
            }
        });
        if removed == 0 {
            tracing::warn!(namespace, id = id_pattern, "no matching IDs to delete");
        } else {
            tracing::info!(namespace, id = id_pattern, removed, "deleted IDs");
        }
        Ok(removed)
    }

    /// Inserts a data point before the first entry at or after `time`.
    ///
    /// With an interval the insert repeats every `interval` ticks for as long
    /// as there is a later entry to insert before. Returns points inserted.
    pub fn insert_id(
        &mut self,
        namespace: &str,
        id: &str,
        value: &str,
        time: i64,
        interval: Option<i64>,
    ) -> Result<usize, EditError> {
        if let Some(step) = interval.filter(|step| *step <= 0) {
            return Err(EditError::InvalidInterval(step));
        }
        let entries = self.entries_mut(namespace)?;
        let mut inserted = 0;
        let mut at = time;
        loop {
            let pos = entries.partition_point(|e| e.arrival_time() < at);
            if pos == entries.len() {
                break;
            }
            entries.insert(pos, Entry::Point(DataPoint::new(namespace, id, value, at)));
            inserted += 1;
            match interval.and_then(|step| at.checked_add(step)) {
                Some(next) => at = next,
                None => break,
            }
        }
        if inserted == 0 {
            tracing::warn!(namespace, id, time, "insert time is past the end of the namespace");
        } else {
            tracing::info!(namespace, id, time, inserted, "inserted data points");
        }
        Ok(inserted)
    }

    /// Seeds every distinct ID of the namespace once with `value` at `time`.
    ///
    /// Each seed goes in front of the first entry at or after `time`, which
    /// after the first seed is the previous seed, so seeds end up in reverse
    /// order of first occurrence.
    pub fn init_all_ids(&mut self, namespace: &str, value: &str, time: i64) -> Result<usize, EditError> {
        let entries = self.entries_mut(namespace)?;
        let ids: Vec<String> = {
            let mut seen = HashSet::new();
            entries
                .iter()
                .flat_map(Entry::points)
                .filter(|point| seen.insert(point.id.as_str()))
                .map(|point| point.id.clone())
                .collect()
        };

        let pos = entries.partition_point(|e| e.arrival_time() < time);
        let count = ids.len();
        entries.splice(
            pos..pos,
            ids.into_iter()
                .rev()
                .map(|id| Entry::Point(DataPoint::new(namespace, id, value, time))),
        );
        tracing::info!(namespace, time, count, "initialized IDs");
        Ok(count)
    }

    /// Renames one ID within a namespace.
    pub fn rename_id(&mut self, namespace: &str, id: &str, new_id: &str) -> Result<usize, EditError> {
        if !self.contains(namespace) {
            return Err(EditError::NamespaceNotFound(namespace.to_string()));
        }
        if !self.has_id(namespace, id) {
            return Err(EditError::IdNotFound {
                namespace: namespace.to_string(),
                id: id.to_string(),
            });
        }
        if self.has_id(namespace, new_id) {
            return Err(EditError::IdExists {
                namespace: namespace.to_string(),
                id: new_id.to_string(),
            });
        }

        let entries = self.entries_mut(namespace)?;
        let mut changed = 0;
        for point in entries
            .iter_mut()
            .flat_map(Entry::points_mut)
            .filter(|p| same_name(&p.id, id))
        {
            new_id.clone_into(&mut point.id);
            changed += 1;
        }
        tracing::info!(namespace, from = id, to = new_id, changed, "renamed ID");
        Ok(changed)
    }

    /// Renames matching IDs in every matching namespace; `*` in
    /// `new_pattern` is replaced by the old ID.
    ///
    /// Returns the points renamed and the number of distinct new IDs.
    pub fn rename_ids(
        &mut self,
        namespace_pattern: &str,
        id_pattern: &str,
        new_pattern: &str,
    ) -> Result<(usize, usize), EditError> {
        let pattern = NamePattern::new(id_pattern);
        let namespaces = self.match_namespaces(namespace_pattern);
        if namespaces.is_empty() {
            tracing::warn!(pattern = namespace_pattern, "no matching namespace to rename IDs in");
        }

        let mut points = 0;
        let mut new_ids = HashSet::new();
        for namespace in &namespaces {
            let entries = self.entries_mut(namespace)?;
            let untouched: HashSet<String> = entries
                .iter()
                .flat_map(Entry::points)
                .filter(|p| !pattern.matches(&p.id))
                .map(|p| p.id.to_lowercase())
                .collect();
            if let Some(clash) = entries
                .iter()
                .flat_map(Entry::points)
                .filter(|p| pattern.matches(&p.id))
                .map(|p| substitute(new_pattern, &p.id))
                .find(|new_id| untouched.contains(&new_id.to_lowercase()))
            {
                return Err(EditError::IdExists {
                    namespace: namespace.clone(),
                    id: clash,
                });
            }

            for point in entries
                .iter_mut()
                .flat_map(Entry::points_mut)
                .filter(|p| pattern.matches(&p.id))
            {
                point.id = substitute(new_pattern, &point.id);
                new_ids.insert(point.id.to_lowercase());
                points += 1;
            }
        }
        tracing::info!(id = id_pattern, points, ids = new_ids.len(), "renamed IDs");
        Ok((points, new_ids.len()))
    }

    /// Copies matching data points of every matching namespace into a
    /// `*`-substituted destination namespace and ID.
    ///
    /// The destination is created if absent, otherwise the copies are merged
    /// in by arrival time. Group members cannot be copied.
    pub fn copy_id(
        &mut self,
        namespace_pattern: &str,
        id_pattern: &str,
        new_namespace_pattern: &str,
        new_id_pattern: &str,
    ) -> Result<usize, EditError> {
        let pattern = NamePattern::new(id_pattern);
        let namespaces = self.match_namespaces(namespace_pattern);
        if namespaces.is_empty() {
            tracing::warn!(pattern = namespace_pattern, "no matching namespace to copy IDs from");
        }

        let mut copied = 0;
        for namespace in &namespaces {
            let dest = substitute(new_namespace_pattern, namespace);
            let mut copies = Vec::new();
            for entry in self.entries(namespace).unwrap_or_default() {
                match entry {
                    Entry::Point(point) if pattern.matches(&point.id) => {
                        let mut copy = point.clone();
                        copy.id = substitute(new_id_pattern, &point.id);
                        copy.namespace.clone_from(&dest);
                        copies.push(Entry::Point(copy));
                    }
                    Entry::Point(_) => {}
                    Entry::Group(group) => {
                        if group.points.iter().any(|p| pattern.matches(&p.id)) {
                            return Err(EditError::Unsupported {
                                operation: "CopyID",
                                namespace: namespace.clone(),
                            });
                        }
                    }
                }
            }
            copied += copies.len();
            tracing::info!(from = %namespace, to = %dest, points = copies.len(), "copied IDs");
            let existing = self.take(&dest);
            self.put(&dest, merge_entries(existing, copies));
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DataGroup;
    use crate::index::InsertTime;

    fn point(ns: &str, id: &str, value: &str, time: i64) -> Entry {
        Entry::Point(DataPoint::new(ns, id, value, time))
    }

    fn index(entries: Vec<Entry>) -> NamespaceIndex {
        NamespaceIndex::from_entries(entries)
    }

    fn times(index: &NamespaceIndex, ns: &str) -> Vec<i64> {
        index.entries(ns).unwrap().iter().map(Entry::arrival_time).collect()
    }

    fn values(index: &NamespaceIndex, ns: &str, id: &str) -> Vec<String> {
        index
            .entries(ns)
            .unwrap()
            .iter()
            .flat_map(Entry::points)
            .filter(|p| p.id == id)
            .map(|p| p.value.clone())
            .collect()
    }

    fn temp_namespace() -> NamespaceIndex {
        let mut entries = Vec::new();
        for t in [0, 10, 20] {
            entries.push(point("Temp", "sensor1", &format!("{}", t + 1), t));
            entries.push(point("Temp", "sensor2", &format!("{}.5", t + 2), t));
        }
        index(entries)
    }

    fn series(ns: &str, id: &str, times: &[i64]) -> NamespaceIndex {
        index(
            times
                .iter()
                .map(|t| point(ns, id, &t.to_string(), *t))
                .collect(),
        )
    }

    #[test]
    fn trim_keeps_window() {
        let mut idx = series("a", "x", &[0, 5, 10, 15, 20]);
        let removed = idx.trim("a", 5, 15, 0).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(times(&idx, "a"), [5, 10, 15]);
    }

    #[test]
    fn trim_full_range_is_noop() {
        let mut idx = series("a", "x", &[0, 5, 10]);
        assert_eq!(idx.trim("a", 0, 10, 0).unwrap(), 0);
        assert_eq!(times(&idx, "a"), [0, 5, 10]);
    }

    #[test]
    fn trim_end_past_span_is_ignored() {
        let mut idx = series("a", "x", &[0, 5, 10]);
        idx.trim("a", 3, 1000, 0).unwrap();
        assert_eq!(times(&idx, "a"), [5, 10]);
    }

    #[test]
    fn trim_window_is_relative_to_offset() {
        let raw = vec![point("a", "x", "1", 0), point("a", "x", "2", 10), point("a", "x", "3", 20)];
        let mut idx = NamespaceIndex::build(raw, InsertTime::Offset(100));
        assert_eq!(times(&idx, "a"), [100, 110, 120]);
        idx.trim("a", 10, 20, 100).unwrap();
        assert_eq!(times(&idx, "a"), [110, 120]);
    }

    #[test]
    fn trim_rejects_bad_bounds() {
        let mut idx = series("a", "x", &[0, 5]);
        assert_eq!(
            idx.trim("a", 5, 1, 0),
            Err(EditError::InvalidTrim { start: 5, end: 1 })
        );
        assert!(idx.trim("a", -1, 1, 0).is_err());
    }

    #[test]
    fn trim_empty_namespace_is_skipped() {
        let mut idx = series("a", "x", &[0]);
        idx.delete_id("a", "x").unwrap();
        assert_eq!(idx.trim("a", 0, 5, 0).unwrap(), 0);
    }

    #[test]
    fn span_rescales_duration() {
        let mut idx = series("a", "x", &[0, 3, 7, 10]);
        idx.span("a", 25).unwrap();
        let t = times(&idx, "a");
        assert_eq!(t, [0, 8, 18, 25]);
        assert_eq!(t[3] - t[0], 25);
    }

    #[test]
    fn span_rejects_zero_duration() {
        let mut idx = series("a", "x", &[4, 4]);
        assert_eq!(idx.span("a", 10), Err(EditError::ZeroSpan("a".into())));
    }

    #[test]
    fn scale_then_inverse_restores_value() {
        let mut idx = index(vec![point("a", "x", "3", 0), point("a", "x", "0.1", 1)]);
        idx.scale("a", "x", 2.0, None).unwrap();
        assert_eq!(values(&idx, "a", "x"), ["6", "0.2"]);
        idx.scale("a", "X", 0.5, None).unwrap();
        assert_eq!(values(&idx, "a", "x"), ["3", "0.1"]);
    }

    #[test]
    fn scale_with_precision_and_text_values() {
        let mut idx = index(vec![point("a", "x", "1", 0), point("a", "x", "up", 1)]);
        let scaled = idx.scale("a", "x", 1.0 / 3.0, Some(2)).unwrap();
        assert_eq!(scaled, 1);
        assert_eq!(values(&idx, "a", "x"), ["0.33", "up"]);
    }

    #[test]
    fn scale_requires_matching_id() {
        let mut idx = series("a", "x", &[0]);
        assert!(matches!(
            idx.scale("a", "missing", 2.0, None),
            Err(EditError::IdNotFound { .. })
        ));
    }

    #[test]
    fn bound_clamps_and_counts_changes() {
        let mut idx = index(vec![
            point("a", "x", "-5", 0),
            point("a", "x", "50", 1),
            point("a", "x", "150", 2),
        ]);
        let clamped = idx.bound("a", "x", Some(0.0), Some(100.0)).unwrap();
        assert_eq!(clamped, 2);
        assert_eq!(values(&idx, "a", "x"), ["0", "50", "100"]);
    }

    #[test]
    fn bound_needs_a_limit() {
        let mut idx = series("a", "x", &[0]);
        assert!(matches!(
            idx.bound("a", "x", None, None),
            Err(EditError::MissingBounds { .. })
        ));
        assert_eq!(idx.bound("a", "nope", Some(1.0), None).unwrap(), 0);
    }

    #[test]
    fn bound_reaches_group_members() {
        let group = Entry::Group(DataGroup::new(
            0,
            vec![DataPoint::new("a", "x", "500", 0), DataPoint::new("a", "y", "500", 0)],
        ));
        let mut idx = index(vec![group]);
        assert_eq!(idx.bound("a", "x", None, Some(10.0)).unwrap(), 1);
        assert_eq!(values(&idx, "a", "x"), ["10"]);
        assert_eq!(values(&idx, "a", "y"), ["500"]);
    }

    #[test]
    fn delta_shifts_numeric_values() {
        let mut idx = index(vec![point("a", "x", "1.5", 0), point("a", "x", "n/a", 1)]);
        assert_eq!(idx.delta("a", "x", 2.0).unwrap(), 1);
        assert_eq!(values(&idx, "a", "x"), ["3.5", "n/a"]);
    }

    #[test]
    fn add_value_uses_larger_precision() {
        let mut idx = index(vec![point("a", "x", "2", 0), point("a", "x", "0.125", 1)]);
        idx.add_value("a", "x", "1.50").unwrap();
        assert_eq!(values(&idx, "a", "x"), ["3.50", "1.625"]);
    }

    #[test]
    fn add_value_requires_existing_numeric_id() {
        let mut idx = index(vec![point("a", "x", "on", 0)]);
        assert!(matches!(
            idx.add_value("a", "y", "1"),
            Err(EditError::IdNotFound { .. })
        ));
        assert!(matches!(
            idx.add_value("a", "x", "1"),
            Err(EditError::NonNumeric { .. })
        ));
        assert!(matches!(
            idx.add_value("a", "x", "one"),
            Err(EditError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn delete_id_leaves_other_series_untouched() {
        let mut idx = temp_namespace();
        let removed = idx.delete_id("Temp", "sensor1").unwrap();
        assert_eq!(removed, 3);
        let remaining = idx.entries("Temp").unwrap();
        assert!(remaining.iter().flat_map(Entry::points).all(|p| p.id == "sensor2"));
        assert_eq!(times(&idx, "Temp"), [0, 10, 20]);
        assert_eq!(values(&idx, "Temp", "sensor2"), ["2.5", "12.5", "22.5"]);
    }

    #[test]
    fn delete_id_filters_group_members() {
        let group = Entry::Group(DataGroup::new(
            0,
            vec![DataPoint::new("a", "x", "1", 0), DataPoint::new("a", "y", "2", 0)],
        ));
        let lone = Entry::Group(DataGroup::new(1, vec![DataPoint::new("a", "x", "3", 0)]));
        let mut idx = index(vec![group, lone]);
        assert_eq!(idx.delete_id("a", "X").unwrap(), 2);
        let entries = idx.entries("a").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].point_count(), 1);
        assert_eq!(idx.delete_id("a", "zzz").unwrap(), 0);
    }

    #[test]
    fn delete_id_drops_group_left_without_members() {
        let group = Entry::Group(DataGroup::new(5, vec![DataPoint::new("a", "x", "1", 0)]));
        let mut idx = index(vec![point("a", "y", "0", 0), group]);
        assert_eq!(idx.delete_id("a", "x").unwrap(), 1);
        let entries = idx.entries("a").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.iter().all(|e| e.point_count() > 0));
        assert_eq!(times(&idx, "a"), [0]);
    }

    #[test]
    fn insert_places_point_before_later_entry() {
        let mut idx = series("a", "x", &[0, 10, 20]);
        assert_eq!(idx.insert_id("a", "marker", "1", 10, None).unwrap(), 1);
        let entries = idx.entries("a").unwrap();
        assert_eq!(entries[1].points().next().unwrap().id, "marker");
        assert_eq!(times(&idx, "a"), [0, 10, 10, 20]);
    }

    #[test]
    fn insert_past_end_inserts_nothing() {
        let mut idx = series("a", "x", &[0, 10]);
        assert_eq!(idx.insert_id("a", "m", "1", 11, None).unwrap(), 0);
    }

    #[test]
    fn insert_interval_stops_instead_of_overflowing() {
        let mut idx = series("a", "x", &[10]);
        let inserted = idx.insert_id("a", "m", "1", 1, Some(i64::MAX)).unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(times(&idx, "a"), [1, 10]);
    }

    #[test]
    fn insert_with_interval_repeats_until_end() {
        let mut idx = series("a", "x", &[0, 10, 20]);
        let inserted = idx.insert_id("a", "tick", "0", 0, Some(7)).unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(times(&idx, "a"), [0, 0, 7, 10, 14, 20]);
        assert!(matches!(
            idx.insert_id("a", "tick", "0", 0, Some(0)),
            Err(EditError::InvalidInterval(0))
        ));
    }

    #[test]
    fn init_all_seeds_each_id_once() {
        let group = Entry::Group(DataGroup::new(
            5,
            vec![DataPoint::new("a", "z", "9", 0), DataPoint::new("a", "x", "9", 0)],
        ));
        let mut idx = index(vec![
            point("a", "x", "1", 0),
            point("a", "y", "1", 3),
            group,
            point("a", "x", "2", 8),
        ]);
        let seeded = idx.init_all_ids("a", "0", 4).unwrap();
        assert_eq!(seeded, 3);
        let ids: Vec<_> = idx.entries("a").unwrap()[2..5]
            .iter()
            .flat_map(Entry::points)
            .map(|p| (p.id.as_str(), p.value.as_str(), p.arrival_time))
            .collect();
        assert_eq!(ids, [("z", "0", 4), ("y", "0", 4), ("x", "0", 4)]);
    }

    #[test]
    fn init_all_seeds_precede_existing_entries_at_same_time() {
        let mut idx = index(vec![point("a", "x", "1", 10), point("a", "y", "1", 10)]);
        idx.init_all_ids("a", "0", 0).unwrap();
        let ids: Vec<_> = idx
            .entries("a")
            .unwrap()
            .iter()
            .flat_map(Entry::points)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, ["y", "x", "x", "y"]);
        assert_eq!(times(&idx, "a"), [0, 0, 10, 10]);
    }

    #[test]
    fn rename_id_checks_source_and_destination() {
        let mut idx = temp_namespace();
        assert_eq!(idx.rename_id("Temp", "SENSOR1", "thermo").unwrap(), 3);
        assert_eq!(values(&idx, "Temp", "thermo").len(), 3);
        assert!(matches!(
            idx.rename_id("Temp", "sensor1", "x"),
            Err(EditError::IdNotFound { .. })
        ));
        assert!(matches!(
            idx.rename_id("Temp", "thermo", "sensor2"),
            Err(EditError::IdExists { .. })
        ));
    }

    #[test]
    fn rename_ids_with_wildcard() {
        let mut idx = temp_namespace();
        let (points, ids) = idx.rename_ids("t*", "sensor*", "old_*").unwrap();
        assert_eq!((points, ids), (6, 2));
        assert_eq!(values(&idx, "Temp", "old_sensor1").len(), 3);

        let mut idx = temp_namespace();
        assert!(matches!(
            idx.rename_ids("Temp", "sensor1", "sensor2"),
            Err(EditError::IdExists { .. })
        ));
    }

    #[test]
    fn copy_id_into_new_and_existing_namespaces() {
        let mut idx = temp_namespace();
        let copied = idx.copy_id("Temp", "sensor1", "backup", "*_copy").unwrap();
        assert_eq!(copied, 3);
        assert_eq!(values(&idx, "backup", "sensor1_copy"), ["1", "11", "21"]);

        let copied = idx.copy_id("Temp", "sensor2", "*", "mirror").unwrap();
        assert_eq!(copied, 3);
        assert_eq!(times(&idx, "Temp").len(), 9);
        assert_eq!(values(&idx, "Temp", "mirror"), ["2.5", "12.5", "22.5"]);
    }

    #[test]
    fn copy_id_rejects_group_members() {
        let group = Entry::Group(DataGroup::new(0, vec![DataPoint::new("a", "x", "1", 0)]));
        let mut idx = index(vec![group]);
        assert!(matches!(
            idx.copy_id("a", "x", "b", "x"),
            Err(EditError::Unsupported { .. })
        ));
    }
}
