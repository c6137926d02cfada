//! Reference compression for repeated strings.
//!
//! A string leaf that repeats often enough is written once in a definition
//! line `^id=value` at the top of the document, and every occurrence is
//! replaced by the two-token `^id`.
//!
//! ## Cost model
//!
//! For a string of length `len` seen `c` times:
//!
//! ```text
//! savings = c·len − (2·c + len + 3)
//! ```
//!
//! An entry is kept when `c ≥ min_occurrences`, `len ≥ min_length` and
//! `savings ≥ min_savings`. Kept entries are numbered `1, 2, 3, …` by
//! descending savings, ties resolved by first encounter.
//!
//! ## Examples
//!
//! ```rust
//! use ctf_format::{ctf, ReferenceManager};
//!
//! let data = ctf!(["Engineering Department", "Engineering Department", "Engineering Department"]);
//! let mut refs = ReferenceManager::new();
//! refs.build(&data);
//!
//! assert_eq!(refs.get_reference("Engineering Department"), Some(1));
//! assert_eq!(refs.definitions(), vec!["^1=Engineering Department"]);
//! ```

use crate::escape;
use crate::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Thresholds deciding which strings earn a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceThresholds {
    pub min_occurrences: u32,
    /// Minimum length in characters.
    pub min_length: usize,
    pub min_savings: i64,
}

impl Default for ReferenceThresholds {
    fn default() -> Self {
        ReferenceThresholds {
            min_occurrences: 3,
            min_length: 5,
            min_savings: 10,
        }
    }
}

/// One assigned reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub id: u32,
    pub value: String,
    pub occurrences: u32,
    pub savings: i64,
}

/// Aggregate figures for a built reference table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceStats {
    pub count: usize,
    pub total_occurrences: u64,
    pub total_savings: i64,
}

/// Estimated token savings of referencing a string of `len` characters that
/// occurs `count` times.
#[must_use]
pub fn reference_savings(len: usize, count: u32) -> i64 {
    let (len, count) = (len as i64, i64::from(count));
    count * len - (2 * count + len + 3)
}

/// Bidirectional table between reference IDs and string values.
///
/// The encoder fills it with [`build`](Self::build); the decoder fills it
/// from definition lines with [`define`](Self::define). A table belongs to a
/// single encode or decode call.
#[derive(Clone, Debug, Default)]
pub struct ReferenceManager {
    ids: HashMap<String, u32>,
    values: HashMap<u32, String>,
    entries: Vec<ReferenceEntry>,
}

impl ReferenceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table for `value` with the default thresholds.
    ///
    /// Any previous content is discarded first, so IDs always start at 1.
    pub fn build(&mut self, value: &Value) {
        self.build_with(value, ReferenceThresholds::default());
    }

    /// Builds the table for `value` with explicit thresholds.
    pub fn build_with(&mut self, value: &Value, thresholds: ReferenceThresholds) {
        self.clear();

        let mut counts: IndexMap<&str, u32> = IndexMap::new();
        collect_strings(value, &mut counts);

        let mut candidates: Vec<ReferenceEntry> = counts
            .into_iter()
            .filter_map(|(text, occurrences)| {
                let len = text.chars().count();
                let savings = reference_savings(len, occurrences);
                (occurrences >= thresholds.min_occurrences
                    && len >= thresholds.min_length
                    && savings >= thresholds.min_savings)
                    .then(|| ReferenceEntry {
                        id: 0,
                        value: text.to_string(),
                        occurrences,
                        savings,
                    })
            })
            .collect();

        // Stable: equal savings keep encounter order.
        candidates.sort_by(|a, b| b.savings.cmp(&a.savings));

        for (index, mut entry) in candidates.into_iter().enumerate() {
            entry.id = index as u32 + 1;
            self.ids.insert(entry.value.clone(), entry.id);
            self.values.insert(entry.id, entry.value.clone());
            self.entries.push(entry);
        }

        log::debug!("reference table built with {} entries", self.entries.len());
    }

    /// Records a definition read back from a document.
    pub fn define(&mut self, id: u32, value: String) {
        if let Some(old) = self.values.insert(id, value.clone()) {
            self.ids.remove(&old);
        }
        self.ids.insert(value, id);
    }

    #[must_use]
    pub fn has_reference(&self, value: &str) -> bool {
        self.ids.contains_key(value)
    }

    #[must_use]
    pub fn get_reference(&self, value: &str) -> Option<u32> {
        self.ids.get(value).copied()
    }

    #[must_use]
    pub fn get_value(&self, id: u32) -> Option<&str> {
        self.values.get(&id).map(String::as_str)
    }

    /// Definition lines `^id=value`, ordered by ID, values quoted like any
    /// other string value.
    #[must_use]
    pub fn definitions(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.values.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| format!("^{}={}", id, escape::escape_string(&self.values[&id])))
            .collect()
    }

    /// Entries assigned by the last [`build`](Self::build), in ID order.
    #[must_use]
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Number of references in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> ReferenceStats {
        ReferenceStats {
            count: self.len(),
            total_occurrences: self.entries.iter().map(|e| u64::from(e.occurrences)).sum(),
            total_savings: self.entries.iter().map(|e| e.savings).sum(),
        }
    }

    /// Empties every table; the next build numbers from 1 again.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.values.clear();
        self.entries.clear();
    }
}

fn collect_strings<'a>(value: &'a Value, counts: &mut IndexMap<&'a str, u32>) {
    match value {
        Value::String(s) => *counts.entry(s.as_str()).or_insert(0) += 1,
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, counts)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, counts)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
