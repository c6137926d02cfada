//! Shape analysis that drives the encoder's choices.
//!
//! [`analyze`] walks a value tree once and records:
//!
//! - how many arrays there are and how many qualify for tabular or columnar
//!   encoding
//! - how often each string leaf repeats
//! - how often each candidate delimiter occurs inside array data
//!
//! The other functions turn a [`DataAnalysis`] into decisions. They are free
//! functions over an owned analysis, so nothing carries over between encodes.
//!
//! ## Examples
//!
//! ```rust
//! use ctf_format::{analyze, choose_delimiter, ctf, recommend_strategy, Delimiter, Strategy};
//!
//! let data = ctf!({
//!     "users": [
//!         {"id": 1, "name": "Alice"},
//!         {"id": 2, "name": "Bob"},
//!         {"id": 3, "name": "Charlie"}
//!     ]
//! });
//!
//! let analysis = analyze(&data);
//! assert_eq!(analysis.total_arrays, 1);
//! assert_eq!(analysis.tabular_candidates, 1);
//! assert_eq!(recommend_strategy(&analysis), Strategy::TabularHeavy);
//! assert_eq!(choose_delimiter(&analysis), Delimiter::Pipe);
//! ```

use crate::escape;
use crate::{Delimiter, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Minimum number of elements for a tabular array.
pub const TABULAR_MIN_LEN: usize = 3;

/// Minimum number of elements for a columnar array.
pub const COLUMNAR_MIN_LEN: usize = 1000;

/// Counts of candidate delimiter characters found inside array data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DelimiterFrequency {
    pub pipe: u32,
    pub comma: u32,
    pub tab: u32,
}

impl DelimiterFrequency {
    /// Returns the tally for a concrete delimiter (`0` for `Auto`).
    #[must_use]
    pub fn get(&self, delimiter: Delimiter) -> u32 {
        match delimiter {
            Delimiter::Pipe => self.pipe,
            Delimiter::Comma => self.comma,
            Delimiter::Tab => self.tab,
            Delimiter::Auto => 0,
        }
    }

    fn tally(&mut self, s: &str) {
        for ch in s.chars() {
            match ch {
                '|' => self.pipe += 1,
                ',' => self.comma += 1,
                '\t' => self.tab += 1,
                _ => {}
            }
        }
    }
}

/// Census of a value tree, produced once per encode.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DataAnalysis {
    pub total_arrays: u32,
    pub tabular_candidates: u32,
    pub columnar_candidates: u32,
    /// Occurrence count of every string leaf, in encounter order.
    pub repeated_values: IndexMap<String, u32>,
    pub delimiter_frequency: DelimiterFrequency,
    /// Rough token count of the JSON rendering.
    pub estimated_tokens: u32,
}

/// Coarse label describing the dominant shape of the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Columnar,
    TabularHeavy,
    Balanced,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::Columnar => "columnar",
            Strategy::TabularHeavy => "tabular-heavy",
            Strategy::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analyzes `value` in a single traversal.
#[must_use]
pub fn analyze(value: &Value) -> DataAnalysis {
    let mut analysis = DataAnalysis::default();
    visit(value, false, &mut analysis);
    analysis.estimated_tokens = estimate_tokens(value);
    log::debug!(
        "analyzed {} arrays ({} tabular, {} columnar), {} distinct strings",
        analysis.total_arrays,
        analysis.tabular_candidates,
        analysis.columnar_candidates,
        analysis.repeated_values.len()
    );
    analysis
}

fn visit(value: &Value, in_array: bool, analysis: &mut DataAnalysis) {
    match value {
        Value::Array(items) => {
            analysis.total_arrays += 1;
            if let Some(fields) = tabular_fields(items) {
                analysis.tabular_candidates += 1;
                if is_columnar(items, &fields) {
                    analysis.columnar_candidates += 1;
                }
            }
            for item in items {
                visit(item, true, analysis);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                visit(item, in_array, analysis);
            }
        }
        Value::String(s) => {
            *analysis.repeated_values.entry(s.clone()).or_insert(0) += 1;
            if in_array {
                analysis.delimiter_frequency.tally(s);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn estimate_tokens(value: &Value) -> u32 {
    let json = serde_json::to_string(value).unwrap_or_default();
    json.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|chunk| !chunk.is_empty())
        .count() as u32
}

/// Picks the label for the encoding that dominates the data.
#[must_use]
pub fn recommend_strategy(analysis: &DataAnalysis) -> Strategy {
    if analysis.columnar_candidates > 0 {
        Strategy::Columnar
    } else if analysis.total_arrays > 0
        && f64::from(analysis.tabular_candidates) / f64::from(analysis.total_arrays) > 0.5
    {
        Strategy::TabularHeavy
    } else {
        Strategy::Balanced
    }
}

/// Picks the concrete delimiter that occurs least in the data; ties go to the
/// earliest of `|`, `,`, tab.
#[must_use]
pub fn choose_delimiter(analysis: &DataAnalysis) -> Delimiter {
    let freq = &analysis.delimiter_frequency;
    Delimiter::CONCRETE
        .into_iter()
        .fold(Delimiter::Pipe, |best, candidate| {
            if freq.get(candidate) < freq.get(best) {
                candidate
            } else {
                best
            }
        })
}

/// Coarse estimate of what reference compression would save, with the
/// default thresholds.
#[must_use]
pub fn estimate_reference_savings(analysis: &DataAnalysis) -> i64 {
    estimate_reference_savings_with(analysis, 3, 5)
}

/// Sums `(c − 1)·len − 2c` over strings seen at least `min_occurrences`
/// times and at least `min_length` characters long, counting only positive
/// terms.
#[must_use]
pub fn estimate_reference_savings_with(
    analysis: &DataAnalysis,
    min_occurrences: u32,
    min_length: usize,
) -> i64 {
    analysis
        .repeated_values
        .iter()
        .filter_map(|(text, &count)| {
            let len = text.chars().count();
            if count < min_occurrences || len < min_length {
                return None;
            }
            let count = i64::from(count);
            let saving = (count - 1) * len as i64 - 2 * count;
            (saving > 0).then_some(saving)
        })
        .sum()
}

/// Returns the shared field names, in the first element's order, when the
/// array qualifies for tabular encoding: at least three elements, all
/// objects with the same non-empty key set, all values primitive.
#[must_use]
pub fn tabular_fields(items: &[Value]) -> Option<Vec<&String>> {
    if items.len() < TABULAR_MIN_LEN {
        return None;
    }
    let first = items.first()?.as_object()?;
    if first.is_empty() {
        return None;
    }
    let uniform = items.iter().all(|item| {
        item.as_object().is_some_and(|obj| {
            obj.has_same_keys(first) && obj.values().all(Value::is_primitive)
        })
    });
    uniform.then(|| first.keys().collect())
}

/// Returns `true` when a tabular-eligible array is also large and repetitive
/// enough for columnar encoding: at least one field keeps fewer than 70% of
/// its values distinct.
#[must_use]
pub fn is_columnar(items: &[Value], fields: &[&String]) -> bool {
    if items.len() < COLUMNAR_MIN_LEN {
        return false;
    }
    fields.iter().any(|field| {
        let distinct: HashSet<String> = items
            .iter()
            .filter_map(|item| item.as_object()?.get(field.as_str()))
            .map(escape::format_primitive)
            .collect();
        distinct.len() * 10 < items.len() * 7
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ctf, ValueMap};

    fn rows(n: usize, status: impl Fn(usize) -> &'static str) -> Value {
        Value::Array(
            (0..n)
                .map(|i| {
                    let mut row = ValueMap::new();
                    row.insert("id".to_string(), Value::from(i));
                    row.insert("status".to_string(), Value::from(status(i)));
                    Value::Object(row)
                })
                .collect(),
        )
    }

    #[test]
    fn test_tabular_needs_three_uniform_objects() {
        let two = ctf!([{"a": 1}, {"a": 2}]);
        let three = ctf!([{"a": 1, "b": "x"}, {"b": "y", "a": 2}, {"a": 3, "b": "z"}]);
        let mixed = ctf!([{"a": 1}, {"a": 2}, {"b": 3}]);
        let nested = ctf!([{"a": [1]}, {"a": [2]}, {"a": [3]}]);
        let empty = ctf!([{}, {}, {}]);

        assert!(tabular_fields(two.as_array().unwrap()).is_none());
        assert_eq!(
            tabular_fields(three.as_array().unwrap()).unwrap(),
            vec!["a", "b"]
        );
        assert!(tabular_fields(mixed.as_array().unwrap()).is_none());
        assert!(tabular_fields(nested.as_array().unwrap()).is_none());
        assert!(tabular_fields(empty.as_array().unwrap()).is_none());
    }

    #[test]
    fn test_columnar_threshold() {
        let statuses = |i: usize| if i % 3 == 0 { "active" } else { "idle" };
        let big = rows(1000, statuses);
        let small = rows(999, statuses);

        assert_eq!(analyze(&big).columnar_candidates, 1);
        assert_eq!(analyze(&small).columnar_candidates, 0);
        assert_eq!(recommend_strategy(&analyze(&big)), Strategy::Columnar);
    }

    #[test]
    fn test_columnar_requires_repetition() {
        let array = Value::Array(
            (0..1000)
                .map(|i| ctf!({"id": i, "name": (format!("user{}", i))}))
                .collect(),
        );
        let analysis = analyze(&array);
        assert_eq!(analysis.tabular_candidates, 1);
        assert_eq!(analysis.columnar_candidates, 0);
    }

    #[test]
    fn test_repeated_values_and_arrays_counted() {
        let data = ctf!({"a": ["x", "x", [1, 2]], "b": "x"});
        let analysis = analyze(&data);
        assert_eq!(analysis.total_arrays, 2);
        assert_eq!(analysis.repeated_values.get("x"), Some(&3));
        assert!(analysis.estimated_tokens > 0);
    }

    #[test]
    fn test_strategy_labels() {
        let balanced = ctf!({"tags": ["a", "b"], "n": 1});
        assert_eq!(recommend_strategy(&analyze(&balanced)), Strategy::Balanced);
        assert_eq!(Strategy::TabularHeavy.to_string(), "tabular-heavy");
        assert_eq!(recommend_strategy(&DataAnalysis::default()), Strategy::Balanced);
    }

    #[test]
    fn test_delimiter_prefers_least_frequent() {
        let pipes = ctf!({"rows": ["a|b", "c|d", "e,f"]});
        let analysis = analyze(&pipes);
        assert_eq!(analysis.delimiter_frequency.pipe, 2);
        assert_eq!(analysis.delimiter_frequency.comma, 1);
        assert_eq!(choose_delimiter(&analysis), Delimiter::Tab);
    }

    #[test]
    fn test_delimiter_ties_prefer_pipe() {
        let even = ctf!({"rows": ["a|b", "c,d", "e\tf"]});
        assert_eq!(choose_delimiter(&analyze(&even)), Delimiter::Pipe);
        assert_eq!(choose_delimiter(&DataAnalysis::default()), Delimiter::Pipe);

        let only_pipe_and_tab = ctf!({"rows": ["a|b", "c\td"]});
        assert_eq!(choose_delimiter(&analyze(&only_pipe_and_tab)), Delimiter::Comma);
    }

    #[test]
    fn test_reference_estimate() {
        let s = "abcdefghijklmnopqrstuvw";
        let data = ctf!([s, s, s, "tiny", "tiny", "tiny", "twice only", "twice only"]);
        // (3 − 1) · 23 − 6
        assert_eq!(estimate_reference_savings(&analyze(&data)), 40);
    }
}
