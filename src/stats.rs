//! Size comparison between a JSON document and its CTF encoding.
//!
//! Purely observational: nothing here influences what the encoder emits.
//!
//! ## Examples
//!
//! ```rust
//! use ctf_format::get_stats;
//!
//! let stats = get_stats(r#"{"a":1,"b":2}"#, "a:1\nb:2");
//! assert_eq!(stats.original_bytes, 13);
//! assert_eq!(stats.encoded_bytes, 7);
//! assert_eq!(stats.savings_bytes, 6);
//! ```

use serde::Serialize;

/// Byte counts and ratios for one encoding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EncodeStats {
    pub original_bytes: usize,
    pub encoded_bytes: usize,
    /// Negative when the encoding is larger than the original.
    pub savings_bytes: i64,
    pub savings_percent: f64,
    /// `encoded_bytes / original_bytes`.
    pub ratio: f64,
    /// Number of `^id=` definition lines at the top of the encoding.
    pub reference_count: usize,
}

/// Compares `original_json` with `encoded`.
#[must_use]
pub fn get_stats(original_json: &str, encoded: &str) -> EncodeStats {
    let original_bytes = original_json.len();
    let encoded_bytes = encoded.len();
    let savings_bytes = original_bytes as i64 - encoded_bytes as i64;
    let (savings_percent, ratio) = if original_bytes == 0 {
        (0.0, 0.0)
    } else {
        (
            savings_bytes as f64 / original_bytes as f64 * 100.0,
            encoded_bytes as f64 / original_bytes as f64,
        )
    };

    EncodeStats {
        original_bytes,
        encoded_bytes,
        savings_bytes,
        savings_percent,
        ratio,
        reference_count: count_definitions(encoded),
    }
}

fn count_definitions(encoded: &str) -> usize {
    encoded
        .lines()
        .take_while(|line| !line.is_empty())
        .filter(|line| {
            line.strip_prefix('^')
                .and_then(|rest| rest.split_once('='))
                .is_some_and(|(id, _)| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        })
        .count()
}
