//! Pattern statistics
//!
//! For every pattern `i` in the set, counts the patterns `j` (including `i`
//! itself) that contain pattern `i` as a subsequence, and how many of those
//! share its trend. PACC is the agreement in percent.
//!
//! The record set is a log: one record per input row, in input order, with
//! duplicates kept.

use rayon::prelude::*;

use crate::subsequence::is_subsequence;
use crate::{Pacc, Trend};

/// Segment pattern with its trend, as persisted in the pattern set
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PatternRow {
    pub segment: String,
    pub trend: Trend,
}

impl PatternRow {
    pub fn new(segment: impl Into<String>, trend: Trend) -> Self {
        Self {
            segment: segment.into(),
            trend,
        }
    }
}

/// Scored pattern
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PatternRecord {
    pub segment: String,
    pub trend: Trend,
    #[serde(rename = "occurrenceCount")]
    pub occurrence_count: usize,
    #[serde(rename = "sameTrendCount")]
    pub same_trend_count: usize,
    #[serde(rename = "PACC")]
    pub pacc: Pacc,
}

/// Patterns split into characters once, reused for every comparison.
fn split(rows: &[PatternRow]) -> Vec<Vec<char>> {
    rows.iter().map(|r| r.segment.chars().collect()).collect()
}

fn score(i: usize, rows: &[PatternRow], chars: &[Vec<char>]) -> PatternRecord {
    let row = &rows[i];
    let needle = &chars[i];

    let (occurrence_count, same_trend_count) = chars
        .iter()
        .zip(rows)
        .filter(|(haystack, _)| is_subsequence(needle.as_slice(), haystack.as_slice()))
        .fold((0usize, 0usize), |(occurrences, same), (_, other)| {
            (occurrences + 1, same + usize::from(other.trend == row.trend))
        });

    PatternRecord {
        segment: row.segment.clone(),
        trend: row.trend,
        occurrence_count,
        same_trend_count,
        pacc: Pacc::from_counts(same_trend_count, occurrence_count),
    }
}

/// Score every pattern against the whole set.
pub fn build_record_set(rows: &[PatternRow]) -> Vec<PatternRecord> {
    let chars = split(rows);
    (0..rows.len()).map(|i| score(i, rows, &chars)).collect()
}

/// Same as [`build_record_set`], with records computed on the rayon pool.
/// Output order and values are identical.
pub fn build_record_set_parallel(rows: &[PatternRow]) -> Vec<PatternRecord> {
    let chars = split(rows);
    (0..rows.len())
        .into_par_iter()
        .map(|i| score(i, rows, &chars))
        .collect()
}
