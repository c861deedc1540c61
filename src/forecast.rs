//! Trend forecasting from the record set
//!
//! The forecast for a pattern is the trend of the best-scoring record whose
//! pattern contains it as a subsequence. Ties on PACC go to the record seen
//! first.

use crate::stats::PatternRecord;
use crate::subsequence::pattern_contains;
use crate::{Pacc, Trend};

/// Outcome of a forecast
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Forecast {
    Trend {
        trend: Trend,
        /// Position of the winning record in the record set
        index: usize,
        pacc: Pacc,
    },
    /// No record contains the pattern
    NoMatch,
}

impl Forecast {
    pub fn trend(&self) -> Option<Trend> {
        match self {
            Forecast::Trend { trend, .. } => Some(*trend),
            Forecast::NoMatch => None,
        }
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        matches!(self, Forecast::Trend { .. })
    }
}

impl std::fmt::Display for Forecast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Forecast::Trend { trend, .. } => write!(f, "{trend}"),
            Forecast::NoMatch => f.write_str("No matching patterns to forecast"),
        }
    }
}

/// Forecast the trend following `current`.
pub fn forecast(current: &str, records: &[PatternRecord]) -> Forecast {
    let mut best: Option<(usize, &PatternRecord)> = None;

    for (index, record) in records.iter().enumerate() {
        if !pattern_contains(&record.segment, current) {
            continue;
        }
        // strict comparison keeps the first record among equal scores
        match best {
            Some((_, leader)) if record.pacc <= leader.pacc => {}
            _ => best = Some((index, record)),
        }
    }

    match best {
        Some((index, record)) => Forecast::Trend {
            trend: record.trend,
            index,
            pacc: record.pacc,
        },
        None => Forecast::NoMatch,
    }
}
