//! Change-point segmentation and trend labeling
//!
//! A change point is emitted at every interior index where either the close
//! price or the candlestick code differs from a neighbour. Only indices
//! `1..=n-2` are scanned; index `0` always opens the list as `Start` and
//! index `n-1` always closes it as `End`.
//!
//! Segments are built from the working list, which is the change-point list
//! without its terminal `End` entry.

#![allow(clippy::float_cmp)]

use crate::classify::Code;
use crate::stats::PatternRow;
use crate::{Error, Result, Trend};

/// Rendering of an unclassified code inside pattern strings
pub const UNCLASSIFIED_MARK: &str = "?";

/// Label carried by a change point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Start,
    End,
    Code(Code),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Start => f.write_str("Start"),
            Label::End => f.write_str("End"),
            Label::Code(Some(symbol)) => write!(f, "{symbol}"),
            Label::Code(None) => f.write_str(UNCLASSIFIED_MARK),
        }
    }
}

/// Boundary in the symbol stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangePoint {
    pub index: usize,
    pub label: Label,
    /// Code active at `index`
    pub code: Code,
}

/// Scan prices and codes for regime boundaries.
///
/// The result always starts at index 0 and ends at index `n-1`. A single row
/// yields a `Start` and an `End` point that both sit at index 0.
pub fn find_change_points(prices: &[f64], codes: &[Code]) -> Result<Vec<ChangePoint>> {
    if prices.len() != codes.len() {
        return Err(Error::LengthMismatch {
            prices: prices.len(),
            codes: codes.len(),
        });
    }
    let n = prices.len();
    if n == 0 {
        return Err(Error::EmptyInput);
    }

    let mut points = Vec::with_capacity(n);
    points.push(ChangePoint {
        index: 0,
        label: Label::Start,
        code: codes[0],
    });

    for i in 1..n.saturating_sub(1) {
        let price_moved = prices[i - 1] != prices[i] || prices[i] != prices[i + 1];
        let code_moved = codes[i] != codes[i - 1] || codes[i] != codes[i + 1];
        if price_moved || code_moved {
            points.push(ChangePoint {
                index: i,
                label: Label::Code(codes[i]),
                code: codes[i],
            });
        }
    }

    points.push(ChangePoint {
        index: n - 1,
        label: Label::End,
        code: codes[n - 1],
    });
    Ok(points)
}

/// Change points used for segmentation: everything except the final `End`.
#[inline]
pub fn working_set(points: &[ChangePoint]) -> &[ChangePoint] {
    match points.split_last() {
        Some((last, rest)) if last.label == Label::End => rest,
        _ => points,
    }
}

/// Contiguous run of the series between two change points
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: usize,
    /// Inclusive
    pub end: usize,
    /// `"{start label}-{end label}"`
    pub pattern: String,
    pub trend: Trend,
}

impl Segment {
    pub fn to_row(&self) -> PatternRow {
        PatternRow {
            segment: self.pattern.clone(),
            trend: self.trend,
        }
    }
}

/// One segment per consecutive pair of change points, in index order.
///
/// Pairs whose indices fall outside `prices` or run backwards are skipped.
pub fn label_trends(points: &[ChangePoint], prices: &[f64]) -> Vec<Segment> {
    points
        .windows(2)
        .filter_map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let slice = prices.get(from.index..=to.index)?;
            let (&first, &last) = (slice.first()?, slice.last()?);
            Some(Segment {
                start: from.index,
                end: to.index,
                pattern: format!("{}-{}", from.label, to.label),
                trend: Trend::between(first, last),
            })
        })
        .collect()
}

/// Find change points, drop the terminal one and label the segments.
pub fn segment_trends(prices: &[f64], codes: &[Code]) -> Result<Vec<Segment>> {
    let points = find_change_points(prices, codes)?;
    Ok(label_trends(working_set(&points), prices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Symbol;

    const E: Code = Some(Symbol::E);
    const A: Code = Some(Symbol::A);
    const B: Code = Some(Symbol::B);

    #[test]
    fn test_empty_input() {
        assert!(matches!(find_change_points(&[], &[]), Err(Error::EmptyInput)));
        assert!(matches!(segment_trends(&[], &[]), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_length_mismatch() {
        let err = find_change_points(&[1.0, 2.0], &[E]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { prices: 2, codes: 1 }));
    }

    #[test]
    fn test_label_trends_skips_bad_pairs() {
        let points = [
            ChangePoint { index: 0, label: Label::Start, code: E },
            ChangePoint { index: 2, label: Label::Code(A), code: A },
            ChangePoint { index: 1, label: Label::Code(B), code: B },
            ChangePoint { index: 9, label: Label::End, code: B },
        ];
        let segments = label_trends(&points, &[1.0, 2.0, 3.0]);
        assert_eq!(segments.len(), 1);
        assert_eq!((segments[0].start, segments[0].end), (0, 2));
        assert_eq!(segments[0].trend, Trend::Up);
    }

    #[test]
    fn test_single_row() {
        let points = find_change_points(&[5.0], &[A]).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].index, 0);
        assert_eq!(points[0].label, Label::Start);
        assert_eq!(points[1].index, 0);
        assert_eq!(points[1].label, Label::End);
        assert!(segment_trends(&[5.0], &[A]).unwrap().is_empty());
    }

    #[test]
    fn test_two_rows_have_no_interior_points() {
        let points = find_change_points(&[11.0, 9.0], &[E, B]).unwrap();
        assert_eq!(
            points,
            vec![
                ChangePoint { index: 0, label: Label::Start, code: E },
                ChangePoint { index: 1, label: Label::End, code: B },
            ]
        );
        assert_eq!(working_set(&points).len(), 1);
        assert!(label_trends(working_set(&points), &[11.0, 9.0]).is_empty());
    }

    #[test]
    fn test_flat_run_produces_no_interior_points() {
        let prices = [10.0; 5];
        let codes = [A; 5];
        let points = find_change_points(&prices, &codes).unwrap();
        let indices: Vec<usize> = points.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 4]);
    }

    #[test]
    fn test_interior_points() {
        // index 2 sits in a flat neighbourhood with equal codes
        let prices = [10.0, 11.0, 11.0, 11.0, 12.0, 11.0];
        let codes = [A, E, E, E, E, A];
        let points = find_change_points(&prices, &codes).unwrap();
        let indices: Vec<usize> = points.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 3, 4, 5]);
        assert_eq!(points[1].label, Label::Code(E));
    }

    #[test]
    fn test_label_trends() {
        let prices = [10.0, 11.0, 11.0, 11.0, 12.0, 11.0];
        let codes = [A, E, E, E, E, A];
        let segments = segment_trends(&prices, &codes).unwrap();
        let patterns: Vec<&str> = segments.iter().map(|s| s.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["Start-e", "e-e", "e-e"]);
        let trends: Vec<Trend> = segments.iter().map(|s| s.trend).collect();
        assert_eq!(trends, vec![Trend::Up, Trend::Equal, Trend::Up]);
        assert_eq!((segments[1].start, segments[1].end), (1, 3));
    }

    #[test]
    fn test_unclassified_label() {
        let prices = [10.0, 11.0, 12.0];
        let codes = [A, None, A];
        let segments = segment_trends(&prices, &codes).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].pattern, "Start-?");
    }
}
