//! # symtrend - symbolic candlestick trend forecasting
//!
//! Encodes a daily price series into a twelve-letter candlestick alphabet,
//! cuts the symbol stream into segments at change points, labels every segment
//! with its trend and forecasts the trend that follows the newest segment from
//! subsequence-occurrence statistics.
//!
//! ## Quick Start
//!
//! ```rust
//! use symtrend::prelude::*;
//!
//! struct Row { o: f64, h: f64, l: f64, c: f64 }
//!
//! impl OHLC for Row {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//! }
//!
//! let pipeline = PipelineBuilder::new().build().unwrap();
//!
//! let rows = vec![
//!     Row { o: 10.0, h: 12.0, l: 9.0, c: 11.0 },
//!     Row { o: 11.0, h: 12.0, l: 10.0, c: 10.5 },
//!     Row { o: 10.5, h: 11.0, l: 9.0, c: 10.0 },
//! ];
//! let analysis = pipeline.run(&rows).unwrap();
//! println!("{:?}", analysis.forecast);
//! ```

pub mod classify;
pub mod config;
pub mod forecast;
pub mod segment;
pub mod stats;
pub mod subsequence;
pub mod table;

pub mod prelude {
    pub use crate::{
        // Stages
        classify::{classify, classify_bar, encode, Code, EncodedBar, Symbol},
        // Config
        config::PipelineConfig,
        forecast::{forecast, Forecast},
        segment::{find_change_points, label_trends, segment_trends, ChangePoint, Label, Segment},
        stats::{build_record_set, build_record_set_parallel, PatternRecord, PatternRow},
        subsequence::{is_subsequence, pattern_contains},
        // Parallel
        analyze_parallel,
        // Engine
        Analysis,
        AnalysisError,
        AnalysisResult,
        Bar,
        // Errors
        Error,
        OHLCExt,
        Pacc,
        Pipeline,
        PipelineBuilder,
        Result,
        Trend,
        // Core traits
        OHLC,
    };
}

use chrono::NaiveDate;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pipeline and its tabular collaborator
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Empty input: segmentation needs at least one row")]
    EmptyInput,

    #[error("Length mismatch: {prices} prices but {codes} codes")]
    LengthMismatch { prices: usize, codes: usize },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Invalid date {value:?}: expected format {format}")]
    InvalidDate { value: String, format: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Percentage agreement score in range 0.0..=100.0
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Pacc(f64);

impl Pacc {
    /// Create a new Pacc, validating the value is in [0.0, 100.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(Error::InvalidValue("PACC cannot be NaN or infinite"));
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(Error::OutOfRange {
                field: "PACC",
                value,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(Self(value))
    }

    /// PACC from agreement counts; zero occurrences give 0.
    pub fn from_counts(same_trend: usize, occurrences: usize) -> Self {
        if occurrences == 0 {
            return Self(0.0);
        }
        Self(same_trend.min(occurrences) as f64 / occurrences as f64 * 100.0)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Pacc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl serde::Serialize for Pacc {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Pacc {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Pacc::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core price-bar trait
pub trait OHLC {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn date(&self) -> Option<NaiveDate> {
        None
    }
}

impl<T: OHLC + ?Sized> OHLC for &T {
    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn date(&self) -> Option<NaiveDate> {
        (**self).date()
    }
}

/// Extension trait with checks over OHLC data
pub trait OHLCExt: OHLC {
    /// Reject non-finite prices. Orderings such as `high < low` are left to
    /// the classifier, which reports them as unclassified.
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(Error::InvalidBar {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(Error::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

impl<T: OHLC + ?Sized> OHLCExt for T {}

/// Daily bar as read from the tabular input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OHLC for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

// ============================================================
// TREND
// ============================================================

/// Direction of a segment, from its first to its last close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Trend {
    Up,
    Down,
    Equal,
}

impl Trend {
    /// Compare first and last price of a slice.
    #[allow(clippy::float_cmp)]
    pub fn between(first: f64, last: f64) -> Self {
        if first < last {
            Trend::Up
        } else if first > last {
            Trend::Down
        } else {
            Trend::Equal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Up => "Up",
            Trend::Down => "Down",
            Trend::Equal => "Equal",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Trend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Up" => Ok(Trend::Up),
            "Down" => Ok(Trend::Down),
            "Equal" => Ok(Trend::Equal),
            _ => Err(Error::InvalidValue("trend must be Up, Down or Equal")),
        }
    }
}

// ============================================================
// PIPELINE
// ============================================================

use classify::EncodedBar;
use forecast::Forecast;
use segment::{ChangePoint, Segment};
use stats::{PatternRecord, PatternRow};

/// Output of every stage for one instrument
#[derive(Debug, Clone)]
pub struct Analysis {
    pub encoded: Vec<EncodedBar>,
    /// Change points including the terminal `End` point
    pub change_points: Vec<ChangePoint>,
    pub segments: Vec<Segment>,
    pub records: Vec<PatternRecord>,
    /// Forecast for the last segment, `None` when there are no segments
    pub forecast: Option<Forecast>,
}

impl Analysis {
    /// Pattern rows in segmentation order
    pub fn patterns(&self) -> Vec<PatternRow> {
        self.segments.iter().map(Segment::to_row).collect()
    }

    /// Pattern string of the newest segment
    pub fn current_pattern(&self) -> Option<&str> {
        self.segments.last().map(|s| s.pattern.as_str())
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub validate_data: bool,
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_data: true,
            parallel: false,
        }
    }
}

/// Runs classification, segmentation, statistics and forecasting in sequence
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: EngineConfig,
}

impl Pipeline {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every stage over one instrument's bars, oldest first.
    pub fn run<T: OHLC>(&self, bars: &[T]) -> Result<Analysis> {
        if self.config.validate_data {
            validate_bars(bars)?;
        }

        let encoded = classify::encode(bars);
        let unclassified = encoded.iter().filter(|b| b.code.is_none()).count();
        tracing::debug!(bars = encoded.len(), unclassified, "encoded bars");

        let closes: Vec<f64> = encoded.iter().map(|b| b.close).collect();
        let codes: Vec<_> = encoded.iter().map(|b| b.code).collect();
        let change_points = segment::find_change_points(&closes, &codes)?;
        let working = segment::working_set(&change_points);
        let segments = segment::label_trends(working, &closes);
        tracing::debug!(
            change_points = change_points.len(),
            segments = segments.len(),
            "segmented symbol stream"
        );

        let rows: Vec<PatternRow> = segments.iter().map(Segment::to_row).collect();
        let records = self.records(&rows);

        let forecast = rows.last().map(|current| {
            let result = forecast::forecast(&current.segment, &records);
            tracing::info!(pattern = %current.segment, forecast = %result, "forecast for last segment");
            result
        });

        Ok(Analysis {
            encoded,
            change_points,
            segments,
            records,
            forecast,
        })
    }

    /// Build the record set using the configured execution mode.
    pub fn records(&self, rows: &[PatternRow]) -> Vec<PatternRecord> {
        if self.config.parallel {
            stats::build_record_set_parallel(rows)
        } else {
            stats::build_record_set(rows)
        }
    }

    /// Statistics and forecast from an already persisted pattern set.
    pub fn forecast_rows(&self, rows: &[PatternRow]) -> (Vec<PatternRecord>, Option<Forecast>) {
        let records = self.records(rows);
        let forecast = rows
            .last()
            .map(|current| forecast::forecast(&current.segment, &records));
        (records, forecast)
    }
}

fn validate_bars<T: OHLC>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            Error::InvalidBar { reason, .. } => Error::InvalidBar { index: i, reason },
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating Pipeline instances
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: EngineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration
    pub fn from_config(config: &config::PipelineConfig) -> Self {
        Self::new()
            .validate_data(config.validate_data)
            .parallel(config.parallel)
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the record set on the rayon pool
    pub fn parallel(mut self, enable: bool) -> Self {
        self.config.parallel = enable;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        Ok(Pipeline {
            config: self.config,
        })
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Result of analysing a single instrument
#[derive(Debug)]
pub struct AnalysisResult {
    pub symbol: String,
    pub analysis: Analysis,
}

/// Error from analysing a single instrument
#[derive(Debug)]
pub struct AnalysisError {
    pub symbol: String,
    pub error: Error,
}

/// Parallel analysis of multiple instruments
pub fn analyze_parallel<'a, T, I>(
    pipeline: &Pipeline,
    instruments: I,
) -> (Vec<AnalysisResult>, Vec<AnalysisError>)
where
    T: OHLC + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            pipeline
                .run(bars)
                .map(|analysis| AnalysisResult {
                    symbol: symbol.to_string(),
                    analysis,
                })
                .map_err(|error| AnalysisError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Symbol;

    /// Test OHLC bar
    #[derive(Debug, Clone)]
    struct TestBar {
        o: f64,
        h: f64,
        l: f64,
        c: f64,
    }

    impl TestBar {
        fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
            Self { o, h, l, c }
        }
    }

    impl OHLC for TestBar {
        fn open(&self) -> f64 {
            self.o
        }

        fn high(&self) -> f64 {
            self.h
        }

        fn low(&self) -> f64 {
            self.l
        }

        fn close(&self) -> f64 {
            self.c
        }
    }

    fn make_zigzag_bars() -> Vec<TestBar> {
        (0..20)
            .map(|i| {
                let base = 100.0 + (i % 4) as f64;
                if i % 2 == 0 {
                    TestBar::new(base, base + 2.0, base - 1.0, base + 1.0)
                } else {
                    TestBar::new(base + 1.0, base + 2.0, base - 1.0, base)
                }
            })
            .collect()
    }

    #[test]
    fn test_pacc_validation() {
        assert!(Pacc::new(0.0).is_ok());
        assert!(Pacc::new(100.0).is_ok());
        assert!(Pacc::new(50.0).is_ok());
        assert!(Pacc::new(-0.1).is_err());
        assert!(Pacc::new(100.1).is_err());
        assert!(Pacc::new(f64::NAN).is_err());
        assert!(Pacc::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_pacc_from_counts() {
        assert_eq!(Pacc::from_counts(3, 3).get(), 100.0);
        assert_eq!(Pacc::from_counts(1, 4).get(), 25.0);
        assert_eq!(Pacc::from_counts(0, 0).get(), 0.0);
    }

    #[test]
    fn test_trend_between() {
        assert_eq!(Trend::between(1.0, 2.0), Trend::Up);
        assert_eq!(Trend::between(2.0, 1.0), Trend::Down);
        assert_eq!(Trend::between(2.0, 2.0), Trend::Equal);
        assert_eq!("Down".parse::<Trend>().unwrap(), Trend::Down);
        assert!("down".parse::<Trend>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        assert!(pipeline.config().validate_data);
        assert!(!pipeline.config().parallel);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        let bars: Vec<TestBar> = vec![];
        assert!(matches!(pipeline.run(&bars), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_validation_reports_index() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        let bars = vec![
            TestBar::new(10.0, 12.0, 9.0, 11.0),
            TestBar::new(10.0, f64::NAN, 9.0, 11.0),
        ];
        match pipeline.run(&bars) {
            Err(Error::InvalidBar { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidBar, got {other:?}"),
        }
    }

    #[test]
    fn test_two_bar_run_has_no_segments() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        let bars = vec![
            TestBar::new(10.0, 12.0, 9.0, 11.0),
            TestBar::new(11.0, 11.0, 8.0, 9.0),
        ];
        let analysis = pipeline.run(&bars).unwrap();
        let codes: Vec<_> = analysis.encoded.iter().map(|b| b.code).collect();
        assert_eq!(codes, vec![Some(Symbol::E), Some(Symbol::B)]);
        assert_eq!(analysis.change_points.len(), 2);
        assert!(analysis.segments.is_empty());
        assert!(analysis.records.is_empty());
        assert!(analysis.forecast.is_none());
        assert!(analysis.current_pattern().is_none());
    }

    #[test]
    fn test_run_produces_one_record_per_segment() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        let bars = make_zigzag_bars();
        let analysis = pipeline.run(&bars).unwrap();
        assert_eq!(analysis.encoded.len(), bars.len());
        assert!(!analysis.segments.is_empty());
        assert_eq!(analysis.records.len(), analysis.segments.len());
        assert!(matches!(analysis.forecast, Some(Forecast::Trend { .. })));
    }

    #[test]
    fn test_parallel_records_match_sequential() {
        let bars = make_zigzag_bars();
        let sequential = PipelineBuilder::new().build().unwrap().run(&bars).unwrap();
        let parallel = PipelineBuilder::new()
            .parallel(true)
            .build()
            .unwrap()
            .run(&bars)
            .unwrap();
        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.forecast, parallel.forecast);
    }

    #[test]
    fn test_analyze_parallel() {
        let pipeline = PipelineBuilder::new().build().unwrap();

        let bars1 = make_zigzag_bars();
        let bars2: Vec<TestBar> = vec![];

        let instruments: Vec<(&str, &[TestBar])> = vec![("RUAL", &bars1), ("EMPTY", &bars2)];

        let (results, errors) = analyze_parallel(&pipeline, instruments);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "RUAL");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, Error::EmptyInput));
    }
}
