//! symtrend command-line interface
//!
//! ```bash
//! # full pipeline: reverse, encode, segment, score, forecast
//! symtrend run rusal.csv -o out/
//!
//! # rebuild statistics and forecast from a saved pattern set
//! symtrend forecast out/patternSet.csv
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use symtrend::config::PipelineConfig;
use symtrend::forecast::Forecast;
use symtrend::{table, PipelineBuilder};

const REVERSED_FILE: &str = "reversedData.csv";
const ENCODED_FILE: &str = "encodedData.csv";
const PATTERNS_FILE: &str = "patternSet.csv";
const RECORDS_FILE: &str = "patternRecordSet.csv";

/// symtrend: candlestick symbol segmentation and trend forecasting
#[derive(Parser, Debug)]
#[command(name = "symtrend")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every stage over a raw price file
    Run {
        /// Raw CSV with date, op, hp, lp, cp columns
        input: PathBuf,

        /// Directory for the stage outputs
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Input is already oldest-first
        #[arg(long)]
        no_reverse: bool,
    },

    /// Score a saved pattern set and forecast its last pattern
    Forecast {
        /// CSV with segment, trend columns
        patterns: PathBuf,

        /// Where to write the record set
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match args.command {
        Command::Run {
            input,
            out_dir,
            no_reverse,
        } => run(&config, &input, &out_dir, !no_reverse && config.reverse_input),
        Command::Forecast { patterns, output } => forecast(&config, &patterns, output.as_deref()),
    }
}

fn run(config: &PipelineConfig, input: &Path, out_dir: &Path, reverse: bool) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let source = if reverse {
        let reversed = out_dir.join(REVERSED_FILE);
        let rows = table::reverse_rows(table::open(input)?, table::create(&reversed)?)
            .with_context(|| format!("reversing {}", input.display()))?;
        tracing::info!(rows, path = %reversed.display(), "data reversed");
        reversed
    } else {
        input.to_path_buf()
    };

    let bars = table::read_bars(table::open(&source)?, &config.date_format)
        .with_context(|| format!("reading bars from {}", source.display()))?;

    let pipeline = PipelineBuilder::from_config(config).build()?;
    let analysis = pipeline.run(&bars)?;

    let encoded = out_dir.join(ENCODED_FILE);
    table::write_encoded(table::create(&encoded)?, &analysis.encoded, &config.date_format)?;
    tracing::info!(path = %encoded.display(), "encoded data saved");

    let patterns = out_dir.join(PATTERNS_FILE);
    table::write_patterns(table::create(&patterns)?, &analysis.patterns())?;
    tracing::info!(path = %patterns.display(), "patterns saved");

    let records = out_dir.join(RECORDS_FILE);
    table::write_records(table::create(&records)?, &analysis.records)?;
    tracing::info!(path = %records.display(), "pattern record set saved");

    report(&mut std::io::stdout().lock(), analysis.current_pattern(), analysis.forecast)
}

fn forecast(config: &PipelineConfig, patterns: &Path, output: Option<&Path>) -> Result<()> {
    let rows = table::read_patterns(table::open(patterns)?)
        .with_context(|| format!("reading patterns from {}", patterns.display()))?;

    let pipeline = PipelineBuilder::from_config(config).build()?;
    let (records, result) = pipeline.forecast_rows(&rows);

    if let Some(path) = output {
        table::write_records(table::create(path)?, &records)?;
        tracing::info!(path = %path.display(), "pattern record set saved");
    }

    report(&mut std::io::stdout().lock(), rows.last().map(|r| r.segment.as_str()), result)
}

/// Forecast lines on stdout; log events go to stderr.
fn report<W: Write>(out: &mut W, current: Option<&str>, result: Option<Forecast>) -> Result<()> {
    match (current, result) {
        (Some(pattern), Some(result)) => {
            writeln!(out, "Last segment to forecast: {pattern}")?;
            writeln!(out, "Forecasting trend for last segment ({pattern}): {result}")?;
        }
        _ => writeln!(out, "No segments to forecast")?,
    }
    Ok(())
}
