//! Tabular input and output
//!
//! Comma-delimited text with a header row, one file per pipeline stage:
//!
//! | stage      | columns                                                  |
//! |------------|----------------------------------------------------------|
//! | raw bars   | `date, op, hp, lp, cp` (extra columns ignored)           |
//! | encoded    | `date, op, hp, lp, cp, code`                             |
//! | patterns   | `segment, trend`                                         |
//! | records    | `segment, trend, occurrenceCount, sameTrendCount, PACC`  |
//!
//! Malformed numbers fail the read with the position reported by the csv
//! reader; malformed dates fail with [`Error::InvalidDate`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::classify::{Code, EncodedBar};
use crate::stats::{PatternRecord, PatternRow};
use crate::{Bar, Error, Result};

const ENCODED_HEADERS: [&str; 6] = ["date", "op", "hp", "lp", "cp", "code"];
const PATTERN_HEADERS: [&str; 2] = ["segment", "trend"];
const RECORD_HEADERS: [&str; 5] = ["segment", "trend", "occurrenceCount", "sameTrendCount", "PACC"];

#[derive(Debug, serde::Deserialize)]
struct RawBarRow {
    date: String,
    op: f64,
    hp: f64,
    lp: f64,
    cp: f64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct EncodedRow {
    date: String,
    op: f64,
    hp: f64,
    lp: f64,
    cp: f64,
    code: Code,
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(sink)
}

fn parse_date(value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, format).map_err(|_| Error::InvalidDate {
        value: value.to_string(),
        format: format.to_string(),
    })
}

fn format_date(date: Option<NaiveDate>, format: &str) -> String {
    date.map(|d| d.format(format).to_string()).unwrap_or_default()
}

// ============================================================
// FILES
// ============================================================

/// Open a file for buffered reading
pub fn open<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    let path = path.as_ref();
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Create (or truncate) a file for buffered writing
pub fn create<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    let path = path.as_ref();
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
}

// ============================================================
// RAW BARS
// ============================================================

/// Copy every record, header first, in reverse row order.
///
/// All columns are kept as-is. Returns the number of data rows.
pub fn reverse_rows<R: Read, W: Write>(source: R, sink: W) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(source);
    let headers = rdr.headers()?.clone();
    let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let mut wtr = writer(sink);
    wtr.write_record(&headers)?;
    for record in records.iter().rev() {
        wtr.write_record(record)?;
    }
    flush(wtr, "<reversed rows>")?;
    Ok(records.len())
}

/// Read `date, op, hp, lp, cp` rows in file order.
pub fn read_bars<R: Read>(source: R, date_format: &str) -> Result<Vec<Bar>> {
    let mut rdr = reader(source);
    let mut bars = Vec::new();
    for row in rdr.deserialize::<RawBarRow>() {
        let row = row?;
        bars.push(Bar {
            date: parse_date(&row.date, date_format)?,
            open: row.op,
            high: row.hp,
            low: row.lp,
            close: row.cp,
        });
    }
    tracing::debug!(rows = bars.len(), "read bars");
    Ok(bars)
}

// ============================================================
// ENCODED BARS
// ============================================================

/// Write the symbol stream; unclassified bars get an empty `code`.
pub fn write_encoded<W: Write>(sink: W, bars: &[EncodedBar], date_format: &str) -> Result<()> {
    let mut wtr = writer(sink);
    wtr.write_record(ENCODED_HEADERS)?;
    for bar in bars {
        wtr.serialize(EncodedRow {
            date: format_date(bar.date, date_format),
            op: bar.open,
            hp: bar.high,
            lp: bar.low,
            cp: bar.close,
            code: bar.code,
        })?;
    }
    flush(wtr, "<encoded bars>")
}

/// Read a symbol stream written by [`write_encoded`].
pub fn read_encoded<R: Read>(source: R, date_format: &str) -> Result<Vec<EncodedBar>> {
    let mut rdr = reader(source);
    let mut bars = Vec::new();
    for row in rdr.deserialize::<EncodedRow>() {
        let row = row?;
        let date = if row.date.is_empty() {
            None
        } else {
            Some(parse_date(&row.date, date_format)?)
        };
        bars.push(EncodedBar {
            date,
            open: row.op,
            high: row.hp,
            low: row.lp,
            close: row.cp,
            code: row.code,
        });
    }
    Ok(bars)
}

// ============================================================
// PATTERNS AND RECORDS
// ============================================================

/// Write the pattern set in segmentation order.
pub fn write_patterns<W: Write>(sink: W, rows: &[PatternRow]) -> Result<()> {
    let mut wtr = writer(sink);
    wtr.write_record(PATTERN_HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    flush(wtr, "<pattern set>")
}

/// Read a pattern set written by [`write_patterns`].
pub fn read_patterns<R: Read>(source: R) -> Result<Vec<PatternRow>> {
    let mut rdr = reader(source);
    let rows = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<PatternRow>, _>>()?;
    Ok(rows)
}

/// Write the scored record set.
pub fn write_records<W: Write>(sink: W, records: &[PatternRecord]) -> Result<()> {
    let mut wtr = writer(sink);
    wtr.write_record(RECORD_HEADERS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    flush(wtr, "<record set>")
}

/// Read a record set written by [`write_records`].
pub fn read_records<R: Read>(source: R) -> Result<Vec<PatternRecord>> {
    let mut rdr = reader(source);
    let records = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<PatternRecord>, _>>()?;
    Ok(records)
}

fn flush<W: Write>(mut wtr: csv::Writer<W>, what: &str) -> Result<()> {
    wtr.flush().map_err(|source| Error::Io {
        path: what.to_string(),
        source,
    })
}
