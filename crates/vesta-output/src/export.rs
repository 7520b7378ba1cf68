//! Persisted record format.
//!
//! One file per security, most recent date first, with the fixed columns
//! `date,code,name,market_cap,pb,pe,ps,pc,dividend`. Codes are written with a
//! leading `'` and every number is rounded to two decimals; empty cells stand
//! for missing ratios.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use vesta_data::{DailyRecord, DailySeries, DataError, SecurityCode, round2};

/// Column order of a persisted record file.
pub const RECORD_COLUMNS: [&str; 9] = [
    "date",
    "code",
    "name",
    "market_cap",
    "pb",
    "pe",
    "ps",
    "pc",
    "dividend",
];

/// Errors that can occur during export or when reading a record file back.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame construction or CSV parsing error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// A record file that does not form a valid series.
    #[error("Record error: {0}")]
    Data(#[from] DataError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values, the persisted format.
    #[default]
    Csv,

    /// Compact JSON array of rows.
    Json,

    /// Pretty-printed JSON array of rows.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One persisted row, already rounded.
#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    date: String,
    code: String,
    name: &'a str,
    market_cap: f64,
    pb: Option<f64>,
    pe: Option<f64>,
    ps: Option<f64>,
    pc: Option<f64>,
    dividend: Option<f64>,
}

impl<'a> From<&'a DailyRecord> for RecordRow<'a> {
    fn from(record: &'a DailyRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            code: record.code.quoted(),
            name: &record.name,
            market_cap: round2(record.market_cap),
            pb: record.book_ratio.map(round2),
            pe: record.earnings_ratio.map(round2),
            ps: record.sales_ratio.map(round2),
            pc: record.cashflow_ratio.map(round2),
            dividend: record.dividend_yield.map(round2),
        }
    }
}

fn rows(series: &DailySeries) -> Vec<RecordRow<'_>> {
    series.records().iter().map(RecordRow::from).collect()
}

/// Writes a [`DailySeries`] in the persisted record format.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordWriter;

impl RecordWriter {
    /// Render `series` as CSV text, header included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_csv_string(series: &DailySeries) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        if series.is_empty() {
            wtr.write_record(RECORD_COLUMNS)?;
        }
        for row in rows(series) {
            wtr.serialize(row)?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
    }

    /// Write `series` as CSV to `path`, creating parent directories.
    ///
    /// An existing file is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn write_to_path(series: &DailySeries, path: &Path) -> Result<()> {
        let content = Self::to_csv_string(series)?;
        write_file(path, &content)
    }

    /// Convert `series` into a frame with the persisted columns and types.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be built.
    pub fn to_frame(series: &DailySeries) -> Result<DataFrame> {
        let rows = rows(series);
        let ratio = |f: fn(&RecordRow<'_>) -> Option<f64>| -> Vec<Option<f64>> { rows.iter().map(f).collect() };

        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        let names: Vec<&str> = rows.iter().map(|r| r.name).collect();
        let caps: Vec<f64> = rows.iter().map(|r| r.market_cap).collect();

        let df = DataFrame::new(vec![
            Series::new("date".into(), dates).into(),
            Series::new("code".into(), codes).into(),
            Series::new("name".into(), names).into(),
            Series::new("market_cap".into(), caps).into(),
            Series::new("pb".into(), ratio(|r| r.pb)).into(),
            Series::new("pe".into(), ratio(|r| r.pe)).into(),
            Series::new("ps".into(), ratio(|r| r.ps)).into(),
            Series::new("pc".into(), ratio(|r| r.pc)).into(),
            Series::new("dividend".into(), ratio(|r| r.dividend)).into(),
        ])?;
        Ok(df)
    }
}

#[derive(Debug, Deserialize)]
struct StoredRow {
    date: NaiveDate,
    code: String,
    name: String,
    market_cap: f64,
    pb: Option<f64>,
    pe: Option<f64>,
    ps: Option<f64>,
    pc: Option<f64>,
    dividend: Option<f64>,
}

/// Read a persisted record file back into a series.
///
/// The code and name are taken from the first row.
///
/// # Errors
///
/// Returns an error if the file is unreadable, has no rows, carries a bad
/// code or repeats a date.
pub fn read_series(path: &Path) -> Result<DailySeries> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    let mut identity: Option<(SecurityCode, String)> = None;

    for row in rdr.deserialize() {
        let row: StoredRow = row?;
        let code = SecurityCode::parse(&row.code)?;
        let (series_code, _) = identity.get_or_insert_with(|| (code.clone(), row.name.clone()));
        if *series_code != code {
            return Err(ExportError::InvalidFormat(format!(
                "{} mixes codes {series_code} and {code}",
                path.display()
            )));
        }

        let mut record = DailyRecord::new(row.date, code, row.name, row.market_cap);
        record.book_ratio = row.pb;
        record.earnings_ratio = row.pe;
        record.sales_ratio = row.ps;
        record.cashflow_ratio = row.pc;
        record.dividend_yield = row.dividend;
        records.push(record);
    }

    let (code, name) =
        identity.ok_or_else(|| ExportError::InvalidFormat(format!("{} has no rows", path.display())))?;
    Ok(DailySeries::new(code, name, records)?)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file in the specified format, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        write_file(path, &content)
    }
}

impl Exporter for DailySeries {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => RecordWriter::to_csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(&rows(self))?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&rows(self))?),
        }
    }
}
