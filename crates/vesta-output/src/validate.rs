//! Record validator.
//!
//! The acceptance gate in front of persistence. Checks run in a fixed order
//! and stop at the first failure:
//!
//! 1. column names and order equal [`RECORD_COLUMNS`]
//! 2. no empty market cap, ratio or dividend cell
//! 3. every date reads `YYYY-MM-DD`, and every code reads `'NNNNNN`
//! 4. ratio and dividend columns hold floating point numbers
//!
//! Schema violations are reported as a [`ValidationStatus`]; the validator
//! never repairs a record.

use crate::export::{ExportError, RECORD_COLUMNS, RecordWriter, Result};
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;
use vesta_data::DailySeries;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid"));

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^'[0-9]{6}$").expect("code pattern is valid"));

/// A numeric column of the record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordField {
    /// Total market value
    MarketCap,
    /// Book ratio
    Pb,
    /// Earnings ratio
    Pe,
    /// Sales ratio
    Ps,
    /// Cashflow ratio
    Pc,
    /// Dividend yield
    Dividend,
}

impl RecordField {
    /// Column holding this field.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::MarketCap => "market_cap",
            Self::Pb => "pb",
            Self::Pe => "pe",
            Self::Ps => "ps",
            Self::Pc => "pc",
            Self::Dividend => "dividend",
        }
    }

    const fn empty_token(&self) -> &'static str {
        match self {
            Self::MarketCap => "tvalue-empty",
            Self::Pb => "pb-empty",
            Self::Pe => "pe-empty",
            Self::Ps => "ps-empty",
            Self::Pc => "pc-empty",
            Self::Dividend => "dividend-empty",
        }
    }

    const fn dtype_token(&self) -> &'static str {
        match self {
            Self::MarketCap => "tvalue-dtype-error",
            Self::Pb => "pb-dtype-error",
            Self::Pe => "pe-dtype-error",
            Self::Ps => "ps-dtype-error",
            Self::Pc => "pc-dtype-error",
            Self::Dividend => "dividend-dtype-error",
        }
    }
}

const NULL_CHECK_ORDER: [RecordField; 6] = [
    RecordField::MarketCap,
    RecordField::Pe,
    RecordField::Pb,
    RecordField::Ps,
    RecordField::Pc,
    RecordField::Dividend,
];

const DTYPE_CHECK_ORDER: [RecordField; 5] = [
    RecordField::Pb,
    RecordField::Pe,
    RecordField::Ps,
    RecordField::Pc,
    RecordField::Dividend,
];

/// Result of validating a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Every check passed.
    Ok,
    /// Column names or order differ from the persisted schema.
    ColumnsError,
    /// A numeric column has an empty cell.
    Empty(RecordField),
    /// A date cell is not `YYYY-MM-DD`.
    DateFormatError {
        /// 1-based row number in the file, counting the header
        row: usize,
    },
    /// A code cell is not a quoted six digit code.
    CodeFormatError {
        /// 1-based row number in the file, counting the header
        row: usize,
    },
    /// A ratio or dividend column is not floating point.
    DtypeError(RecordField),
}

impl ValidationStatus {
    /// Status token, e.g. `ok`, `pe-empty` or `code-format-error`.
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ColumnsError => "columns-error",
            Self::Empty(field) => field.empty_token(),
            Self::DateFormatError { .. } => "date-format-error",
            Self::CodeFormatError { .. } => "code-format-error",
            Self::DtypeError(field) => field.dtype_token(),
        }
    }

    /// Offending row for date and code failures.
    pub const fn row(&self) -> Option<usize> {
        match self {
            Self::DateFormatError { row } | Self::CodeFormatError { row } => Some(*row),
            _ => None,
        }
    }

    /// Whether the record set passed.
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row() {
            Some(row) => write!(f, "{} (row {})", self.token(), row),
            None => f.write_str(self.token()),
        }
    }
}

/// Validate a record frame.
///
/// # Errors
///
/// Only fails if polars cannot cast the date or code column to text.
pub fn validate_frame(df: &DataFrame) -> Result<ValidationStatus> {
    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    if names != RECORD_COLUMNS {
        debug!(?names, "record columns do not match");
        return Ok(ValidationStatus::ColumnsError);
    }

    for field in NULL_CHECK_ORDER {
        if df.column(field.column())?.null_count() > 0 {
            return Ok(ValidationStatus::Empty(field));
        }
    }

    let dates = text_column(df, "date")?;
    let codes = text_column(df, "code")?;
    for (index, (date, code)) in dates.iter().zip(codes.iter()).enumerate() {
        let row = index + 2;
        if !matches_trimmed(&DATE_PATTERN, date) {
            return Ok(ValidationStatus::DateFormatError { row });
        }
        if !matches_trimmed(&CODE_PATTERN, code) {
            return Ok(ValidationStatus::CodeFormatError { row });
        }
    }

    for field in DTYPE_CHECK_ORDER {
        if !df.column(field.column())?.dtype().is_float() {
            return Ok(ValidationStatus::DtypeError(field));
        }
    }

    Ok(ValidationStatus::Ok)
}

fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    Ok(series.str()?.clone())
}

fn matches_trimmed(pattern: &Regex, cell: Option<&str>) -> bool {
    cell.is_some_and(|value| pattern.is_match(value.trim_matches(' ')))
}

/// Read a persisted record file into a frame, inferring types from every row.
///
/// # Errors
///
/// Returns an error if the bytes are not parseable CSV.
pub fn read_record_csv(bytes: Vec<u8>) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// Validate CSV text in the persisted format.
///
/// # Errors
///
/// Returns an error if the bytes are not parseable CSV.
pub fn validate_csv(bytes: impl Into<Vec<u8>>) -> Result<ValidationStatus> {
    let bytes = bytes.into();
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ValidationStatus::ColumnsError);
    }
    validate_frame(&read_record_csv(bytes)?)
}

/// Validate a record file on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn validate_path(path: &Path) -> Result<ValidationStatus> {
    let bytes = std::fs::read(path).map_err(ExportError::from)?;
    validate_csv(bytes)
}

/// Validate an in-memory series as it would be persisted.
///
/// # Errors
///
/// Returns an error if the series cannot be converted to a frame.
pub fn validate_series(series: &DailySeries) -> Result<ValidationStatus> {
    validate_frame(&RecordWriter::to_frame(series)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HEADER: &str = "date,code,name,market_cap,pb,pe,ps,pc,dividend\n";

    fn csv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_ok() {
        let text = csv(&[
            "2023-06-02,'000001,Ping An Bank,2150.0,0.6,5.1,1.5,3.0,0.0",
            "2023-06-01,'000001,Ping An Bank,2100.46,0.6,5.0,1.5,3.0,0.0",
        ]);
        assert_eq!(validate_csv(text).unwrap(), ValidationStatus::Ok);
    }

    #[rstest]
    #[case("2023-06-02,'000001,X,,0.6,5.1,1.5,3.0,0.0", "tvalue-empty")]
    #[case("2023-06-02,'000001,X,1.0,,,1.5,3.0,0.0", "pe-empty")]
    #[case("2023-06-02,'000001,X,1.0,,5.1,1.5,3.0,0.0", "pb-empty")]
    #[case("2023-06-02,'000001,X,1.0,0.6,5.1,,3.0,0.0", "ps-empty")]
    #[case("2023-06-02,'000001,X,1.0,0.6,5.1,1.5,,0.0", "pc-empty")]
    #[case("2023-06-02,'000001,X,1.0,0.6,5.1,1.5,3.0,", "dividend-empty")]
    fn test_empty_cells(#[case] row: &str, #[case] token: &str) {
        let status = validate_csv(csv(&[row, "2023-06-01,'000001,X,1.0,0.6,5.1,1.5,3.0,0.0"])).unwrap();
        assert_eq!(status.token(), token);
        assert_eq!(status.row(), None);
    }

    #[rstest]
    #[case("2023/06/01", "'000001", "date-format-error")]
    #[case("2023-6-1", "'000001", "date-format-error")]
    #[case("2023-06-01", "000001", "code-format-error")]
    #[case("2023-06-01", "'00001", "code-format-error")]
    #[case("2023-06-01", "'0000012", "code-format-error")]
    fn test_format_errors_report_row(#[case] date: &str, #[case] code: &str, #[case] token: &str) {
        let bad = format!("{date},{code},X,1.0,0.6,5.1,1.5,3.0,0.0");
        let text = csv(&["2023-06-02,'000001,X,1.0,0.6,5.1,1.5,3.0,0.0", &bad]);

        let status = validate_csv(text).unwrap();

        assert_eq!(status.token(), token);
        assert_eq!(status.row(), Some(3));
    }

    #[test]
    fn test_padded_cells_are_trimmed() {
        let text = csv(&["2023-06-02 , '000001,X,1.0,0.6,5.1,1.5,3.0,0.0"]);
        assert_eq!(validate_csv(text).unwrap(), ValidationStatus::Ok);
    }

    #[test]
    fn test_reordered_columns() {
        let text = "code,date,name,market_cap,pb,pe,ps,pc,dividend\n'000001,2023-06-02,X,1.0,0.6,5.1,1.5,3.0,0.0\n";
        assert_eq!(validate_csv(text).unwrap(), ValidationStatus::ColumnsError);
        assert_eq!(validate_csv("").unwrap(), ValidationStatus::ColumnsError);
    }

    #[test]
    fn test_integer_ratio_column_is_dtype_error() {
        let text = csv(&["2023-06-02,'000001,X,1.0,0.6,5.1,1.5,3,0.0"]);
        assert_eq!(validate_csv(text).unwrap(), ValidationStatus::DtypeError(RecordField::Pc));
    }

    #[test]
    fn test_display() {
        assert_eq!(ValidationStatus::Ok.to_string(), "ok");
        assert_eq!(
            ValidationStatus::CodeFormatError { row: 7 }.to_string(),
            "code-format-error (row 7)"
        );
        assert_eq!(ValidationStatus::DtypeError(RecordField::Dividend).token(), "dividend-dtype-error");
    }
}
