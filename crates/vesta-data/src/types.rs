//! Core record types: security codes, daily records and the per-security series.

use crate::error::{DataError, Result};
use crate::filing::MetricKind;
use chrono::NaiveDate;
use derive_more::{Display, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Exchange on which an A-share security is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Shanghai Stock Exchange
    Shanghai,
    /// Shenzhen Stock Exchange
    Shenzhen,
}

impl Exchange {
    /// Two letter suffix used by security lists (`SH` / `SZ`).
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Shanghai => "SH",
            Self::Shenzhen => "SZ",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Six digit security code.
///
/// Accepts the spellings found across feeds and files: `600000`, `'600000`
/// (spreadsheet text marker), `sh600000` (raw daily feed) and `600000.SH`
/// (security list).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityCode(String);

impl SecurityCode {
    /// Parse a code from any of the accepted spellings.
    pub fn parse(raw: &str) -> Result<Self> {
        let lower = raw.trim().trim_start_matches('\'').to_ascii_lowercase();
        let body = lower
            .strip_prefix("sh")
            .or_else(|| lower.strip_prefix("sz"))
            .unwrap_or(&lower);
        let digits = body.split_once('.').map_or(body, |(head, _)| head);

        if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(digits.to_string()))
        } else {
            Err(DataError::InvalidCode(raw.to_string()))
        }
    }

    /// Bare six digit code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Code with the leading quote that keeps spreadsheets from dropping zeros.
    pub fn quoted(&self) -> String {
        format!("'{}", self.0)
    }

    /// Listing exchange, derived from the leading digit.
    pub fn exchange(&self) -> Exchange {
        if self.0.starts_with('6') {
            Exchange::Shanghai
        } else {
            Exchange::Shenzhen
        }
    }
}

impl FromStr for SecurityCode {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SecurityCode {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

/// One (date, market cap) observation from the market-cap feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCapPoint {
    /// Trading date
    pub date: NaiveDate,
    /// Total market capitalization
    pub market_cap: f64,
}

impl MarketCapPoint {
    /// Create a new observation.
    pub const fn new(date: NaiveDate, market_cap: f64) -> Self {
        Self { date, market_cap }
    }
}

/// One trading day of one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Trading date
    pub date: NaiveDate,
    /// Security code
    pub code: SecurityCode,
    /// Display name
    pub name: String,
    /// Total market capitalization, always present
    pub market_cap: f64,
    /// Market cap over net assets (PB)
    pub book_ratio: Option<f64>,
    /// Market cap over net profit (PE)
    pub earnings_ratio: Option<f64>,
    /// Market cap over total revenue (PS)
    pub sales_ratio: Option<f64>,
    /// Market cap over operating cashflow (PC)
    pub cashflow_ratio: Option<f64>,
    /// Pre-tax dividend yield in percent
    pub dividend_yield: Option<f64>,
}

impl DailyRecord {
    /// Create a market-cap-only record.
    pub fn new(date: NaiveDate, code: SecurityCode, name: impl Into<String>, market_cap: f64) -> Self {
        Self {
            date,
            code,
            name: name.into(),
            market_cap,
            book_ratio: None,
            earnings_ratio: None,
            sales_ratio: None,
            cashflow_ratio: None,
            dividend_yield: None,
        }
    }

    /// Ratio column whose denominator is `metric`.
    pub const fn ratio(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::NetAssets => self.book_ratio,
            MetricKind::NetProfit => self.earnings_ratio,
            MetricKind::TotalRevenue => self.sales_ratio,
            MetricKind::OperatingCashflow => self.cashflow_ratio,
        }
    }

    /// Mutable access to the ratio column whose denominator is `metric`.
    pub fn ratio_mut(&mut self, metric: MetricKind) -> &mut Option<f64> {
        match metric {
            MetricKind::NetAssets => &mut self.book_ratio,
            MetricKind::NetProfit => &mut self.earnings_ratio,
            MetricKind::TotalRevenue => &mut self.sales_ratio,
            MetricKind::OperatingCashflow => &mut self.cashflow_ratio,
        }
    }
}

/// The daily records of a single security.
///
/// Dates are unique and the rows are kept most-recent-first, which is also the
/// persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    code: SecurityCode,
    name: String,
    records: Vec<DailyRecord>,
}

impl DailySeries {
    /// Build a series, sorting the rows most-recent-first.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::DuplicateDate`] if two rows share a date.
    pub fn new(code: SecurityCode, name: impl Into<String>, mut records: Vec<DailyRecord>) -> Result<Self> {
        records.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(DataError::DuplicateDate {
                code: code.to_string(),
                date: pair[0].date.to_string(),
            });
        }

        Ok(Self {
            code,
            name: name.into(),
            records,
        })
    }

    /// Build a market-cap-only series from feed observations.
    pub fn from_market_caps(
        code: SecurityCode,
        name: impl Into<String>,
        points: impl IntoIterator<Item = MarketCapPoint>,
    ) -> Result<Self> {
        let name = name.into();
        let records = points
            .into_iter()
            .map(|p| DailyRecord::new(p.date, code.clone(), name.clone(), p.market_cap))
            .collect();
        Self::new(code, name, records)
    }

    /// Security code.
    pub const fn code(&self) -> &SecurityCode {
        &self.code
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows, most-recent-first.
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// Mutable rows. Dates must not be changed through this slice.
    pub fn records_mut(&mut self) -> &mut [DailyRecord] {
        &mut self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent date in the series.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    /// Dates in series order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Whether every row carries a value for the ratio of `metric`.
    pub fn ratio_complete(&self, metric: MetricKind) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.ratio(metric).is_some())
    }

    /// Whether every row carries a dividend yield.
    pub fn dividend_complete(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.dividend_yield.is_some())
    }

    /// Insert a row, superseding any existing row with the same date.
    pub fn upsert(&mut self, record: DailyRecord) {
        match self.records.binary_search_by(|r| record.date.cmp(&r.date)) {
            Ok(i) => self.records[i] = record,
            Err(i) => self.records.insert(i, record),
        }
    }

    /// Keep only the rows matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&DailyRecord) -> bool) {
        self.records.retain(keep);
    }

    /// Consume the series, returning its rows.
    pub fn into_records(self) -> Vec<DailyRecord> {
        self.records
    }
}
