//! Feeds backed by files in a data directory.
//!
//! Layout under the root:
//!
//! - `market_cap/<code>.csv` with columns `date,market_cap`
//! - `filings/<code>.json`, an object keyed by period token
//! - `dividends/<code>.json`, an object keyed by announcement date whose
//!   values are `[description, rate]` pairs

use super::{DateRange, DividendFeed, FilingFeed, MarketCapFeed};
use crate::error::{DataError, Result};
use crate::{DividendEvent, FilingSet, FiscalFiling, MarketCapPoint, PayoutRate, PeriodKey, SecurityCode};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads feeds from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryFeed {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct MarketCapRow {
    date: String,
    market_cap: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilingRecord {
    net_assets: Option<f64>,
    net_profit: Option<f64>,
    total_revenue: Option<f64>,
    operating_cashflow: Option<f64>,
}

impl DirectoryFeed {
    /// Create a feed rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the market-cap file for `code`.
    pub fn market_cap_path(&self, code: &SecurityCode) -> PathBuf {
        self.root.join("market_cap").join(format!("{code}.csv"))
    }

    /// Path of the filings file for `code`.
    pub fn filings_path(&self, code: &SecurityCode) -> PathBuf {
        self.root.join("filings").join(format!("{code}.json"))
    }

    /// Path of the dividends file for `code`.
    pub fn dividends_path(&self, code: &SecurityCode) -> PathBuf {
        self.root.join("dividends").join(format!("{code}.json"))
    }

    fn require(code: &SecurityCode, path: &Path) -> Result<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(DataError::MissingData {
                code: code.to_string(),
                reason: format!("{} not found", path.display()),
            })
        }
    }
}

/// Parse a market cap cell. Blank, `None` and non-positive values yield nothing.
fn parse_market_cap(cell: Option<&str>) -> Option<f64> {
    let value: f64 = cell?.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

impl MarketCapFeed for DirectoryFeed {
    fn market_caps(&self, code: &SecurityCode, range: DateRange) -> Result<Vec<MarketCapPoint>> {
        let path = self.market_cap_path(code);
        Self::require(code, &path)?;

        let mut reader = csv::Reader::from_path(&path)?;
        let mut points = Vec::new();
        for row in reader.deserialize::<MarketCapRow>() {
            let row = row?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("{code}: bad date {:?}: {e}", row.date)))?;
            if !range.contains(date) {
                continue;
            }
            match parse_market_cap(row.market_cap.as_deref()) {
                Some(market_cap) => points.push(MarketCapPoint::new(date, market_cap)),
                None => debug!(%code, %date, "skipping row without market cap"),
            }
        }

        Ok(points)
    }
}

impl FilingFeed for DirectoryFeed {
    fn filings(&self, code: &SecurityCode, periods: usize) -> Result<FilingSet> {
        let path = self.filings_path(code);
        Self::require(code, &path)?;

        let raw: BTreeMap<String, FilingRecord> = serde_json::from_slice(&std::fs::read(&path)?)?;
        let mut set = FilingSet::new();
        for (token, record) in raw {
            let Ok(period) = token.parse::<PeriodKey>() else {
                warn!(%code, %token, "ignoring unknown filing period");
                continue;
            };
            set.insert(FiscalFiling {
                period,
                net_assets: record.net_assets,
                net_profit: record.net_profit,
                total_revenue: record.total_revenue,
                operating_cashflow: record.operating_cashflow,
            });
        }
        set.truncate_to_latest(periods);

        Ok(set)
    }
}

impl DividendFeed for DirectoryFeed {
    fn dividend_events(&self, code: &SecurityCode) -> Result<Vec<DividendEvent>> {
        let path = self.dividends_path(code);
        Self::require(code, &path)?;

        let raw: BTreeMap<String, (String, String)> = serde_json::from_slice(&std::fs::read(&path)?)?;
        let mut events: Vec<DividendEvent> = raw
            .into_iter()
            .filter_map(|(date, (description, rate))| {
                // Announcements without a usable date are skipped.
                let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
                let rate: PayoutRate = rate.parse().unwrap_or(PayoutRate::NotApplicable);
                Some(DividendEvent::new(date, description, rate))
            })
            .collect();
        events.sort_by_key(|e| e.announce_date);

        Ok(events)
    }
}
