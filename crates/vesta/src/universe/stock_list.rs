//! Security list loaded from CSV.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use vesta_data::{DataError, Result, SecurityCode};

/// Name and industry reported for codes missing from the list.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Deserialize)]
struct ListRow {
    code: String,
    name: String,
    industry: String,
}

/// One entry of the security list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Code as written in the list, e.g. `600519.SH`.
    pub symbol: String,
    /// Parsed six digit code.
    pub code: SecurityCode,
    /// Display name.
    pub name: String,
    /// Industry classification.
    pub industry: String,
}

impl Listing {
    /// Whether the listing trades on the Shanghai or Shenzhen exchange.
    pub fn is_exchange_listed(&self) -> bool {
        let upper = self.symbol.to_ascii_uppercase();
        upper.ends_with(".SH") || upper.ends_with(".SZ")
    }
}

/// Security list with industry classification.
#[derive(Debug, Clone, Default)]
pub struct StockList {
    listings: Vec<Listing>,
    by_code: HashMap<SecurityCode, usize>,
}

impl StockList {
    /// Load a `code,name,industry` CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a row is malformed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Load a `code,name,industry` CSV from any reader.
    ///
    /// Rows whose code is not a six digit code are skipped. When a code
    /// appears twice the first row wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a row is malformed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut list = Self::default();

        for row in rdr.deserialize() {
            let row: ListRow = row.map_err(DataError::from)?;
            let Ok(code) = SecurityCode::parse(&row.code) else {
                warn!(code = %row.code, "skipping security list row with unusable code");
                continue;
            };
            list.by_code.entry(code.clone()).or_insert(list.listings.len());
            list.listings.push(Listing {
                symbol: row.code.trim().to_string(),
                code,
                name: row.name.trim().to_string(),
                industry: row.industry.trim().to_string(),
            });
        }

        Ok(list)
    }

    /// All listings in file order.
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Listings on the Shanghai and Shenzhen exchanges.
    pub fn exchange_listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.iter().filter(|l| l.is_exchange_listed())
    }

    /// Listing for `code`, if present.
    pub fn get(&self, code: &SecurityCode) -> Option<&Listing> {
        self.by_code.get(code).map(|&i| &self.listings[i])
    }

    /// Display name of `code`, or [`UNKNOWN`].
    pub fn name_of(&self, code: &SecurityCode) -> &str {
        self.get(code).map_or(UNKNOWN, |l| l.name.as_str())
    }

    /// Industry of `code`, or [`UNKNOWN`].
    pub fn industry_of(&self, code: &SecurityCode) -> &str {
        self.get(code).map_or(UNKNOWN, |l| l.industry.as_str())
    }

    /// Distinct industries in order of first appearance.
    pub fn industries(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for listing in &self.listings {
            if !seen.contains(&listing.industry.as_str()) {
                seen.push(listing.industry.as_str());
            }
        }
        seen
    }

    /// Exchange-listed codes in `industry`.
    pub fn codes_in(&self, industry: &str) -> Vec<SecurityCode> {
        self.exchange_listings()
            .filter(|l| l.industry == industry)
            .map(|l| l.code.clone())
            .collect()
    }

    /// Record file of `code` under `root`: `root/<industry>/<code>.csv`.
    pub fn record_path(&self, root: &Path, code: &SecurityCode) -> PathBuf {
        root.join(self.industry_of(code)).join(format!("{code}.csv"))
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
