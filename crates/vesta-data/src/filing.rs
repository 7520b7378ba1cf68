//! Disclosed financial statements keyed by fiscal period.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fiscal period a statement covers.
///
/// Tokens are `annual-YYYY`, `interim-YYYY` (half year), `q1-YYYY` and `q3-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PeriodKey {
    /// Full-year report
    Annual(i32),
    /// Half-year report
    Interim(i32),
    /// First-quarter report
    FirstQuarter(i32),
    /// Third-quarter report
    ThirdQuarter(i32),
}

impl PeriodKey {
    /// Fiscal year of the period.
    pub const fn fiscal_year(&self) -> i32 {
        match *self {
            Self::Annual(y) | Self::Interim(y) | Self::FirstQuarter(y) | Self::ThirdQuarter(y) => y,
        }
    }

    /// Token prefix of the period kind.
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Annual(_) => "annual",
            Self::Interim(_) => "interim",
            Self::FirstQuarter(_) => "q1",
            Self::ThirdQuarter(_) => "q3",
        }
    }

    /// Chronological position by period end.
    const fn sort_key(&self) -> (i32, u8) {
        let rank = match self {
            Self::FirstQuarter(_) => 0,
            Self::Interim(_) => 1,
            Self::ThirdQuarter(_) => 2,
            Self::Annual(_) => 3,
        };
        (self.fiscal_year(), rank)
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix(), self.fiscal_year())
    }
}

impl FromStr for PeriodKey {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DataError::InvalidPeriod(s.to_string());
        let (kind, year) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        match kind.to_ascii_lowercase().as_str() {
            "annual" => Ok(Self::Annual(year)),
            "interim" => Ok(Self::Interim(year)),
            "q1" => Ok(Self::FirstQuarter(year)),
            "q3" => Ok(Self::ThirdQuarter(year)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

/// Statement line used as a ratio denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Net assets attributable to owners, denominator of PB
    NetAssets,
    /// Net profit attributable to owners, denominator of PE
    NetProfit,
    /// Total operating revenue, denominator of PS
    TotalRevenue,
    /// Net operating cashflow, denominator of PC
    OperatingCashflow,
}

impl MetricKind {
    /// All metrics, in ratio column order.
    pub const fn all() -> [Self; 4] {
        [
            Self::NetAssets,
            Self::NetProfit,
            Self::TotalRevenue,
            Self::OperatingCashflow,
        ]
    }

    /// Column name of the ratio built on this metric.
    pub const fn ratio_column(&self) -> &'static str {
        match self {
            Self::NetAssets => "pb",
            Self::NetProfit => "pe",
            Self::TotalRevenue => "ps",
            Self::OperatingCashflow => "pc",
        }
    }

    /// Human readable metric name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NetAssets => "net assets",
            Self::NetProfit => "net profit",
            Self::TotalRevenue => "total revenue",
            Self::OperatingCashflow => "operating cashflow",
        }
    }

    /// Whether the metric is read from annual rather than quarterly filings.
    pub const fn uses_annual_filings(&self) -> bool {
        !matches!(self, Self::NetAssets)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One disclosed statement period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalFiling {
    /// Period the statement covers
    pub period: PeriodKey,
    /// Net assets attributable to owners
    pub net_assets: Option<f64>,
    /// Net profit attributable to owners
    pub net_profit: Option<f64>,
    /// Total operating revenue
    pub total_revenue: Option<f64>,
    /// Net operating cashflow
    pub operating_cashflow: Option<f64>,
}

impl FiscalFiling {
    /// Create a filing with no values.
    pub const fn new(period: PeriodKey) -> Self {
        Self {
            period,
            net_assets: None,
            net_profit: None,
            total_revenue: None,
            operating_cashflow: None,
        }
    }

    /// Set a metric value.
    pub fn with(mut self, metric: MetricKind, value: f64) -> Self {
        match metric {
            MetricKind::NetAssets => self.net_assets = Some(value),
            MetricKind::NetProfit => self.net_profit = Some(value),
            MetricKind::TotalRevenue => self.total_revenue = Some(value),
            MetricKind::OperatingCashflow => self.operating_cashflow = Some(value),
        }
        self
    }

    /// Reported value of a metric, if disclosed.
    pub const fn value(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::NetAssets => self.net_assets,
            MetricKind::NetProfit => self.net_profit,
            MetricKind::TotalRevenue => self.total_revenue,
            MetricKind::OperatingCashflow => self.operating_cashflow,
        }
    }
}

/// The disclosed filings of one security.
///
/// A period is present only once its statement has been published; filings
/// are not modified after insertion within a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilingSet {
    filings: BTreeMap<PeriodKey, FiscalFiling>,
}

impl FilingSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filing, replacing any filing for the same period.
    pub fn insert(&mut self, filing: FiscalFiling) {
        self.filings.insert(filing.period, filing);
    }

    /// Whether the period has been disclosed.
    pub fn contains(&self, period: PeriodKey) -> bool {
        self.filings.contains_key(&period)
    }

    /// Filing for a period.
    pub fn get(&self, period: PeriodKey) -> Option<&FiscalFiling> {
        self.filings.get(&period)
    }

    /// Value of `metric` in the filing for `period`.
    pub fn value(&self, period: PeriodKey, metric: MetricKind) -> Option<f64> {
        self.get(period).and_then(|f| f.value(metric))
    }

    /// Periods in chronological order.
    pub fn periods(&self) -> impl Iterator<Item = PeriodKey> + '_ {
        self.filings.keys().copied()
    }

    /// Keep only the `count` most recent periods.
    pub fn truncate_to_latest(&mut self, count: usize) {
        while self.filings.len() > count {
            self.filings.pop_first();
        }
    }

    /// Number of filings.
    pub fn len(&self) -> usize {
        self.filings.len()
    }

    /// Whether no filings are present.
    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

impl FromIterator<FiscalFiling> for FilingSet {
    fn from_iter<I: IntoIterator<Item = FiscalFiling>>(iter: I) -> Self {
        let mut set = Self::new();
        for filing in iter {
            set.insert(filing);
        }
        set
    }
}
