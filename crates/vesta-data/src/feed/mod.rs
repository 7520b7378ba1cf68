//! Upstream feed collaborators.
//!
//! The engines only consume fully materialized inputs; these traits describe
//! where those inputs come from. Any connection or session state belongs to
//! the implementing value, never to globals.

pub mod directory;

pub use directory::DirectoryFeed;

use crate::error::Result;
use crate::{DividendEvent, FilingSet, MarketCapPoint, SecurityCode};
use chrono::NaiveDate;

/// Inclusive date window, open on either side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First date included, if bounded
    pub start: Option<NaiveDate>,
    /// Last date included, if bounded
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A window without bounds.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// A window with both bounds.
    pub const fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A window starting at `start` with no end.
    pub const fn since(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Daily market capitalization source.
pub trait MarketCapFeed: Send + Sync {
    /// Observations for `code` inside `range`, one per trading day.
    fn market_caps(&self, code: &SecurityCode, range: DateRange) -> Result<Vec<MarketCapPoint>>;
}

/// Financial statement source.
pub trait FilingFeed: Send + Sync {
    /// The `periods` most recent disclosed filings for `code`.
    fn filings(&self, code: &SecurityCode, periods: usize) -> Result<FilingSet>;
}

/// Dividend announcement source.
pub trait DividendFeed: Send + Sync {
    /// All announcements for `code`, ascending by announcement date.
    fn dividend_events(&self, code: &SecurityCode) -> Result<Vec<DividendEvent>>;
}
