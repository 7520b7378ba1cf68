#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/vesta/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dividend;
pub mod error;
pub mod feed;
pub mod filing;
pub mod store;
pub mod types;

pub use dividend::{DividendEvent, PayoutRate};
pub use error::{DataError, Result};
pub use filing::{FilingSet, FiscalFiling, MetricKind, PeriodKey};
pub use types::{DailyRecord, DailySeries, Exchange, MarketCapPoint, SecurityCode, round2};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
