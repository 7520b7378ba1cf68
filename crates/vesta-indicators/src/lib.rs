#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/vesta/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dividend;
pub mod period;
pub mod ratio;

pub use dividend::{BackfillConfig, BackfillReport, DividendBackfill, snap_to_row};
pub use period::{LookupMiss, candidate_periods, quarterly_period, resolve_period};
pub use ratio::{Denominator, RatioReport, denominator, reconstruct_ratios};
