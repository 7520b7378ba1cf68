#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/vesta/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod pipeline;
pub mod universe;

// Re-export main types from sub-crates
pub use vesta_data as data;
pub use vesta_indicators as indicators;
pub use vesta_output as output;

pub use pipeline::{
    BuildOutcome, DividendSource, Feeds, PipelineConfig, PipelineError, build_series, persist,
};
pub use universe::{Listing, StockList, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
