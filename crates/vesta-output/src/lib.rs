#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/vesta/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod summary;
pub mod validate;

pub use export::{ExportError, ExportFormat, Exporter, RECORD_COLUMNS, RecordWriter, Result, read_series};
pub use summary::{CheckEntry, CheckReport};
pub use validate::{
    RecordField, ValidationStatus, read_record_csv, validate_csv, validate_frame, validate_path,
    validate_series,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
