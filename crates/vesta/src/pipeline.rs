//! Per-security build pipeline.
//!
//! The market-cap feed supplies the date index; ratios are reconstructed from
//! the security's filings; dividend yields are back-filled from announcements;
//! the validator runs last. Securities share no state, so callers may run any
//! number of builds in parallel.

use crate::universe::StockList;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use vesta_data::feed::{DateRange, DirectoryFeed, DividendFeed, FilingFeed, MarketCapFeed};
use vesta_data::store::SqliteStore;
use vesta_data::{DailySeries, DataError, FilingSet, SecurityCode};
use vesta_indicators::{BackfillConfig, BackfillReport, DividendBackfill, RatioReport, reconstruct_ratios};
use vesta_output::{ExportError, RecordWriter, ValidationStatus, read_series, validate_series};

/// Errors that abort the build of one security.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Feed, store or series error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Record writing or validation error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The market-cap feed returned nothing to build on
    #[error("no market cap rows for {0}")]
    NoMarketCaps(SecurityCode),

    /// Every row was dropped for lacking usable net assets
    #[error("no row of {0} has usable net assets")]
    NoUsableRows(SecurityCode),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Settings shared by every build in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root of the file-backed feeds
    pub data_dir: PathBuf,
    /// Root of the per-industry record files
    pub records_dir: PathBuf,
    /// Security list CSV
    pub stock_list: PathBuf,
    /// SQLite store; `None` disables the store
    pub store_path: Option<PathBuf>,
    /// Securities built at the same time (default: 10)
    pub concurrency: usize,
    /// Filing periods requested per security (default: 160)
    pub filing_periods: usize,
    /// Back-fill dividends even when every row already has a yield
    pub recompute_dividend: bool,
    /// Dividend back-fill window
    pub backfill: BackfillConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            records_dir: PathBuf::from("records"),
            stock_list: PathBuf::from("stock-list.csv"),
            store_path: None,
            concurrency: 10,
            filing_periods: 160,
            recompute_dividend: false,
            backfill: BackfillConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(DataError::from)?;
        Ok(serde_json::from_str(&text).map_err(DataError::from)?)
    }
}

/// The three upstream feeds a build reads from.
#[derive(Clone)]
pub struct Feeds {
    /// Daily market caps
    pub market_caps: Arc<dyn MarketCapFeed>,
    /// Financial statements
    pub filings: Arc<dyn FilingFeed>,
    /// Dividend announcements
    pub dividends: Arc<dyn DividendFeed>,
}

impl Feeds {
    /// All three feeds served from one data directory.
    pub fn from_directory(root: impl AsRef<Path>) -> Self {
        let feed = Arc::new(DirectoryFeed::new(root));
        Self {
            market_caps: feed.clone(),
            filings: feed.clone(),
            dividends: feed,
        }
    }
}

impl std::fmt::Debug for Feeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feeds").finish_non_exhaustive()
    }
}

/// Where the dividend column of a build came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividendSource {
    /// The existing record already had a yield on every row.
    Kept,
    /// Back-filled from announcements.
    Backfilled(BackfillReport),
    /// The dividend feed failed; rows without a yield were set to 0.00 and
    /// existing yields were kept.
    ZeroFilled,
}

/// Summary of one security's build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// Security built
    pub code: SecurityCode,
    /// Rows taken from an existing record
    pub rows_existing: usize,
    /// Rows added or refreshed from the market-cap feed
    pub rows_fetched: usize,
    /// Rows removed for lacking usable net assets
    pub rows_dropped: usize,
    /// Ratio reconstruction details
    pub ratios: RatioReport,
    /// Dividend column provenance
    pub dividend: DividendSource,
    /// Validator verdict on the built series
    pub status: ValidationStatus,
}

/// Build the daily series for `code`.
///
/// When `existing` is given (the previously persisted record), only dates
/// after its latest row are fetched and merged in; a fetched row replaces a
/// stored row of the same date.
///
/// # Errors
///
/// Fails when the market-cap feed errors or yields no rows, or when no row
/// survives the net assets rule. Missing filings and a failing dividend feed
/// otherwise degrade to empty ratios and zero yields.
pub fn build_series(
    code: &SecurityCode,
    feeds: &Feeds,
    list: &StockList,
    config: &PipelineConfig,
    existing: Option<DailySeries>,
) -> Result<(DailySeries, BuildOutcome)> {
    let name = list.name_of(code);
    let range = existing
        .as_ref()
        .and_then(DailySeries::latest_date)
        .map_or_else(DateRange::unbounded, |latest| DateRange::since(latest + Duration::days(1)));

    let points = feeds.market_caps.market_caps(code, range)?;
    let fetched = DailySeries::from_market_caps(code.clone(), name, points)?;
    let rows_fetched = fetched.len();

    let (mut series, rows_existing) = match existing {
        Some(mut base) => {
            let rows = base.len();
            for record in fetched.into_records() {
                base.upsert(record);
            }
            (base, rows)
        }
        None => (fetched, 0),
    };
    if series.is_empty() {
        return Err(PipelineError::NoMarketCaps(code.clone()));
    }
    debug!(%code, rows_existing, rows_fetched, "market caps loaded");

    let filings = match feeds.filings.filings(code, config.filing_periods) {
        Ok(filings) => filings,
        Err(e) => {
            warn!(%code, error = %e, "filings unavailable, ratios will be empty");
            FilingSet::new()
        }
    };
    let ratios = reconstruct_ratios(&mut series, &filings);
    if series.is_empty() {
        return Err(PipelineError::NoUsableRows(code.clone()));
    }

    let dividend = if series.dividend_complete() && !config.recompute_dividend {
        DividendSource::Kept
    } else {
        match feeds.dividends.dividend_events(code) {
            Ok(events) => {
                let report = DividendBackfill::with_config(config.backfill).apply(&mut series, &events);
                DividendSource::Backfilled(report)
            }
            Err(e) => {
                warn!(%code, error = %e, "dividend events unavailable, missing yields set to 0.00");
                for record in series.records_mut() {
                    record.dividend_yield.get_or_insert(0.0);
                }
                DividendSource::ZeroFilled
            }
        }
    };

    let status = validate_series(&series)?;
    let outcome = BuildOutcome {
        code: code.clone(),
        rows_existing,
        rows_fetched,
        rows_dropped: ratios.dropped_rows,
        ratios,
        dividend,
        status,
    };
    info!(%code, rows = series.len(), status = %outcome.status, "series built");

    Ok((series, outcome))
}

/// Load the persisted record of `code`, if one exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_existing(code: &SecurityCode, list: &StockList, config: &PipelineConfig) -> Result<Option<DailySeries>> {
    let path = list.record_path(&config.records_dir, code);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_series(&path)?))
}

/// Write the record file of a built series and, if it passed validation,
/// store it.
///
/// Returns the record file path.
///
/// # Errors
///
/// Returns an error if the file or the store write fails.
pub fn persist(
    series: &DailySeries,
    outcome: &BuildOutcome,
    list: &StockList,
    config: &PipelineConfig,
    store: Option<&SqliteStore>,
) -> Result<PathBuf> {
    let path = list.record_path(&config.records_dir, series.code());
    RecordWriter::write_to_path(series, &path)?;
    debug!(code = %series.code(), path = %path.display(), "record written");

    if let Some(store) = store {
        if outcome.status.is_ok() {
            store.put_series(series)?;
        } else {
            warn!(code = %series.code(), status = %outcome.status, "not storing record that failed validation");
        }
    }

    Ok(path)
}
