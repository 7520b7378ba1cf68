//! Parallel record builds.
//!
//! Each security is built on the blocking pool; a bounded stream keeps at most
//! `concurrency` builds in flight. Store writes are serialized behind a mutex.

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;
use vesta::pipeline::{BuildOutcome, Feeds, PipelineConfig, PipelineError, build_series, load_existing, persist};
use vesta::universe::StockList;
use vesta_data::SecurityCode;
use vesta_data::store::SqliteStore;

/// Error type for one security's build.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BuildError {
    /// Pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// The blocking task panicked or was cancelled.
    #[error("Build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// Another build panicked while holding the store.
    #[error("Record store lock poisoned")]
    StorePoisoned,
}

/// Shared state handed to every build.
#[derive(Debug, Clone)]
pub(crate) struct BuildContext {
    pub feeds: Feeds,
    pub list: Arc<StockList>,
    pub config: Arc<PipelineConfig>,
    pub store: Option<Arc<Mutex<SqliteStore>>>,
}

/// A finished build: where the record went and what the pipeline reported.
#[derive(Debug)]
pub(crate) struct Built {
    pub path: PathBuf,
    pub outcome: BuildOutcome,
}

fn build_one(code: &SecurityCode, ctx: &BuildContext) -> Result<Built, BuildError> {
    let existing = load_existing(code, &ctx.list, &ctx.config)?;
    let (series, outcome) = build_series(code, &ctx.feeds, &ctx.list, &ctx.config, existing)?;

    let guard = ctx
        .store
        .as_ref()
        .map(|store| store.lock())
        .transpose()
        .map_err(|_| BuildError::StorePoisoned)?;
    let path = persist(&series, &outcome, &ctx.list, &ctx.config, guard.as_deref())?;

    Ok(Built { path, outcome })
}

/// Build every code in `codes`, at most `ctx.config.concurrency` at a time.
///
/// Results come back in completion order.
pub(crate) async fn build_all(
    codes: Vec<SecurityCode>,
    ctx: BuildContext,
    progress: Option<&ProgressBar>,
) -> Vec<(SecurityCode, Result<Built, BuildError>)> {
    let concurrency = ctx.config.concurrency.max(1);
    if let Some(pb) = progress {
        pb.set_length(codes.len() as u64);
        pb.set_message(format!("Building {} securities ({concurrency} concurrent)...", codes.len()));
    }

    let mut results = Vec::with_capacity(codes.len());
    let mut stream = stream::iter(codes)
        .map(|code| {
            let ctx = ctx.clone();
            async move {
                let task_code = code.clone();
                let result = tokio::task::spawn_blocking(move || build_one(&task_code, &ctx))
                    .await
                    .map_err(BuildError::from)
                    .and_then(|r| r);
                (code, result)
            }
        })
        .buffer_unordered(concurrency);

    while let Some((code, result)) = stream.next().await {
        if let Err(e) = &result {
            match progress {
                Some(pb) => pb.suspend(|| warn!(%code, error = %e, "build failed")),
                None => warn!(%code, error = %e, "build failed"),
            }
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
        results.push((code, result));
    }

    results
}
