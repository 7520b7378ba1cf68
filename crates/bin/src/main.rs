//! Vesta CLI binary.
//!
//! Builds, checks and inspects per-security valuation records.

mod integration;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::build_runner::{BuildContext, BuildError, Built, build_all};
use integration::store_manager::{default_store_path, open_store};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vesta::pipeline::{Feeds, PipelineConfig};
use vesta::universe::{StockList, Universe};
use vesta_data::SecurityCode;
use vesta_output::{CheckReport, read_series, validate_path};

#[derive(Parser)]
#[command(name = "vesta")]
#[command(about = "Vesta: daily valuation records for A-share securities", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON config file; flags below override it. `"store_path": null`
    /// disables the store
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the feed files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Root of the per-industry record files
    #[arg(long, global = true)]
    records_dir: Option<PathBuf>,

    /// Security list CSV (code,name,industry)
    #[arg(long, global = true)]
    stock_list: Option<PathBuf>,

    /// SQLite record store
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build record files from the feeds
    Build {
        /// Security code (repeatable)
        #[arg(long = "code")]
        codes: Vec<String>,

        /// Build every security in an industry
        #[arg(long)]
        industry: Option<String>,

        /// Securities built at the same time
        #[arg(long)]
        concurrency: Option<usize>,

        /// Back-fill dividends even when the record already has them
        #[arg(long)]
        recompute_dividend: bool,

        /// Do not write to the SQLite store
        #[arg(long)]
        no_store: bool,
    },

    /// Validate existing record files
    Check {
        /// Only check one industry
        #[arg(long)]
        industry: Option<String>,

        /// Print the report as Markdown
        #[arg(long)]
        markdown: bool,
    },

    /// List industries in the security list
    Industries,

    /// Latest recorded date for a security
    Latest {
        /// Security code
        code: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default = format!("vesta={level},vesta_bin={level},vesta_data={level},vesta_indicators={level},vesta_output={level}");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read a JSON config file, noting whether it sets `store_path` at all.
fn load_config_file(path: &Path) -> Result<(PipelineConfig, bool), Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let sets_store = value.get("store_path").is_some();
    Ok((serde_json::from_value(value)?, sets_store))
}

/// Merge the config file, the global flags and the defaults.
///
/// The store path comes from `--store`, then the config file (where `null`
/// disables it), then the per-user data directory.
fn resolve_config(global: &GlobalArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let (mut config, file_sets_store) = match &global.config {
        Some(path) => load_config_file(path)?,
        None => (PipelineConfig::default(), false),
    };
    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &global.records_dir {
        config.records_dir = dir.clone();
    }
    if let Some(path) = &global.stock_list {
        config.stock_list = path.clone();
    }
    if let Some(path) = &global.store {
        config.store_path = Some(path.clone());
    } else if !file_sets_store {
        config.store_path = Some(default_store_path());
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = resolve_config(&cli.global)?;
    let list = StockList::from_path(&config.stock_list)?;

    match cli.command {
        Commands::Build {
            codes,
            industry,
            concurrency,
            recompute_dividend,
            no_store,
        } => {
            if let Some(n) = concurrency {
                config.concurrency = n;
            }
            config.recompute_dividend |= recompute_dividend;
            if no_store {
                config.store_path = None;
            }
            let codes = select_codes(&list, &codes, industry.as_deref())?;
            build(codes, list, config).await?;
        }
        Commands::Check { industry, markdown } => {
            let report = check(&list, &config, industry.as_deref())?;
            if markdown {
                println!("{}", report.to_markdown());
            } else {
                println!("{}", report);
            }
        }
        Commands::Industries => {
            for industry in list.industries() {
                println!("{:<16} {:>5}", industry, list.codes_in(industry).len());
            }
        }
        Commands::Latest { code } => {
            let code = SecurityCode::parse(&code)?;
            latest(&code, &list, &config)?;
        }
    }

    Ok(())
}

fn select_codes(
    list: &StockList,
    codes: &[String],
    industry: Option<&str>,
) -> Result<Vec<SecurityCode>, Box<dyn std::error::Error>> {
    let mut selected = codes
        .iter()
        .map(|c| SecurityCode::parse(c))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(industry) = industry {
        let in_industry = list.codes_in(industry);
        if in_industry.is_empty() {
            return Err(format!("No securities in industry: {}", industry).into());
        }
        selected.extend(in_industry);
    }
    if selected.is_empty() {
        selected = list.codes();
    }
    let mut seen = HashSet::new();
    selected.retain(|code| seen.insert(code.clone()));
    Ok(selected)
}

async fn build(
    codes: Vec<SecurityCode>,
    list: StockList,
    config: PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = match &config.store_path {
        Some(path) => Some(Arc::new(Mutex::new(open_store(path)?))),
        None => None,
    };
    let ctx = BuildContext {
        feeds: Feeds::from_directory(&config.data_dir),
        list: Arc::new(list),
        config: Arc::new(config),
        store,
    };

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));

    let results = build_all(codes, ctx.clone(), Some(&pb)).await;
    pb.finish_with_message("Done");

    let (report, failed) = build_report(&results, &ctx.list);
    info!(
        built = report.total(),
        passed = report.passed(),
        failed,
        "build finished"
    );
    if !report.all_passed() {
        println!("{}", report);
    }
    Ok(())
}

/// Summarize finished builds from the status each pipeline run reported.
///
/// Returns the report of built securities and the number of failed builds.
fn build_report(results: &[(SecurityCode, Result<Built, BuildError>)], list: &StockList) -> (CheckReport, usize) {
    let mut report = CheckReport::new("build");
    let mut failed = 0;
    for (code, result) in results {
        match result {
            Ok(built) => {
                debug!(%code, path = %built.path.display(), status = %built.outcome.status, "record built");
                report.push(code.as_str(), list.name_of(code), built.outcome.status);
            }
            Err(_) => failed += 1,
        }
    }
    (report, failed)
}

fn check(
    list: &StockList,
    config: &PipelineConfig,
    industry: Option<&str>,
) -> Result<CheckReport, Box<dyn std::error::Error>> {
    let industries: Vec<&str> = match industry {
        Some(i) => vec![i],
        None => list.industries(),
    };

    let mut report = CheckReport::new(industry.unwrap_or("all"));
    for industry in industries {
        for code in list.codes_in(industry) {
            let path = list.record_path(&config.records_dir, &code);
            if !path.exists() {
                warn!(%code, path = %path.display(), "no record file");
                continue;
            }
            report.push(code.as_str(), list.name_of(&code), validate_path(&path)?);
        }
    }
    Ok(report)
}

fn latest(code: &SecurityCode, list: &StockList, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let from_store = match &config.store_path {
        Some(path) if path.exists() => open_store(path)?.latest_date(code)?,
        _ => None,
    };
    let date = match from_store {
        Some(date) => Some(date),
        None => {
            let path = list.record_path(&config.records_dir, code);
            if path.exists() { read_series(&path)?.latest_date() } else { None }
        }
    };

    match date {
        Some(date) => println!("{} {} {}", code, list.name_of(code), date),
        None => println!("{} {} no records", code, list.name_of(code)),
    }
    Ok(())
}
