//! Signal runner: wires together loading, the pipeline and result hashing.
//!
//! Entry points:
//! - `run_signals()`: loads bars for one `RunConfig`, then runs. Used by the CLI.
//! - `run_loaded()`: takes an already loaded series. No I/O.
//! - `run_batch()`: many configs in parallel; each failure stays with its config.
//! - `annotate_all()`: one parameter set over many in-memory series, in parallel.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use confluence_core::fingerprint::{params_hash, Fingerprint};
use confluence_core::{
    AnnotatedSeries, BarSeries, Interval, Pipeline, PipelineError, SignalCounts, SignalParams,
};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_series, LoadError, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("signal error: {0}")]
    Signals(#[from] PipelineError),
}

impl From<confluence_core::ConfigError> for RunError {
    fn from(e: confluence_core::ConfigError) -> Self {
        RunError::Signals(PipelineError::Config(e))
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything produced by one run, ready for export.
#[derive(Debug, Clone, Serialize)]
pub struct SignalReport {
    pub schema_version: u32,
    pub symbol: String,
    pub interval: Interval,
    pub bar_count: usize,
    pub trading_days: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub synthetic: bool,
    pub dataset_hash: Fingerprint,
    pub params_hash: Fingerprint,
    /// Hash over bars, parameters and flags.
    pub result_hash: Fingerprint,
    pub counts: SignalCounts,
    pub annotated: AnnotatedSeries,
}

impl SignalReport {
    fn new(loaded: LoadedSeries, annotated: AnnotatedSeries) -> Self {
        let series = &loaded.series;
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: series.symbol().to_string(),
            interval: series.interval(),
            bar_count: series.len(),
            trading_days: series.trading_days(),
            first_timestamp: series.first_timestamp(),
            last_timestamp: series.last_timestamp(),
            synthetic: loaded.synthetic,
            dataset_hash: loaded.dataset_hash.clone(),
            params_hash: params_hash(annotated.params()),
            result_hash: annotated.fingerprint(),
            counts: annotated.counts(),
            annotated,
        }
    }
}

/// Run the pipeline over an already loaded series.
pub fn run_loaded(loaded: LoadedSeries, params: SignalParams) -> Result<SignalReport, RunError> {
    let pipeline = Pipeline::new(params)?;
    let annotated = pipeline.run(&loaded.series);
    let report = SignalReport::new(loaded, annotated);
    info!(
        symbol = %report.symbol,
        interval = %report.interval,
        bars = report.bar_count,
        buys = report.counts.synergy_buy,
        sells = report.counts.synergy_sell,
        hash = report.result_hash.short(),
        "signals computed"
    );
    Ok(report)
}

/// Load bars for `config` and run the pipeline.
pub fn run_signals(config: &RunConfig) -> Result<SignalReport, RunError> {
    config.validate()?;
    let loaded = load_series(&config.data)?;
    run_loaded(loaded, config.signals)
}

/// Run many configurations in parallel on the global rayon pool.
///
/// Results come back in input order.
pub fn run_batch(configs: &[RunConfig]) -> Vec<Result<SignalReport, RunError>> {
    let results: Vec<_> = configs.par_iter().map(run_signals).collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(runs = configs.len(), failed, "batch complete");
    results
}

/// Annotate many in-memory series with one parameter set, in parallel.
pub fn annotate_all(
    series: &[BarSeries],
    params: SignalParams,
) -> Result<Vec<AnnotatedSeries>, confluence_core::ConfigError> {
    let pipeline = Pipeline::new(params)?;
    Ok(series.par_iter().map(|s| pipeline.run(s)).collect())
}
