//! Confluence Runner: everything around the pure signal pipeline.
//!
//! This crate builds on `confluence-core` to provide:
//! - TOML run configuration
//! - Bar loading from CSV files, or deterministic synthetic bars
//! - Single and batch runs with dataset/result fingerprints
//! - A background worker that only delivers the newest result per symbol
//! - Text summaries and CSV/JSON artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod report;
pub mod runner;
pub mod worker;

pub use config::{BarSource, ConfigError, DataConfig, OutputConfig, RunConfig};
pub use data_loader::{
    generate_synthetic_bars, load_csv, load_series, read_bars_csv, synthetic_series, DateRange,
    LoadError, LoadedSeries,
};
pub use export::{save_artifacts, ArtifactManifest};
pub use report::generate_summary;
pub use runner::{annotate_all, run_batch, run_loaded, run_signals, RunError, SignalReport};
pub use worker::{SignalWorker, WorkerCommand, WorkerError, WorkerResponse};
