//! Confluence Core: bar series, rule-based signal detectors and their fusion.
//!
//! This crate contains the signal computation:
//! - Domain types (bars, validated bar series, intervals, signal rows)
//! - Rolling indicators (simple moving average, Donchian channel)
//! - Breakout, moving-average crossover and opening-range detectors
//! - Fusion of the three detectors into synergy flags
//! - The pipeline that runs them in fixed order and annotates a series
//!
//! Everything here is pure: no I/O, no global state, safe to call from any thread.

pub mod annotated;
pub mod detectors;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod params;
pub mod pipeline;

pub use annotated::{AnnotatedRow, AnnotatedSeries, Overlays};
pub use domain::{
    Bar, BarSeries, Interval, SeriesError, SignalCounts, SignalMarker, SignalRow, SignalSide,
};
pub use fingerprint::Fingerprint;
pub use params::{ConfigError, SignalParams};
pub use pipeline::{Pipeline, PipelineError, Stage};
