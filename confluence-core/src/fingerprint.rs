//! Content hashes for inputs, parameters and results.
//!
//! Every hash is BLAKE3 over a fixed little-endian byte layout, so it is stable
//! across runs, builds and platforms. Two annotated series with the same
//! fingerprint were computed from the same bars with the same parameters and
//! carry the same flags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, SignalRow};
use crate::params::SignalParams;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    fn from_hasher(hasher: &blake3::Hasher) -> Self {
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines and file names.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn update_series(hasher: &mut blake3::Hasher, series: &BarSeries) {
    hasher.update(series.symbol().as_bytes());
    hasher.update(series.interval().as_str().as_bytes());
    hasher.update(&(series.len() as u64).to_le_bytes());
    for bar in series.bars() {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
}

fn update_params(hasher: &mut blake3::Hasher, params: &SignalParams) {
    hasher.update(&(params.breakout_lookback as u64).to_le_bytes());
    hasher.update(&(params.ma_short_window as u64).to_le_bytes());
    hasher.update(&(params.ma_long_window as u64).to_le_bytes());
    hasher.update(&params.opening_range_minutes.to_le_bytes());
    hasher.update(&(params.aux_ma_window as u64).to_le_bytes());
}

fn update_signals(hasher: &mut blake3::Hasher, rows: &[SignalRow]) {
    hasher.update(&(rows.len() as u64).to_le_bytes());
    for row in rows {
        let packed = row
            .flags()
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, &set)| acc | (u8::from(set) << bit));
        hasher.update(&[packed]);
    }
}

/// Hash of the symbol, interval and every OHLCV value.
pub fn dataset_hash(series: &BarSeries) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    update_series(&mut hasher, series);
    Fingerprint::from_hasher(&hasher)
}

pub fn params_hash(params: &SignalParams) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    update_params(&mut hasher, params);
    Fingerprint::from_hasher(&hasher)
}

pub fn signals_hash(rows: &[SignalRow]) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    update_signals(&mut hasher, rows);
    Fingerprint::from_hasher(&hasher)
}

/// Combined hash of bars, parameters and flags.
pub fn run_hash(series: &BarSeries, params: &SignalParams, rows: &[SignalRow]) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    update_series(&mut hasher, series);
    update_params(&mut hasher, params);
    update_signals(&mut hasher, rows);
    Fingerprint::from_hasher(&hasher)
}
