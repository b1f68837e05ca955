//! Bar: the fundamental market data unit.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV observation for one sampling interval.
///
/// `timestamp` is the bar's open time in exchange-local time. Daily bars carry
/// midnight of their trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a single bar is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarDefect {
    #[error("{field} is not finite")]
    NonFinite { field: &'static str },

    #[error("negative volume {volume}")]
    NegativeVolume { volume: f64 },

    #[error("high {high} is below low {low}")]
    InvertedRange { high: f64, low: f64 },

    #[error("{field} {value} lies outside [{low}, {high}]")]
    OutsideRange {
        field: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },
}

impl Bar {
    /// Calendar date of the bar, used for per-day grouping.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLCV sanity check: high >= low, open and close inside the range.
    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
    }

    /// Same checks as [`Bar::is_sane`], reporting the first defect found.
    pub fn validate(&self) -> Result<(), BarDefect> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ] {
            if !value.is_finite() {
                return Err(BarDefect::NonFinite { field });
            }
        }
        if self.volume < 0.0 {
            return Err(BarDefect::NegativeVolume {
                volume: self.volume,
            });
        }
        if self.high < self.low {
            return Err(BarDefect::InvertedRange {
                high: self.high,
                low: self.low,
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(BarDefect::OutsideRange {
                    field,
                    value,
                    low: self.low,
                    high: self.high,
                });
            }
        }
        Ok(())
    }
}
