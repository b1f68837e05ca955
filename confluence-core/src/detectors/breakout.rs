//! Breakout detector: close breaking the prior N-bar high or low.
//!
//! Fires buy when `close[i] > max(high[i-n..=i-1])` and sell when
//! `close[i] < min(low[i-n..=i-1])`. The channel is a lagged Donchian
//! channel, so the current bar never contributes to its own threshold.
//! With fewer than `n` preceding bars the channel is undefined and nothing fires.
//!
//! Buy and sell are mutually exclusive: every bar has high >= low, so the
//! upper band is never below the lower band.

use super::Detector;
use crate::domain::Bar;
use crate::indicators::{Donchian, Indicator};
use crate::params::{require_positive, ConfigError};

#[derive(Debug, Clone)]
pub struct BreakoutDetector {
    lookback: usize,
    upper: Donchian,
    lower: Donchian,
}

/// Breakout flags plus the channel they were tested against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakoutSignals {
    pub highest: Vec<f64>,
    pub lowest: Vec<f64>,
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

impl BreakoutDetector {
    pub fn new(lookback: usize) -> Result<Self, ConfigError> {
        require_positive("breakout_lookback", lookback as u64)?;
        Ok(Self {
            lookback,
            upper: Donchian::upper(lookback).lagged(),
            lower: Donchian::lower(lookback).lagged(),
        })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

impl Detector for BreakoutDetector {
    type Output = BreakoutSignals;

    fn name(&self) -> &str {
        "breakout"
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }

    fn detect(&self, bars: &[Bar]) -> BreakoutSignals {
        let highest = self.upper.compute(bars);
        let lowest = self.lower.compute(bars);

        // NaN thresholds compare false, so the warmup prefix stays quiet.
        let buy = bars
            .iter()
            .zip(&highest)
            .map(|(bar, &high)| bar.close > high)
            .collect();
        let sell = bars
            .iter()
            .zip(&lowest)
            .map(|(bar, &low)| bar.close < low)
            .collect();

        BreakoutSignals {
            highest,
            lowest,
            buy,
            sell,
        }
    }
}
