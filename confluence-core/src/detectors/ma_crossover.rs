//! Moving average crossover detector: golden cross and death cross.
//!
//! Edge-triggered: a signal fires only on the bar where the short/long
//! relationship changes, never while it merely holds.
//! - Buy: `short[i-1] <= long[i-1]` and `short[i] > long[i]`.
//! - Sell: `short[i-1] >= long[i-1]` and `short[i] < long[i]`.
//!
//! A tie at `i` is "not yet crossed". Any undefined (warmup) average on either
//! bar suppresses the signal, so the first `long_window` bars never fire.

use super::Detector;
use crate::domain::Bar;
use crate::indicators::{Indicator, Sma};
use crate::params::{require_positive, ConfigError};

#[derive(Debug, Clone)]
pub struct MaCrossoverDetector {
    short: Sma,
    long: Sma,
}

/// Crossover flags plus both averages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaCrossoverSignals {
    pub ma_short: Vec<f64>,
    pub ma_long: Vec<f64>,
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

impl MaCrossoverDetector {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, ConfigError> {
        require_positive("ma_short_window", short_window as u64)?;
        require_positive("ma_long_window", long_window as u64)?;
        if short_window >= long_window {
            return Err(ConfigError::WindowOrder {
                short: short_window,
                long: long_window,
            });
        }
        Ok(Self {
            short: Sma::new(short_window),
            long: Sma::new(long_window),
        })
    }

    pub fn short_window(&self) -> usize {
        self.short.period()
    }

    pub fn long_window(&self) -> usize {
        self.long.period()
    }
}

impl Detector for MaCrossoverDetector {
    type Output = MaCrossoverSignals;

    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.long.period()
    }

    fn detect(&self, bars: &[Bar]) -> MaCrossoverSignals {
        let ma_short = self.short.compute(bars);
        let ma_long = self.long.compute(bars);
        let n = bars.len();
        let mut buy = vec![false; n];
        let mut sell = vec![false; n];

        for i in 1..n {
            let (short_prev, long_prev) = (ma_short[i - 1], ma_long[i - 1]);
            let (short_cur, long_cur) = (ma_short[i], ma_long[i]);

            if short_prev.is_nan() || long_prev.is_nan() || short_cur.is_nan() || long_cur.is_nan()
            {
                continue;
            }

            buy[i] = short_prev <= long_prev && short_cur > long_cur;
            sell[i] = short_prev >= long_prev && short_cur < long_cur;
        }

        MaCrossoverSignals {
            ma_short,
            ma_long,
            buy,
            sell,
        }
    }
}
