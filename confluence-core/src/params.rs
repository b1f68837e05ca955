//! Signal parameters and their validation.
//!
//! Parameters are checked once, before any computation. A bad parameter is a
//! [`ConfigError`], never a data error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BREAKOUT_LOOKBACK: usize = 20;
pub const DEFAULT_MA_SHORT_WINDOW: usize = 5;
pub const DEFAULT_MA_LONG_WINDOW: usize = 25;
pub const DEFAULT_OPENING_RANGE_MINUTES: u32 = 30;
pub const DEFAULT_AUX_MA_WINDOW: usize = 75;

/// Invalid signal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be at least 1 (got {value})")]
    NonPositive { name: &'static str, value: u64 },

    #[error("ma_short_window ({short}) must be less than ma_long_window ({long})")]
    WindowOrder { short: usize, long: usize },
}

/// Per-call detector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalParams {
    /// Bars preceding the current one that form the breakout channel.
    pub breakout_lookback: usize,
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    /// Length of each day's opening window, in minutes.
    pub opening_range_minutes: u32,
    /// Display-only moving average; never feeds a detector.
    pub aux_ma_window: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            breakout_lookback: DEFAULT_BREAKOUT_LOOKBACK,
            ma_short_window: DEFAULT_MA_SHORT_WINDOW,
            ma_long_window: DEFAULT_MA_LONG_WINDOW,
            opening_range_minutes: DEFAULT_OPENING_RANGE_MINUTES,
            aux_ma_window: DEFAULT_AUX_MA_WINDOW,
        }
    }
}

impl SignalParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("breakout_lookback", self.breakout_lookback as u64)?;
        require_positive("ma_short_window", self.ma_short_window as u64)?;
        require_positive("ma_long_window", self.ma_long_window as u64)?;
        require_positive("opening_range_minutes", u64::from(self.opening_range_minutes))?;
        require_positive("aux_ma_window", self.aux_ma_window as u64)?;
        if self.ma_short_window >= self.ma_long_window {
            return Err(ConfigError::WindowOrder {
                short: self.ma_short_window,
                long: self.ma_long_window,
            });
        }
        Ok(())
    }
}

pub(crate) fn require_positive(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositive { name, value });
    }
    Ok(())
}
