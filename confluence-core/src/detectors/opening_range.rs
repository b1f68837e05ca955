//! Opening range breakout detector (intraday).
//!
//! Bars are grouped by calendar date in one ascending pass. For each date the
//! opening window is `[first_timestamp, first_timestamp + minutes)`; its highest
//! high and lowest low form that date's range. Every bar of the date is then
//! tested with strict inequalities:
//! - Buy: `close > or_high`
//! - Sell: `close < or_low`
//!
//! Bars inside the opening window helped build the range, so they can never
//! break it. With one bar per date (daily series) the window is the bar
//! itself and the detector never fires.

use std::ops::Range;

use chrono::Duration;

use super::Detector;
use crate::domain::Bar;
use crate::params::{require_positive, ConfigError};

#[derive(Debug, Clone)]
pub struct OpeningRangeDetector {
    minutes: u32,
    window: Duration,
}

/// Opening-range flags plus each bar's range (NaN when the date has none).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpeningRangeSignals {
    pub or_high: Vec<f64>,
    pub or_low: Vec<f64>,
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

/// Index ranges of consecutive bars sharing a calendar date.
pub fn day_groups(bars: &[Bar]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..bars.len() {
        if bars[i].date() != bars[i - 1].date() {
            groups.push(start..i);
            start = i;
        }
    }
    if !bars.is_empty() {
        groups.push(start..bars.len());
    }
    groups
}

impl OpeningRangeDetector {
    pub fn new(minutes: u32) -> Result<Self, ConfigError> {
        require_positive("opening_range_minutes", u64::from(minutes))?;
        Ok(Self {
            minutes,
            window: Duration::minutes(i64::from(minutes)),
        })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// High/low over the bars of one date that fall in its opening window.
    fn range_for(&self, day: &[Bar]) -> Option<(f64, f64)> {
        let first = day.first()?.timestamp;
        // Past the end of the calendar the window covers the rest of the day.
        let end = first.checked_add_signed(self.window);
        day.iter()
            .filter(|bar| bar.timestamp >= first && end.map_or(true, |end| bar.timestamp < end))
            .fold(None, |acc, bar| match acc {
                None => Some((bar.high, bar.low)),
                Some((high, low)) => Some((f64::max(high, bar.high), f64::min(low, bar.low))),
            })
    }
}

impl Detector for OpeningRangeDetector {
    type Output = OpeningRangeSignals;

    fn name(&self) -> &str {
        "opening_range"
    }

    fn warmup_bars(&self) -> usize {
        // The first bar of every day sits in its own opening window.
        1
    }

    fn detect(&self, bars: &[Bar]) -> OpeningRangeSignals {
        let n = bars.len();
        let mut out = OpeningRangeSignals {
            or_high: vec![f64::NAN; n],
            or_low: vec![f64::NAN; n],
            buy: vec![false; n],
            sell: vec![false; n],
        };

        for group in day_groups(bars) {
            let Some((high, low)) = self.range_for(&bars[group.clone()]) else {
                continue;
            };
            for i in group {
                out.or_high[i] = high;
                out.or_low[i] = low;
                out.buy[i] = bars[i].close > high;
                out.sell[i] = bars[i].close < low;
            }
        }

        out
    }
}
