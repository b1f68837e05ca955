//! Donchian Channel: highest high / lowest low over a lookback window.
//!
//! Two window placements:
//! - Standard: `max(high[t-period+1..=t])`, lookback `period - 1`.
//! - Lagged: `max(high[t-period..=t-1])`, the `period` bars strictly before t,
//!   lookback `period`. A close can only exceed the lagged upper band, since
//!   the standard band always contains the current bar's own high.
//!
//! Both use a monotonic deque, so a full pass is O(bars) regardless of period.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::Bar;

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

impl DonchianBand {
    fn value(&self, bar: &Bar) -> f64 {
        match self {
            DonchianBand::Upper => bar.high,
            DonchianBand::Lower => bar.low,
        }
    }

    /// True when `incumbent` can never again be the window extremum once
    /// `challenger` has entered.
    fn dominated(&self, incumbent: f64, challenger: f64) -> bool {
        match self {
            DonchianBand::Upper => incumbent <= challenger,
            DonchianBand::Lower => incumbent >= challenger,
        }
    }
}

/// Sliding-window extremum with amortized O(1) push/evict.
///
/// Holds `(index, value)` pairs whose values are monotonic from front to back;
/// the front is always the extremum of the live window.
#[derive(Debug, Clone)]
pub struct MonotonicWindow {
    band: DonchianBand,
    entries: VecDeque<(usize, f64)>,
}

impl MonotonicWindow {
    pub fn new(band: DonchianBand) -> Self {
        Self {
            band,
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, index: usize, value: f64) {
        while let Some(&(_, back)) = self.entries.back() {
            if self.band.dominated(back, value) {
                self.entries.pop_back();
            } else {
                break;
            }
        }
        self.entries.push_back((index, value));
    }

    /// Drop every entry with an index below `first_live`.
    pub fn evict_before(&mut self, first_live: usize) {
        while let Some(&(index, _)) = self.entries.front() {
            if index < first_live {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn extremum(&self) -> Option<f64> {
        self.entries.front().map(|&(_, value)| value)
    }
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    lagged: bool,
    name: String,
}

impl Donchian {
    /// Callers validate `period >= 1` before construction.
    pub fn upper(period: usize) -> Self {
        Self::build(period, DonchianBand::Upper)
    }

    pub fn lower(period: usize) -> Self {
        Self::build(period, DonchianBand::Lower)
    }

    fn build(period: usize, band: DonchianBand) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        let side = match band {
            DonchianBand::Upper => "upper",
            DonchianBand::Lower => "lower",
        };
        Self {
            period,
            band,
            lagged: false,
            name: format!("donchian_{side}_{period}"),
        }
    }

    /// Exclude the current bar: the window becomes the `period` preceding bars.
    pub fn lagged(mut self) -> Self {
        if !self.lagged {
            self.lagged = true;
            self.name.push_str("_lagged");
        }
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        if self.lagged {
            self.period
        } else {
            self.period - 1
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        let mut window = MonotonicWindow::new(self.band);
        // NaN is unordered, so it never enters the deque; any NaN still inside
        // the window makes the whole window NaN.
        let mut last_nan: Option<usize> = None;

        let read = |window: &MonotonicWindow, first: usize, last_nan: Option<usize>| {
            match last_nan {
                Some(nan_at) if nan_at >= first => f64::NAN,
                _ => window.extremum().unwrap_or(f64::NAN),
            }
        };

        for (i, bar) in bars.iter().enumerate() {
            if self.lagged && i >= self.period {
                // Window holds [i - period, i - 1] at this point.
                result[i] = read(&window, i - self.period, last_nan);
            }

            let value = self.band.value(bar);
            if value.is_nan() {
                last_nan = Some(i);
            } else {
                window.push(i, value);
            }
            let first_live = (i + 1).saturating_sub(self.period);
            window.evict_before(first_live);

            if !self.lagged && i + 1 >= self.period {
                result[i] = read(&window, first_live, last_nan);
            }
        }

        result
    }
}
