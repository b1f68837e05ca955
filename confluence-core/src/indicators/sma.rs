//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a window that includes the current bar.
//! Lookback: period - 1 (first valid value at index period-1).
//!
//! The running sum is compensated, and a window whose closes are all equal
//! yields exactly that close, so two averages over the same flat stretch
//! compare equal.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// Callers validate `period >= 1` before construction.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let period = self.period;
        let mut result = vec![f64::NAN; n];

        let mut sum = CompensatedSum::default();
        let mut non_finite = 0usize;
        let mut run = 0usize;
        let mut run_value = f64::NAN;

        for i in 0..n {
            let entering = bars[i].close;
            if entering == run_value {
                run += 1;
            } else {
                run = 1;
                run_value = entering;
            }

            if entering.is_finite() {
                sum.add(entering);
            } else {
                non_finite += 1;
            }
            if i >= period {
                let leaving = bars[i - period].close;
                if leaving.is_finite() {
                    sum.add(-leaving);
                } else {
                    non_finite -= 1;
                }
            }

            if i + 1 < period {
                continue;
            }
            result[i] = if non_finite > 0 {
                f64::NAN
            } else if run >= period {
                // A flat window's mean is its value, with no rounding residue.
                entering
            } else {
                sum.value() / period as f64
            };
        }

        result
    }
}

/// Kahan-compensated running sum; values leave the window by adding their negation.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let y = x - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, value) in result.iter().enumerate().take(4) {
            assert!(value.is_nan(), "expected NaN at index {i}");
        }
        // mean(10,11,12,13,14) = 12
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        bars[2].close = f64::NAN;
        let result = Sma::new(3).compute(&bars);
        // windows [10,11,NaN], [11,NaN,13], [NaN,13,14] are all NaN
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        // [13,14,15] recovers
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(25).lookback(), 24);
        assert_eq!(Sma::new(1).lookback(), 0);
        assert_eq!(Sma::new(75).name(), "sma_75");
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5).compute(&bars);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_long_run_has_no_visible_drift() {
        let closes: Vec<f64> = (0..5000).map(|i| 100.0 + ((i % 7) as f64) * 0.1).collect();
        let bars = make_bars(&closes);
        let result = Sma::new(7).compute(&bars);
        // Every full 7-bar window holds one full cycle: mean = 100.3
        for value in &result[6..] {
            assert_approx(*value, 100.3, 1e-8);
        }
    }

    #[test]
    fn flat_tail_after_varied_prefix_is_exact() {
        let mut closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i * 37 % 23) as f64) * 0.37 - 3.1)
            .collect();
        let last = closes[39];
        closes.extend(std::iter::repeat(last).take(40));
        let bars = make_bars(&closes);

        let short = Sma::new(5).compute(&bars);
        let long = Sma::new(25).compute(&bars);
        for i in 39 + 24..closes.len() {
            assert_eq!(long[i], last, "long mean drifted at {i}");
            assert_eq!(short[i], last, "short mean drifted at {i}");
        }
    }

    #[test]
    fn window_leaving_nan_recovers_with_exact_sum() {
        let mut bars = make_bars(&[0.1, 0.2, 0.3, 0.1, 0.2, 0.3]);
        bars[0].close = f64::NAN;
        let result = Sma::new(3).compute(&bars);
        assert!(result[2].is_nan());
        assert_approx(result[3], 0.2, DEFAULT_EPSILON);
        assert_approx(result[5], 0.2, DEFAULT_EPSILON);
    }
}
