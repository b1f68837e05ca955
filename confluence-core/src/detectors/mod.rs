//! Rule-based signal detectors and the fusion stage.
//!
//! Each detector is a pure function of the bars it is given: bar history in,
//! its own named output struct out. Detectors never read each other's output;
//! only [`SignalFusion`] combines them.

pub mod breakout;
pub mod fusion;
pub mod ma_crossover;
pub mod opening_range;

pub use breakout::{BreakoutDetector, BreakoutSignals};
pub use fusion::{SignalFusion, SynergySignals};
pub use ma_crossover::{MaCrossoverDetector, MaCrossoverSignals};
pub use opening_range::{OpeningRangeDetector, OpeningRangeSignals};

use crate::domain::Bar;

/// Trait for signal detectors.
///
/// `detect` must return vectors the same length as `bars`, aligned by index.
/// The bars are expected in ascending timestamp order, which
/// [`BarSeries`](crate::domain::BarSeries) guarantees.
pub trait Detector: Send + Sync {
    type Output;

    fn name(&self) -> &str;

    /// Leading bars that can never carry a signal.
    fn warmup_bars(&self) -> usize;

    fn detect(&self, bars: &[Bar]) -> Self::Output;
}

/// Buy/sell flag columns shared by every detector output.
pub trait DirectionalFlags {
    fn buy(&self) -> &[bool];
    fn sell(&self) -> &[bool];
}

macro_rules! impl_directional_flags {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl DirectionalFlags for $ty {
                fn buy(&self) -> &[bool] {
                    &self.buy
                }

                fn sell(&self) -> &[bool] {
                    &self.sell
                }
            }
        )+
    };
}

impl_directional_flags!(
    BreakoutSignals,
    MaCrossoverSignals,
    OpeningRangeSignals,
    SynergySignals,
);
