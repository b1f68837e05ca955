//! Domain types: bars, series, intervals and signal annotations.

pub mod bar;
pub mod interval;
pub mod series;
pub mod signal;

pub use bar::{Bar, BarDefect};
pub use interval::{Interval, ParseIntervalError};
pub use series::{BarSeries, SeriesError};
pub use signal::{SignalCounts, SignalMarker, SignalRow, SignalSide};
