//! Pipeline: breakout → MA crossover → opening range → fusion.
//!
//! The stages run in a fixed order over one series. No detector reads another
//! detector's output; only fusion combines them. The auxiliary average is
//! computed alongside for display and never feeds a detector.

use std::convert::Infallible;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::annotated::{AnnotatedSeries, Overlays};
use crate::detectors::{
    BreakoutDetector, Detector, MaCrossoverDetector, OpeningRangeDetector, SignalFusion,
};
use crate::domain::{BarSeries, SignalRow};
use crate::indicators::{Indicator, Sma};
use crate::params::{ConfigError, SignalParams};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("invalid signal parameters: {0}")]
    Config(#[from] ConfigError),

    #[error("run superseded by a newer request")]
    Superseded,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Breakout,
    MaCrossover,
    OpeningRange,
    Fusion,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Breakout,
        Stage::MaCrossover,
        Stage::OpeningRange,
        Stage::Fusion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Breakout => "breakout",
            Stage::MaCrossover => "ma_crossover",
            Stage::OpeningRange => "opening_range",
            Stage::Fusion => "fusion",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated set of detectors, reusable across series.
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: SignalParams,
    breakout: BreakoutDetector,
    ma_crossover: MaCrossoverDetector,
    opening_range: OpeningRangeDetector,
    aux_ma: Sma,
    fusion: SignalFusion,
}

impl Pipeline {
    /// Validate `params` and build the detectors. Nothing is computed yet.
    pub fn new(params: SignalParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            breakout: BreakoutDetector::new(params.breakout_lookback)?,
            ma_crossover: MaCrossoverDetector::new(params.ma_short_window, params.ma_long_window)?,
            opening_range: OpeningRangeDetector::new(params.opening_range_minutes)?,
            aux_ma: Sma::new(params.aux_ma_window),
            fusion: SignalFusion::new(),
        })
    }

    pub fn params(&self) -> &SignalParams {
        &self.params
    }

    /// Annotate `series`. An empty series yields an empty result.
    pub fn run(&self, series: &BarSeries) -> AnnotatedSeries {
        match self.execute(series, |_| Ok::<(), Infallible>(())) {
            Ok(annotated) => annotated,
            Err(never) => match never {},
        }
    }

    /// Like [`Pipeline::run`], but polls `superseded` before every stage and
    /// abandons the run, with no partial result, once it returns true.
    pub fn run_until(
        &self,
        series: &BarSeries,
        superseded: impl Fn() -> bool,
    ) -> Result<AnnotatedSeries, PipelineError> {
        self.execute(series, |stage| {
            if superseded() {
                debug!(symbol = series.symbol(), %stage, "run superseded");
                return Err(PipelineError::Superseded);
            }
            Ok(())
        })
    }

    fn execute<E>(
        &self,
        series: &BarSeries,
        mut checkpoint: impl FnMut(Stage) -> Result<(), E>,
    ) -> Result<AnnotatedSeries, E> {
        let bars = series.bars();
        let n = bars.len();

        checkpoint(Stage::Breakout)?;
        let breakout = self.breakout.detect(bars);
        debug!(
            symbol = series.symbol(),
            bars = n,
            buys = count(&breakout.buy),
            sells = count(&breakout.sell),
            "breakout stage done"
        );

        checkpoint(Stage::MaCrossover)?;
        let ma = self.ma_crossover.detect(bars);
        let ma_aux = self.aux_ma.compute(bars);
        debug!(
            symbol = series.symbol(),
            buys = count(&ma.buy),
            sells = count(&ma.sell),
            "ma crossover stage done"
        );

        checkpoint(Stage::OpeningRange)?;
        let opening_range = self.opening_range.detect(bars);
        debug!(
            symbol = series.symbol(),
            buys = count(&opening_range.buy),
            sells = count(&opening_range.sell),
            "opening range stage done"
        );

        checkpoint(Stage::Fusion)?;
        let synergy = self
            .fusion
            .fuse(n, Some(&breakout), Some(&ma), Some(&opening_range));

        let signals: Vec<SignalRow> = (0..n)
            .map(|i| SignalRow {
                breakout_buy: breakout.buy[i],
                breakout_sell: breakout.sell[i],
                ma_buy: ma.buy[i],
                ma_sell: ma.sell[i],
                or_buy: opening_range.buy[i],
                or_sell: opening_range.sell[i],
                synergy_buy: synergy.buy[i],
                synergy_sell: synergy.sell[i],
            })
            .collect();
        debug!(
            symbol = series.symbol(),
            buys = count(&synergy.buy),
            sells = count(&synergy.sell),
            "fusion stage done"
        );

        let overlays = Overlays {
            breakout_high: breakout.highest,
            breakout_low: breakout.lowest,
            ma_short: ma.ma_short,
            ma_long: ma.ma_long,
            ma_aux,
            or_high: opening_range.or_high,
            or_low: opening_range.or_low,
        };

        Ok(AnnotatedSeries::new(
            series.clone(),
            self.params,
            signals,
            overlays,
        ))
    }
}

fn count(flags: &[bool]) -> usize {
    flags.iter().filter(|&&f| f).count()
}
