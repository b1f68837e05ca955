//! The pipeline's result: the input series plus one signal row per bar.

use serde::Serialize;

use crate::domain::{Bar, BarSeries, SignalCounts, SignalMarker, SignalRow, SignalSide};
use crate::fingerprint::{run_hash, Fingerprint};
use crate::params::SignalParams;

/// Numeric series aligned with the bars, for charting.
///
/// `NaN` marks an undefined value (warmup, or a day with no opening range).
/// JSON output writes those as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overlays {
    pub breakout_high: Vec<f64>,
    pub breakout_low: Vec<f64>,
    pub ma_short: Vec<f64>,
    pub ma_long: Vec<f64>,
    pub ma_aux: Vec<f64>,
    pub or_high: Vec<f64>,
    pub or_low: Vec<f64>,
}

impl Overlays {
    /// Column names in the order [`Overlays::values_at`] returns them.
    pub const COLUMNS: [&'static str; 7] = [
        "breakout_high",
        "breakout_low",
        "ma_short",
        "ma_long",
        "ma_aux",
        "or_high",
        "or_low",
    ];

    /// Every overlay value at bar `index` (NaN when out of range).
    pub fn values_at(&self, index: usize) -> [f64; 7] {
        let at = |column: &[f64]| column.get(index).copied().unwrap_or(f64::NAN);
        [
            at(&self.breakout_high),
            at(&self.breakout_low),
            at(&self.ma_short),
            at(&self.ma_long),
            at(&self.ma_aux),
            at(&self.or_high),
            at(&self.or_low),
        ]
    }
}

/// One bar with its flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedRow<'a> {
    pub index: usize,
    pub bar: &'a Bar,
    pub signals: SignalRow,
}

/// A bar series annotated with signal flags and overlays.
///
/// `signals[i]` and every overlay value at `i` belong to `bars[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSeries {
    series: BarSeries,
    params: SignalParams,
    signals: Vec<SignalRow>,
    overlays: Overlays,
}

impl AnnotatedSeries {
    pub(crate) fn new(
        series: BarSeries,
        params: SignalParams,
        signals: Vec<SignalRow>,
        overlays: Overlays,
    ) -> Self {
        debug_assert_eq!(series.len(), signals.len());
        Self {
            series,
            params,
            signals,
            overlays,
        }
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn params(&self) -> &SignalParams {
        &self.params
    }

    pub fn signals(&self) -> &[SignalRow] {
        &self.signals
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn rows(
        &self,
    ) -> impl DoubleEndedIterator<Item = AnnotatedRow<'_>> + ExactSizeIterator + '_ {
        self.series
            .bars()
            .iter()
            .zip(&self.signals)
            .enumerate()
            .map(|(index, (bar, &signals))| AnnotatedRow {
                index,
                bar,
                signals,
            })
    }

    /// The last `n` rows (fewer if the series is shorter).
    pub fn tail(
        &self,
        n: usize,
    ) -> impl DoubleEndedIterator<Item = AnnotatedRow<'_>> + ExactSizeIterator + '_ {
        self.rows().skip(self.len().saturating_sub(n))
    }

    /// Chart markers at the close of every bar with a fused signal.
    ///
    /// A bar with both a fused buy and a fused sell yields two markers, buy first.
    pub fn markers(&self) -> Vec<SignalMarker> {
        let mut markers = Vec::new();
        for row in self.rows() {
            for (set, side) in [
                (row.signals.synergy_buy, SignalSide::Buy),
                (row.signals.synergy_sell, SignalSide::Sell),
            ] {
                if set {
                    markers.push(SignalMarker {
                        index: row.index,
                        timestamp: row.bar.timestamp,
                        price: row.bar.close,
                        side,
                    });
                }
            }
        }
        markers
    }

    pub fn counts(&self) -> SignalCounts {
        SignalCounts::from_rows(&self.signals)
    }

    /// BLAKE3 over bars, parameters and flags.
    pub fn fingerprint(&self) -> Fingerprint {
        run_hash(&self.series, &self.params, &self.signals)
    }
}
