//! BarSeries: the validated, time-ordered input of the signal pipeline.
//!
//! A `BarSeries` can only be built through [`BarSeries::new`] (serde
//! deserialization goes through the same checks), so every value in
//! circulation has well-formed OHLC bars with strictly ascending timestamps.
//! Detectors index it positionally; no label alignment is ever needed.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::{Bar, BarDefect};
use super::interval::Interval;

/// Data-integrity errors raised when a series is constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("malformed bar at index {index} ({timestamp}): {defect}")]
    MalformedBar {
        index: usize,
        timestamp: NaiveDateTime,
        defect: BarDefect,
    },

    #[error("bar at index {index} ({current}) is not after the previous bar ({previous})")]
    NotAscending {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("duplicate timestamp {timestamp} at index {index}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Ordered bars for one instrument at one sampling interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSeries")]
pub struct BarSeries {
    symbol: String,
    interval: Interval,
    bars: Vec<Bar>,
}

#[derive(Deserialize)]
struct UncheckedSeries {
    symbol: String,
    interval: Interval,
    bars: Vec<Bar>,
}

impl TryFrom<UncheckedSeries> for BarSeries {
    type Error = SeriesError;

    fn try_from(raw: UncheckedSeries) -> Result<Self, Self::Error> {
        BarSeries::new(raw.symbol, raw.interval, raw.bars)
    }
}

impl BarSeries {
    /// Validate and wrap a bar vector.
    ///
    /// Rejects malformed OHLC values and any timestamp that is not strictly
    /// after its predecessor. An empty bar vector is valid.
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(SeriesError::EmptySymbol);
        }

        for (index, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|defect| SeriesError::MalformedBar {
                index,
                timestamp: bar.timestamp,
                defect,
            })?;

            if index > 0 {
                let previous = bars[index - 1].timestamp;
                if bar.timestamp == previous {
                    return Err(SeriesError::DuplicateTimestamp {
                        index,
                        timestamp: bar.timestamp,
                    });
                }
                if bar.timestamp < previous {
                    return Err(SeriesError::NotAscending {
                        index,
                        previous,
                        current: bar.timestamp,
                    });
                }
            }
        }

        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Number of distinct calendar dates covered.
    pub fn trading_days(&self) -> usize {
        let mut days = 0;
        let mut current: Option<NaiveDate> = None;
        for bar in &self.bars {
            if current != Some(bar.date()) {
                current = Some(bar.date());
                days += 1;
            }
        }
        days
    }

    /// The first `len` bars as a new series. Any prefix of a valid series is valid.
    pub fn prefix(&self, len: usize) -> BarSeries {
        BarSeries {
            symbol: self.symbol.clone(),
            interval: self.interval,
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn bar(timestamp: NaiveDateTime, close: f64) -> Bar {
        Bar {
            timestamp,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn accepts_ascending_bars() {
        let series = BarSeries::new(
            "AAPL",
            Interval::FiveMinutes,
            vec![bar(ts(4, 9, 30), 10.0), bar(ts(4, 9, 35), 11.0)],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.first_timestamp(), Some(ts(4, 9, 30)));
        assert_eq!(series.last_timestamp(), Some(ts(4, 9, 35)));
    }

    #[test]
    fn accepts_empty_series() {
        let series = BarSeries::new("AAPL", Interval::OneDay, vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_timestamp(), None);
        assert_eq!(series.trading_days(), 0);
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let err = BarSeries::new(
            "AAPL",
            Interval::FiveMinutes,
            vec![bar(ts(4, 9, 30), 10.0), bar(ts(4, 9, 30), 11.0)],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateTimestamp { index: 1, .. }));
    }

    #[test]
    fn rejects_descending_timestamp() {
        let err = BarSeries::new(
            "AAPL",
            Interval::FiveMinutes,
            vec![bar(ts(4, 9, 35), 10.0), bar(ts(4, 9, 30), 11.0)],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::NotAscending { index: 1, .. }));
    }

    #[test]
    fn rejects_malformed_bar_with_index() {
        let mut bad = bar(ts(4, 9, 35), 10.0);
        bad.high = 5.0;
        let err = BarSeries::new(
            "AAPL",
            Interval::FiveMinutes,
            vec![bar(ts(4, 9, 30), 10.0), bad],
        )
        .unwrap_err();
        match err {
            SeriesError::MalformedBar { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_blank_symbol() {
        let err = BarSeries::new("  ", Interval::OneDay, vec![]).unwrap_err();
        assert_eq!(err, SeriesError::EmptySymbol);
    }

    #[test]
    fn trading_days_counts_date_changes() {
        let series = BarSeries::new(
            "AAPL",
            Interval::OneHour,
            vec![
                bar(ts(4, 9, 0), 10.0),
                bar(ts(4, 10, 0), 10.0),
                bar(ts(5, 9, 0), 10.0),
                bar(ts(6, 9, 0), 10.0),
            ],
        )
        .unwrap();
        assert_eq!(series.trading_days(), 3);
    }

    #[test]
    fn prefix_is_clamped() {
        let series = BarSeries::new(
            "AAPL",
            Interval::FiveMinutes,
            vec![bar(ts(4, 9, 30), 10.0), bar(ts(4, 9, 35), 11.0)],
        )
        .unwrap();
        assert_eq!(series.prefix(1).len(), 1);
        assert_eq!(series.prefix(10).len(), 2);
    }

    #[test]
    fn deserialization_runs_validation() {
        let json = r#"{
            "symbol": "AAPL",
            "interval": "5m",
            "bars": [
                {"timestamp": "2024-03-04T09:35:00", "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.0, "volume": 1.0},
                {"timestamp": "2024-03-04T09:30:00", "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.0, "volume": 1.0}
            ]
        }"#;
        let result: Result<BarSeries, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let series = BarSeries::new(
            "AAPL",
            Interval::FiveMinutes,
            vec![bar(ts(4, 9, 30), 10.0), bar(ts(4, 9, 35), 11.0)],
        )
        .unwrap();
        let json = serde_json::to_string(&series).unwrap();
        let back: BarSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(series, back);
    }
}
