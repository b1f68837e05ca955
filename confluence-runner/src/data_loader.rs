//! Bar loading for the runner.
//!
//! Bars come from one of two places:
//! 1. A CSV file with a `timestamp,open,high,low,close,volume` header
//! 2. A deterministic synthetic random walk (`synthetic = true`)
//!
//! CSV rows are sorted by timestamp and filtered to the requested date range
//! before the series is validated, so a file written newest-first loads fine
//! but a duplicated timestamp is still an error.
//!
//! Synthetic data is a developer-only mode. It is logged at warn level and
//! tagged on every result built from it.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use confluence_core::fingerprint::{dataset_hash, Fingerprint};
use confluence_core::{Bar, BarSeries, Interval, SeriesError};

use crate::config::{BarSource, ConfigError, DataConfig};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} line {line}: unrecognised timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("invalid bar data for '{symbol}': {source}")]
    Series {
        symbol: String,
        #[source]
        source: SeriesError,
    },

    #[error("no bars for '{symbol}' in the requested date range")]
    NoBars { symbol: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Inclusive calendar-date filter. `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// A loaded series with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: BarSeries,
    /// BLAKE3 over the series contents.
    pub dataset_hash: Fingerprint,
    pub synthetic: bool,
}

/// Column names accept the lower-case schema and the capitalised headers
/// written by common market-data exporters.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Datetime", alias = "datetime", alias = "Date", alias = "date")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a bar timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]` (space or `T`), a plain `YYYY-MM-DD` (midnight),
/// and either of those with a UTC offset, in which case the wall-clock time
/// at that offset is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(ts.naive_local());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Read bars from CSV, in file order. `origin` is only used in error messages.
pub fn read_bars_csv<R: io::Read>(reader: R, origin: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let csv_error = |source| LoadError::Csv {
        path: origin.to_path_buf(),
        source,
    };
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let mut bars = Vec::new();
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record).map_err(csv_error)? {
        let row: CsvRow = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            path: origin.to_path_buf(),
            // Where the record starts; quoted fields may span several lines.
            line: record.position().map_or(0, |pos| pos.line()),
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

/// Sort, filter to `range` and validate.
fn build_series(
    symbol: &str,
    interval: Interval,
    mut bars: Vec<Bar>,
    range: DateRange,
) -> Result<BarSeries, LoadError> {
    bars.retain(|bar| range.contains(bar.date()));
    if bars.is_empty() {
        return Err(LoadError::NoBars {
            symbol: symbol.to_string(),
        });
    }
    bars.sort_by_key(|bar| bar.timestamp);
    BarSeries::new(symbol, interval, bars).map_err(|source| LoadError::Series {
        symbol: symbol.to_string(),
        source,
    })
}

/// Load one symbol's bars from a CSV file.
pub fn load_csv(
    path: &Path,
    symbol: &str,
    interval: Interval,
    range: DateRange,
) -> Result<BarSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars_csv(io::BufReader::new(file), path)?;
    let total = bars.len();
    let series = build_series(symbol, interval, bars, range)?;
    info!(
        symbol,
        path = %path.display(),
        rows = total,
        bars = series.len(),
        "loaded bars from csv"
    );
    Ok(series)
}

/// Bar open times for one trading day.
///
/// Daily bars sit at midnight; intraday bars cover the 09:30-16:00 session.
fn session_times(date: NaiveDate, interval: Interval) -> Vec<NaiveDateTime> {
    if !interval.is_intraday() {
        return vec![date.and_time(NaiveTime::MIN)];
    }
    let open = date.and_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN));
    let close = open + Duration::minutes(390);
    let step = Duration::minutes(i64::from(interval.minutes()));
    let mut times = Vec::new();
    let mut t = open;
    while t < close {
        times.push(t);
        t += step;
    }
    times
}

/// Generate synthetic bars for testing and development.
///
/// A random walk from 100.0, seeded from the symbol and interval, so the
/// same request always yields the same bars. Weekends are skipped.
pub fn generate_synthetic_bars(
    symbol: &str,
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(format!("{symbol}:{interval}").as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    // Per-bar move scaled so a full session spans roughly ±3%.
    let max_move = if interval.is_intraday() {
        0.03 * (f64::from(interval.minutes()) / 390.0).sqrt()
    } else {
        0.03
    };

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        for timestamp in session_times(current, interval) {
            let ret: f64 = rng.gen_range(-max_move..max_move);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..max_move / 3.0));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..max_move / 3.0));
            let volume = rng.gen_range(1_000..100_000u64) as f64;

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }

        current += Duration::days(1);
    }

    bars
}

/// Synthetic bars as a validated series.
pub fn synthetic_series(
    symbol: &str,
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BarSeries, LoadError> {
    let bars = generate_synthetic_bars(symbol, interval, start, end);
    build_series(symbol, interval, bars, DateRange::default())
}

/// Load the series a `[data]` section describes.
pub fn load_series(data: &DataConfig) -> Result<LoadedSeries, LoadError> {
    let range = DateRange::new(data.start_date, data.end_date);
    let (series, synthetic) = match data.source()? {
        BarSource::Csv(path) => (load_csv(&path, &data.symbol, data.interval, range)?, false),
        BarSource::Synthetic => {
            let (Some(start), Some(end)) = (data.start_date, data.end_date) else {
                return Err(ConfigError::SyntheticNeedsDates.into());
            };
            warn!(
                symbol = %data.symbol,
                interval = %data.interval,
                "using SYNTHETIC bars; results are not market data"
            );
            (synthetic_series(&data.symbol, data.interval, start, end)?, true)
        }
    };

    Ok(LoadedSeries {
        dataset_hash: dataset_hash(&series),
        series,
        synthetic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_timestamp_formats() {
        let expected = date(2024, 1, 2).and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 09:30"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-01-02 09:30:00-05:00 "), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-02"),
            Some(date(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("01/02/2024"), None);
    }

    #[test]
    fn reads_lowercase_and_capitalised_headers() {
        let lower = "timestamp,open,high,low,close,volume\n2024-01-02,10,11,9,10.5,100\n";
        let upper = "Date,Open,High,Low,Close,Volume\n2024-01-02,10,11,9,10.5,100\n";
        let a = read_bars_csv(lower.as_bytes(), Path::new("a.csv")).unwrap();
        let b = read_bars_csv(upper.as_bytes(), Path::new("b.csv")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].close, 10.5);
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   2024-01-02,10,11,9,10,1\n\
                   yesterday,10,11,9,10,1\n";
        match read_bars_csv(csv.as_bytes(), Path::new("bars.csv")) {
            Err(LoadError::Timestamp { line, value, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_price_is_csv_error() {
        let csv = "timestamp,open,high,low,close,volume\n2024-01-02,ten,11,9,10,1\n";
        assert!(matches!(
            read_bars_csv(csv.as_bytes(), Path::new("bars.csv")),
            Err(LoadError::Csv { .. })
        ));
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::new(Some(date(2024, 1, 2)), Some(date(2024, 1, 3)));
        assert!(range.contains(date(2024, 1, 2)));
        assert!(range.contains(date(2024, 1, 3)));
        assert!(!range.contains(date(2024, 1, 4)));
        assert!(DateRange::default().contains(date(1990, 1, 1)));
    }

    #[test]
    fn synthetic_is_deterministic() {
        let (start, end) = (date(2024, 1, 1), date(2024, 3, 1));
        let a = generate_synthetic_bars("SPY", Interval::OneDay, start, end);
        let b = generate_synthetic_bars("SPY", Interval::OneDay, start, end);
        assert_eq!(a, b);
        let c = generate_synthetic_bars("QQQ", Interval::OneDay, start, end);
        assert_ne!(a, c);
    }

    #[test]
    fn synthetic_skips_weekends() {
        // 2024-01-06 and 2024-01-07 are Saturday and Sunday.
        let bars =
            generate_synthetic_bars("SPY", Interval::OneDay, date(2024, 1, 5), date(2024, 1, 8));
        let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date()).collect();
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 8)]);
    }

    #[test]
    fn synthetic_intraday_covers_the_session() {
        let bars = generate_synthetic_bars(
            "SPY",
            Interval::FiveMinutes,
            date(2024, 1, 2),
            date(2024, 1, 2),
        );
        assert_eq!(bars.len(), 78);
        assert_eq!(bars[0].timestamp.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(bars[77].timestamp.time(), NaiveTime::from_hms_opt(15, 55, 0).unwrap());

        let hourly =
            generate_synthetic_bars("SPY", Interval::OneHour, date(2024, 1, 2), date(2024, 1, 2));
        assert_eq!(hourly.len(), 7);
    }

    #[test]
    fn synthetic_bars_pass_validation() {
        let series =
            synthetic_series("SPY", Interval::FifteenMinutes, date(2024, 1, 1), date(2024, 1, 31))
                .unwrap();
        assert!(series.bars().iter().all(|b| b.is_sane()));
        assert_eq!(series.trading_days(), 23);
    }
}
