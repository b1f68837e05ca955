//! End-to-end tests: TOML file → CSV bars → pipeline → artifacts.

use std::fs;
use std::path::Path;

use confluence_runner::export::load_manifest;
use confluence_runner::{
    run_batch, run_signals, save_artifacts, ConfigError, LoadError, RunConfig, RunError,
};

/// Three 5-minute sessions. Day 2 breaks above its opening range at 10:30.
fn write_intraday_csv(path: &Path) {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for day in 2..=4 {
        for slot in 0..12 {
            let minutes = 30 + slot * 5;
            let (hour, minute) = (9 + minutes / 60, minutes % 60);
            let close = if day == 3 && slot == 11 {
                106.0
            } else {
                100.0 + (slot % 3) as f64 * 0.5
            };
            let open = 100.0_f64;
            let high = open.max(close) + 0.25;
            let low = open.min(close) - 0.25;
            csv.push_str(&format!(
                "2024-01-0{day} {hour:02}:{minute:02}:00,{open},{high},{low},{close},1000\n"
            ));
        }
    }
    fs::write(path, csv).unwrap();
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("run.toml");
    let toml = format!(
        "[data]\nsymbol = \"TEST\"\ninterval = \"5m\"\ncsv = \"bars.csv\"\n{extra}\n\
         [signals]\nbreakout_lookback = 5\nma_short_window = 2\nma_long_window = 4\n\
         opening_range_minutes = 30\naux_ma_window = 6\n\n\
         [output]\ndir = \"out\"\ntail_rows = 3\n"
    );
    fs::write(&path, toml).unwrap();
    path
}

#[test]
fn csv_run_produces_opening_range_breakout_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_intraday_csv(&dir.path().join("bars.csv"));
    let config = RunConfig::from_file(&write_config(dir.path(), "")).unwrap();

    let report = run_signals(&config).unwrap();
    assert!(!report.synthetic);
    assert_eq!(report.bar_count, 36);
    assert_eq!(report.trading_days, 3);

    // Day 2 (Jan 3) starts at index 12; its last bar closes at 106 > opening high.
    let signals = report.annotated.signals();
    assert!(signals[23].or_buy);
    assert!(signals[23].synergy_buy);
    assert_eq!(signals.iter().filter(|s| s.or_buy).count(), 1);

    let out_dir = dir.path().join("out");
    let run_dir = save_artifacts(&report, &out_dir, config.output.tail_rows).unwrap();
    let manifest = load_manifest(&run_dir).unwrap();
    assert_eq!(manifest.symbol, "TEST");
    assert_eq!(manifest.counts, report.counts);

    let summary = fs::read_to_string(run_dir.join("summary.txt")).unwrap();
    assert!(summary.contains("Last 3 rows:"));
    assert!(!summary.contains("SYNTHETIC"));
}

#[test]
fn date_range_filters_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_intraday_csv(&dir.path().join("bars.csv"));
    let config = RunConfig::from_file(&write_config(
        dir.path(),
        "start_date = \"2024-01-03\"\nend_date = \"2024-01-03\"",
    ))
    .unwrap();

    let report = run_signals(&config).unwrap();
    assert_eq!(report.bar_count, 12);
    assert_eq!(report.trading_days, 1);
}

#[test]
fn empty_date_range_is_no_bars_error() {
    let dir = tempfile::tempdir().unwrap();
    write_intraday_csv(&dir.path().join("bars.csv"));
    let config = RunConfig::from_file(&write_config(
        dir.path(),
        "start_date = \"2025-01-01\"",
    ))
    .unwrap();

    let err = run_signals(&config).unwrap_err();
    assert!(matches!(err, RunError::Data(LoadError::NoBars { .. })));
}

#[test]
fn batch_keeps_failures_local() {
    let dir = tempfile::tempdir().unwrap();
    write_intraday_csv(&dir.path().join("bars.csv"));
    let good = RunConfig::from_file(&write_config(dir.path(), "")).unwrap();

    let mut missing = good.clone();
    missing.data.csv = Some(dir.path().join("missing.csv"));

    let mut bad_params = good.clone();
    bad_params.signals.breakout_lookback = 0;

    let results = run_batch(&[good, missing, bad_params]);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(RunError::Data(LoadError::Io { .. }))));
    assert!(matches!(
        results[2],
        Err(RunError::Config(ConfigError::Signals(_)))
    ));
}
