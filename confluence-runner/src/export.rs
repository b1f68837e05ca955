//! Artifact export: annotated CSV, schema-versioned JSON and the text summary.
//!
//! All persisted JSON carries a `schema_version`. Newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;

use confluence_core::fingerprint::Fingerprint;
use confluence_core::{AnnotatedSeries, BarSeries, Interval, Overlays, SignalCounts, SignalRow};

use crate::report::generate_summary;
use crate::runner::{SignalReport, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn default_schema_version() -> u32 {
    1
}

/// The scalar part of `annotated.json`, read back without the per-bar data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtifactManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub interval: Interval,
    pub bar_count: usize,
    pub trading_days: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub synthetic: bool,
    pub dataset_hash: Fingerprint,
    pub params_hash: Fingerprint,
    pub result_hash: Fingerprint,
    pub counts: SignalCounts,
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a report to pretty JSON. Undefined overlay values become `null`.
pub fn export_json(report: &SignalReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SignalReport to JSON")
}

/// Read the manifest fields of an exported report, rejecting newer schema versions.
pub fn import_manifest(json: &str) -> Result<ArtifactManifest> {
    let manifest: ArtifactManifest =
        serde_json::from_str(json).context("failed to deserialize report manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn format_value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

/// One row per bar: OHLCV, the overlays, then the eight flags.
///
/// Undefined overlay values are written as empty fields.
pub fn export_annotated_csv(annotated: &AnnotatedSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["timestamp", "open", "high", "low", "close", "volume"];
    header.extend(Overlays::COLUMNS);
    header.extend(SignalRow::COLUMNS);
    wtr.write_record(&header)?;

    for row in annotated.rows() {
        let bar = row.bar;
        let mut record = vec![
            bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format_value(bar.open),
            format_value(bar.high),
            format_value(bar.low),
            format_value(bar.close),
            format_value(bar.volume),
        ];
        record.extend(annotated.overlays().values_at(row.index).map(format_value));
        record.extend(row.signals.flags().map(|f| f.to_string()));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Bars only, in the format the CSV loader reads.
pub fn export_bars_csv(series: &BarSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for bar in series.bars() {
        wtr.write_record([
            bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format_value(bar.open),
            format_value(bar.high),
            format_value(bar.low),
            format_value(bar.close),
            format!("{:.0}", bar.volume),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a report: `{symbol}_{interval}_{short result hash}`.
pub fn artifact_dir_name(report: &SignalReport) -> String {
    format!(
        "{}_{}_{}",
        report.symbol,
        report.interval,
        report.result_hash.short()
    )
}

/// Save the full artifact set for one run.
///
/// Creates `{output_dir}/{symbol}_{interval}_{hash}/` containing:
/// - `annotated.json`: the full report
/// - `annotated.csv`: bars, overlays and flags
/// - `summary.txt`: the text summary with the last `tail_rows` rows
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &SignalReport, output_dir: &Path, tail_rows: usize) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(report));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    write_file(&run_dir.join("annotated.json"), &json)?;

    let csv = export_annotated_csv(&report.annotated)?;
    write_file(&run_dir.join("annotated.csv"), &csv)?;

    let summary = generate_summary(report, tail_rows);
    write_file(&run_dir.join("summary.txt"), &summary)?;

    Ok(run_dir)
}

/// Load the manifest from an artifact directory's `annotated.json`.
pub fn load_manifest(dir: &Path) -> Result<ArtifactManifest> {
    let path = dir.join("annotated.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_manifest(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
