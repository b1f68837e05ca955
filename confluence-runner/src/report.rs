//! Plain-text run summary.
//!
//! Header block (symbol, bars, period, data source, hashes), per-column signal
//! counts, then the last N rows of `close` and the eight flags.

use std::fmt::Write as _;

use confluence_core::{AnnotatedSeries, SignalRow};

use crate::runner::SignalReport;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render the summary written to `summary.txt` and printed by `confluence run`.
pub fn generate_summary(report: &SignalReport, tail_rows: usize) -> String {
    let mut out = String::with_capacity(2048);

    let _ = writeln!(out, "Symbol:        {}", report.symbol);
    let _ = writeln!(out, "Interval:      {}", report.interval);
    let _ = writeln!(
        out,
        "Bars:          {} ({} trading days)",
        report.bar_count, report.trading_days
    );
    match (report.first_timestamp, report.last_timestamp) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                out,
                "Period:        {} to {}",
                first.format(TIMESTAMP_FORMAT),
                last.format(TIMESTAMP_FORMAT)
            );
        }
        _ => {
            let _ = writeln!(out, "Period:        (no bars)");
        }
    }
    if report.synthetic {
        let _ = writeln!(out, "Data:          SYNTHETIC");
    }
    let _ = writeln!(out, "Dataset hash:  {}", report.dataset_hash.short());
    let _ = writeln!(out, "Result hash:   {}", report.result_hash.short());
    out.push('\n');

    out.push_str("Signal counts:\n");
    for (name, count) in SignalRow::COLUMNS.iter().zip(report.counts.values()) {
        let _ = writeln!(out, "  {name:<14} {count:>6}");
    }
    out.push('\n');

    let shown = tail_rows.min(report.annotated.len());
    let _ = writeln!(out, "Last {shown} rows:");
    out.push_str(&format_tail(&report.annotated, tail_rows));
    out
}

/// Table of the last `n` rows: timestamp, close and the eight flags as 0/1.
pub fn format_tail(annotated: &AnnotatedSeries, n: usize) -> String {
    let mut out = String::new();

    let _ = write!(out, "{:<16} {:>12}", "timestamp", "close");
    for name in SignalRow::COLUMNS {
        let _ = write!(out, " {name:>13}");
    }
    out.push('\n');

    for row in annotated.tail(n) {
        let _ = write!(
            out,
            "{:<16} {:>12.4}",
            row.bar.timestamp.format(TIMESTAMP_FORMAT),
            row.bar.close
        );
        for flag in row.signals.flags() {
            let _ = write!(out, " {:>13}", u8::from(flag));
        }
        out.push('\n');
    }
    out
}
