//! Confluence CLI: compute fused trading signals over a bar series.
//!
//! Commands:
//! - `run`: load bars (CSV or synthetic), run the pipeline, print the summary
//!   and save artifacts
//! - `synth`: write a deterministic synthetic bar CSV
//! - `validate`: check a config file and its bar data without computing signals

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use confluence_core::Interval;
use confluence_runner::export::export_bars_csv;
use confluence_runner::{
    generate_summary, load_series, run_signals, save_artifacts, synthetic_series, DataConfig,
    RunConfig,
};

#[derive(Parser)]
#[command(
    name = "confluence",
    version,
    about = "Confluence: breakout, MA crossover and opening-range signals, fused"
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute signals and save the artifact bundle.
    Run(RunArgs),
    /// Write synthetic bars as CSV.
    Synth {
        /// Symbol; also seeds the random walk.
        #[arg(long)]
        symbol: String,

        /// Bar interval (1m, 5m, 15m, 30m, 1h, 1d).
        #[arg(long, default_value = "5m")]
        interval: Interval,

        /// First date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// Last date, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        /// Output file.
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Check a config file and load its bars without computing signals.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

/// Flags for `run`. Every flag overrides the matching config file value.
#[derive(Args, Debug)]
struct RunArgs {
    /// Path to a TOML config file. Without it, --symbol and a bar source are required.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    symbol: Option<String>,

    /// Read bars from this CSV file.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Generate synthetic bars (needs --start and --end).
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    #[arg(long)]
    interval: Option<Interval>,

    /// First date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long)]
    breakout_lookback: Option<usize>,

    #[arg(long)]
    ma_short: Option<usize>,

    #[arg(long)]
    ma_long: Option<usize>,

    /// Opening window length in minutes.
    #[arg(long)]
    opening_range_minutes: Option<u32>,

    /// Display-only moving average window.
    #[arg(long)]
    aux_ma: Option<usize>,

    /// Artifact root directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Rows shown in the summary.
    #[arg(long)]
    tail: Option<usize>,

    /// Print the summary only; write no artifacts.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

impl RunArgs {
    /// Merge the flags over the config file, or build a config from flags alone.
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                let Some(symbol) = &self.symbol else {
                    bail!("--symbol is required without --config");
                };
                RunConfig {
                    data: DataConfig {
                        symbol: symbol.clone(),
                        interval: Interval::OneDay,
                        csv: None,
                        synthetic: false,
                        start_date: None,
                        end_date: None,
                    },
                    signals: Default::default(),
                    output: Default::default(),
                }
            }
        };

        let data = &mut config.data;
        if let Some(symbol) = &self.symbol {
            data.symbol = symbol.clone();
        }
        if let Some(csv) = &self.csv {
            data.csv = Some(csv.clone());
            data.synthetic = false;
        }
        if self.synthetic {
            data.synthetic = true;
            data.csv = None;
        }
        if let Some(interval) = self.interval {
            data.interval = interval;
        }
        if let Some(start) = self.start {
            data.start_date = Some(start);
        }
        if let Some(end) = self.end {
            data.end_date = Some(end);
        }

        let signals = &mut config.signals;
        if let Some(n) = self.breakout_lookback {
            signals.breakout_lookback = n;
        }
        if let Some(s) = self.ma_short {
            signals.ma_short_window = s;
        }
        if let Some(l) = self.ma_long {
            signals.ma_long_window = l;
        }
        if let Some(m) = self.opening_range_minutes {
            signals.opening_range_minutes = m;
        }
        if let Some(aux) = self.aux_ma {
            signals.aux_ma_window = aux;
        }

        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(tail) = self.tail {
            config.output.tail_rows = tail;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Run(args) => run_cmd(&args),
        Commands::Synth {
            symbol,
            interval,
            start,
            end,
            output,
        } => synth_cmd(&symbol, interval, start, end, &output),
        Commands::Validate { config } => validate_cmd(&config),
    }
}

fn run_cmd(args: &RunArgs) -> Result<()> {
    let config = args.resolve()?;
    let report = run_signals(&config)?;

    print!("{}", generate_summary(&report, config.output.tail_rows));

    if !args.no_save {
        let run_dir = save_artifacts(&report, &config.output.dir, config.output.tail_rows)?;
        println!("\nArtifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn synth_cmd(
    symbol: &str,
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
) -> Result<()> {
    if end < start {
        bail!("--end {end} is before --start {start}");
    }
    let series = synthetic_series(symbol, interval, start, end)?;
    let csv = export_bars_csv(&series)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, csv).with_context(|| format!("failed to write {}", output.display()))?;

    info!(symbol, %interval, bars = series.len(), path = %output.display(), "wrote synthetic bars");
    println!("Wrote {} SYNTHETIC bars to {}", series.len(), output.display());
    Ok(())
}

fn validate_cmd(path: &Path) -> Result<()> {
    let config = RunConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    let loaded = load_series(&config.data)?;
    let series = &loaded.series;

    println!("Config OK: {}", path.display());
    println!(
        "  {} {}: {} bars over {} trading days{}",
        series.symbol(),
        series.interval(),
        series.len(),
        series.trading_days(),
        if loaded.synthetic { " (SYNTHETIC)" } else { "" }
    );
    println!("  dataset hash: {}", loaded.dataset_hash.short());
    Ok(())
}
