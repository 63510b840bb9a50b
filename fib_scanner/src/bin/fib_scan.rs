use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fib_scanner::{
    config::{ScanConfig, load_config_path},
    engine::scan,
    report::{render_table, signal_rows, write_csv, write_json},
};
use market_data::{
    models::{timeframe::Timeframe, universe::UniverseMeta},
    providers::{BarSource, csv_dir::CsvDirSource},
};
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser)]
#[command(version, about = "Fibonacci retracement scanner")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Scan a directory of per-ticker CSV files.
    Scan(ScanCmd),
    /// Print the effective configuration as TOML.
    Defaults {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ScanCmd {
    /// Directory holding `<TICKER>.csv` files.
    #[arg(long, value_name = "DIR")]
    data_dir: PathBuf,
    /// weekly, daily or hourly (1W / 1D / 1h also work).
    #[arg(long)]
    timeframe: Timeframe,
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// `Ticker,Name,Sector` CSV used for display names and as the ticker list.
    #[arg(long, value_name = "FILE")]
    universe: Option<PathBuf>,
    /// Explicit tickers; overrides the universe file and the directory listing.
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,
    /// Include INVALID signals.
    #[arg(long)]
    all: bool,
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
    /// Write to FILE instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ScanConfig> {
    match path {
        Some(path) => load_config_path(path),
        None => Ok(ScanConfig::default()),
    }
}

fn run_scan(cmd: ScanCmd) -> Result<()> {
    let config = load_config(cmd.config.as_ref())?;
    let params = config.params_for(cmd.timeframe);

    let meta = match &cmd.universe {
        Some(path) => UniverseMeta::from_csv_path(path)
            .with_context(|| format!("read universe file {}", path.display()))?,
        None => UniverseMeta::default(),
    };

    let source = CsvDirSource::new(&cmd.data_dir, cmd.timeframe);
    let tickers = if !cmd.tickers.is_empty() {
        cmd.tickers.clone()
    } else if !meta.tickers.is_empty() {
        meta.tickers.keys().cloned().collect()
    } else {
        source
            .tickers()
            .with_context(|| format!("list tickers in {}", source.dir().display()))?
    };

    let (universe, failed) = source.load_universe(&tickers);
    let report = scan(&universe, cmd.timeframe, params).context("invalid scan parameters")?;

    for skipped in &report.skipped {
        info!(ticker = %skipped.ticker, reason = %skipped.reason, "no signal");
    }
    if !failed.is_empty() {
        warn!(count = failed.len(), "some tickers could not be loaded");
    }

    let rows = signal_rows(&report, &meta, cmd.all);
    let mut out: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    match cmd.format {
        Format::Table => writeln!(out, "{}", render_table(&rows))?,
        Format::Csv => write_csv(&rows, &mut out)?,
        Format::Json => {
            write_json(&rows, &mut out)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    info!(
        timeframe = %cmd.timeframe,
        scanned = report.scanned(),
        valid = report.valid_count(),
        written = rows.len(),
        "done"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.cmd {
        Cmd::Scan(cmd) => run_scan(cmd)?,
        Cmd::Defaults { config } => {
            let config = load_config(config.as_ref())?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
