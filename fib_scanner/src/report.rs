//! Presentation and export of scan results.
//!
//! The engine's [`Signal`] keeps one internal naming scheme; this module maps
//! it to display rows ("Current Price", "Retrace Low", ...) enriched with the
//! ticker's display name and sector, and writes them as an aligned text table, CSV or
//! JSON.

use std::io::Write;

use chrono::{NaiveDateTime, NaiveTime};
use market_data::models::{timeframe::Timeframe, universe::UniverseMeta};
use serde::Serialize;

use crate::{
    engine::{ScanReport, Signal},
    policy::{PolicyMetric, Verdict},
};

/// One display row per signal. Serialized field names are the column headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    /// Ticker symbol.
    #[serde(rename = "Ticker")]
    pub ticker: String,
    /// Display name, `"Unknown"` without metadata.
    #[serde(rename = "Stock Name")]
    pub name: String,
    /// Sector from the universe file, empty when unknown.
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    /// Scanned timeframe.
    #[serde(rename = "Timeframe")]
    pub timeframe: Timeframe,
    /// VALID / INVALID.
    #[serde(rename = "Signal")]
    pub verdict: Verdict,
    /// Latest close.
    #[serde(rename = "Current Price")]
    pub current_price: f64,
    /// Timestamp of the latest bar.
    #[serde(rename = "Latest Date")]
    pub latest_date: String,
    /// Swing high price.
    #[serde(rename = "Swing High")]
    pub swing_high: f64,
    /// When the swing high printed.
    #[serde(rename = "Swing High Date")]
    pub swing_high_date: String,
    /// Swing low price.
    #[serde(rename = "Swing Low")]
    pub swing_low: f64,
    /// When the swing low printed.
    #[serde(rename = "Swing Low Date")]
    pub swing_low_date: String,
    /// 61.8% retracement level.
    #[serde(rename = "Fib618")]
    pub fib618: f64,
    /// 78.6% retracement level.
    #[serde(rename = "Fib786")]
    pub fib786: f64,
    /// Lowest low after the swing high.
    #[serde(rename = "Retrace Low")]
    pub retrace_low: f64,
    /// When the retracement low printed.
    #[serde(rename = "Retrace Date")]
    pub retrace_date: String,
    /// Whether the retracement low is inside the zone.
    #[serde(rename = "In Zone")]
    pub in_zone: bool,
    /// Which policy metric backs the verdict.
    #[serde(rename = "Metric")]
    pub metric_kind: &'static str,
    /// The metric's value.
    #[serde(rename = "Metric Value")]
    pub metric_value: f64,
    #[serde(skip)]
    metric: PolicyMetric,
}

impl SignalRow {
    /// Build the display row for `signal`.
    pub fn new(signal: &Signal, meta: &UniverseMeta) -> Self {
        Self {
            ticker: signal.ticker.clone(),
            name: meta.name_of(&signal.ticker).to_owned(),
            sector: meta.get(&signal.ticker).and_then(|i| i.sector.clone()),
            timeframe: signal.timeframe,
            verdict: signal.verdict,
            current_price: signal.latest.price,
            latest_date: format_timestamp(signal.latest.timestamp),
            swing_high: signal.swing.high_price,
            swing_high_date: format_timestamp(signal.swing.high_timestamp),
            swing_low: signal.swing.low_price,
            swing_low_date: format_timestamp(signal.swing.low_timestamp),
            fib618: signal.zone.fib618,
            fib786: signal.zone.fib786,
            retrace_low: signal.retracement_low.price,
            retrace_date: format_timestamp(signal.retracement_low.timestamp),
            in_zone: signal.in_zone,
            metric_kind: signal.metric.label(),
            metric_value: signal.metric.value(),
            metric: signal.metric,
        }
    }
}

/// Rows for `report`; INVALID signals are dropped unless `include_invalid`.
pub fn signal_rows(report: &ScanReport, meta: &UniverseMeta, include_invalid: bool) -> Vec<SignalRow> {
    report
        .signals
        .iter()
        .filter(|s| include_invalid || s.verdict.is_valid())
        .map(|s| SignalRow::new(s, meta))
        .collect()
}

/// Date only for midnight stamps, otherwise date and minute.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

type Cell = fn(&SignalRow) -> String;

const TABLE_COLUMNS: [(&str, Align, Cell); 11] = [
    ("Ticker", Align::Left, |r| r.ticker.clone()),
    ("Stock Name", Align::Left, |r| r.name.clone()),
    ("Current Price", Align::Right, |r| format!("{:.2}", r.current_price)),
    ("Swing High", Align::Right, |r| format!("{:.2}", r.swing_high)),
    ("Swing Low", Align::Right, |r| format!("{:.2}", r.swing_low)),
    ("Fib618", Align::Right, |r| format!("{:.2}", r.fib618)),
    ("Fib786", Align::Right, |r| format!("{:.2}", r.fib786)),
    ("Retrace Low", Align::Right, |r| format!("{:.2}", r.retrace_low)),
    ("Retrace Date", Align::Left, |r| r.retrace_date.clone()),
    ("Metric", Align::Right, |r| r.metric.to_string()),
    ("Signal", Align::Left, |r| r.verdict.to_string()),
];

/// Aligned plain-text table, no trailing newline.
pub fn render_table(rows: &[SignalRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| TABLE_COLUMNS.iter().map(|(_, _, cell)| cell(r)).collect())
        .collect();

    let widths: Vec<usize> = TABLE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, (header, _, _))| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .fold(header.len(), usize::max)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&TABLE_COLUMNS)
            .zip(&widths)
            .map(|((v, (_, align, _)), &w)| match align {
                Align::Left => format!("{v:<w$}"),
                Align::Right => format!("{v:>w$}"),
            })
            .collect();
        padded.join("  ").trim_end().to_owned()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(TABLE_COLUMNS.iter().map(|(h, _, _)| *h).collect()));
    lines.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(line(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

/// Write `rows` as CSV with a header line.
pub fn write_csv<W: Write>(rows: &[SignalRow], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `rows` as a pretty-printed JSON array.
pub fn write_json<W: Write>(rows: &[SignalRow], writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, rows)
}
