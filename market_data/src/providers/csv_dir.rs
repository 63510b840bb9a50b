//! Bars from a directory of per-ticker CSV files (`<dir>/<TICKER>.csv`).
//!
//! The expected layout is the usual downloader export:
//!
//! ```text
//! Date,Open,High,Low,Close,Adj Close,Volume
//! 2024-01-02,187.15,188.44,183.89,185.64,185.40,82488700
//! ```
//!
//! Header matching is case-insensitive and unknown columns are ignored. The
//! timestamp column may be called `Date`, `Datetime` or `Timestamp`. Rows with
//! an empty price cell are dropped; an empty volume counts as zero.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::debug;

use crate::{
    models::{bar::Bar, bar_series::BarSeries, timeframe::Timeframe},
    providers::{BarSource, errors::ProviderError},
};

const TIMESTAMP_COLUMNS: [&str; 3] = ["date", "datetime", "timestamp"];

/// Reads `<dir>/<TICKER>.csv` for every requested ticker.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
    timeframe: Timeframe,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>, timeframe: Timeframe) -> Self {
        Self {
            dir: dir.into(),
            timeframe,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Every ticker with a CSV file in the directory, sorted.
    pub fn tickers(&self) -> Result<Vec<String>, ProviderError> {
        let io_err = |source: std::io::Error| ProviderError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                out.push(stem.to_string());
            }
        }
        out.sort();
        Ok(out)
    }
}

impl BarSource for CsvDirSource {
    fn load(&self, ticker: &str) -> Result<BarSeries, ProviderError> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        let file = std::fs::File::open(&path).map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;
        let bars = read_bars(file)?;
        debug!(ticker, bars = bars.len(), path = %path.display(), "loaded csv");
        Ok(BarSeries::new(ticker, self.timeframe, bars))
    }
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ProviderError> {
        let find = |names: &[&str], column: &'static str| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or(ProviderError::MissingColumn { column })
        };
        Ok(Self {
            timestamp: find(&TIMESTAMP_COLUMNS, "Date")?,
            open: find(&["open"], "Open")?,
            high: find(&["high"], "High")?,
            low: find(&["low"], "Low")?,
            close: find(&["close"], "Close")?,
            volume: find(&["volume"], "Volume")?,
        })
    }
}

/// Parse OHLCV rows from any CSV reader. Row order is preserved.
pub fn read_bars<R: std::io::Read>(reader: R) -> Result<Vec<Bar>, ProviderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let cols = Columns::from_headers(rdr.headers()?)?;

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // header is line 1
        let row = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let prices = [cols.open, cols.high, cols.low, cols.close].map(cell);
        if prices.iter().any(|p| p.is_empty()) {
            continue;
        }

        let raw_ts = cell(cols.timestamp);
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| ProviderError::BadValue {
            row,
            column: "Date",
            value: raw_ts.to_string(),
        })?;

        let num = |value: &str, column: &'static str| {
            value.parse::<f64>().map_err(|_| ProviderError::BadValue {
                row,
                column,
                value: value.to_string(),
            })
        };
        let volume = match cell(cols.volume) {
            "" => 0.0,
            v => num(v, "Volume")?,
        };

        bars.push(Bar::new(
            timestamp,
            num(prices[0], "Open")?,
            num(prices[1], "High")?,
            num(prices[2], "Low")?,
            num(prices[3], "Close")?,
            volume,
        ));
    }
    Ok(bars)
}

/// Parse a date or datetime into a timezone-naive timestamp.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` (space or `T`), and the same
/// with a UTC offset. An offset is dropped and the wall-clock time is kept.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z")
        .ok()
        .map(|dt| dt.naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_plain_dates() {
        assert_eq!(parse_timestamp("2024-01-02"), Some(ts(2024, 1, 2, 0, 0)));
    }

    #[test]
    fn parses_naive_datetimes() {
        assert_eq!(
            parse_timestamp("2024-01-02 09:30:00"),
            Some(ts(2024, 1, 2, 9, 30))
        );
        assert_eq!(parse_timestamp("2024-01-02T15:30"), Some(ts(2024, 1, 2, 15, 30)));
    }

    #[test]
    fn drops_offsets_keeping_wall_clock() {
        assert_eq!(
            parse_timestamp("2024-01-02 09:30:00-05:00"),
            Some(ts(2024, 1, 2, 9, 30))
        );
        assert_eq!(
            parse_timestamp("2024-01-02T10:30:00+08:00"),
            Some(ts(2024, 1, 2, 10, 30))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn reads_rows_and_skips_empty_prices() {
        let csv = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,10,12,9,11,10.9,1000
2024-01-03,,,,,,
2024-01-04,11,13,10,12,11.9,
";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, ts(2024, 1, 2, 0, 0));
        assert_eq!(bars[0].close, 11.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let csv = "datetime,OPEN,high,Low,close,VOLUME\n2024-01-02 10:30:00,1,2,0.5,1.5,7\n";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].timestamp, ts(2024, 1, 2, 10, 30));
        assert_eq!(bars[0].volume, 7.0);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Date,Open,High,Close,Volume\n2024-01-02,1,2,1.5,7\n";
        let err = read_bars(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ProviderError::MissingColumn { column: "Low" }));
    }

    #[test]
    fn bad_number_names_row_and_column() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,abc,1.5,7\n";
        match read_bars(csv.as_bytes()).unwrap_err() {
            ProviderError::BadValue { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Low");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
