//! Ticker universes.
//!
//! [`Universe`] is what the scanner consumes: ticker -> bars, built once at the
//! boundary. [`UniverseMeta`] is the display side (name, sector) and never
//! reaches the algorithm.

use std::{io::Read, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    models::{bar::Bar, bar_series::BarSeries},
    providers::errors::ProviderError,
};

/// Ticker -> bars, iterated in insertion order.
pub type Universe = IndexMap<String, Vec<Bar>>;

/// Build a [`Universe`] from loaded series. A repeated symbol keeps its first
/// position and the last series wins.
pub fn universe_from_series(series: impl IntoIterator<Item = BarSeries>) -> Universe {
    series.into_iter().map(|s| (s.symbol, s.bars)).collect()
}

/// Presentation data for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub name: String,
    pub sector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaRow {
    #[serde(alias = "ticker", alias = "Symbol", alias = "symbol")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(alias = "name", alias = "Security")]
    #[serde(rename = "Name")]
    name: String,
    #[serde(alias = "sector", alias = "GICS Sector", default)]
    #[serde(rename = "Sector")]
    sector: Option<String>,
}

/// Ticker -> display name / sector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseMeta {
    pub tickers: IndexMap<String, TickerInfo>,
}

impl UniverseMeta {
    /// Name used when a ticker has no metadata.
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Read a `Ticker,Name,Sector` CSV. Tickers are trimmed; the first
    /// occurrence of a ticker wins.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ProviderError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut tickers = IndexMap::new();
        for row in rdr.deserialize::<MetaRow>() {
            let row = row?;
            if row.ticker.is_empty() {
                continue;
            }
            let sector = row.sector.filter(|s| !s.is_empty());
            tickers.entry(row.ticker).or_insert(TickerInfo {
                name: row.name,
                sector,
            });
        }
        Ok(Self { tickers })
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerInfo> {
        self.tickers.get(ticker)
    }

    /// Display name, falling back to [`Self::UNKNOWN_NAME`].
    pub fn name_of(&self, ticker: &str) -> &str {
        self.get(ticker)
            .map(|i| i.name.as_str())
            .unwrap_or(Self::UNKNOWN_NAME)
    }
}
