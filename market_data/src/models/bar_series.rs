//! A collection of time-series bars for a specific symbol and timeframe.

use serde::{Deserialize, Serialize};

use crate::{
    errors::BarSeriesError,
    models::{bar::Bar, timeframe::Timeframe},
};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`Timeframe`], making the data set self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL", "0700.HK").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: Timeframe,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }
}

/// Sort bars ascending by timestamp and check every bar.
///
/// The result is strictly increasing in time. Duplicate timestamps and
/// malformed bars are reported as [`BarSeriesError`].
pub fn normalize_bars(mut bars: Vec<Bar>) -> Result<Vec<Bar>, BarSeriesError> {
    bars.sort_by_key(|b| b.timestamp);

    for bar in &bars {
        bar.validate().map_err(|source| BarSeriesError::Bar {
            timestamp: bar.timestamp,
            source,
        })?;
    }

    if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(BarSeriesError::DuplicateTimestamp(pair[1].timestamp));
    }
    Ok(bars)
}
