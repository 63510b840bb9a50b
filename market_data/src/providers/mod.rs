//! Provider abstraction for bar sources.
//!
//! [`BarSource`] is the seam between the scanner and wherever bars come from.
//! Downloading and caching are out of scope for this workspace; the only
//! implementation shipped here reads CSV files already on disk
//! ([`csv_dir::CsvDirSource`]).
//!
//! # Example
//!
//! ```rust
//! # use market_data::models::{bar_series::BarSeries, timeframe::Timeframe};
//! # use market_data::providers::{BarSource, errors::ProviderError};
//! struct Empty;
//! impl BarSource for Empty {
//!     fn load(&self, ticker: &str) -> Result<BarSeries, ProviderError> {
//!         Ok(BarSeries::new(ticker, Timeframe::Daily, vec![]))
//!     }
//! }
//! let (universe, failed) = Empty.load_universe(["AAPL", "MSFT"]);
//! assert_eq!(universe.len(), 2);
//! assert!(failed.is_empty());
//! ```

pub mod csv_dir;
pub mod errors;

use tracing::{info, warn};

use crate::models::{
    bar_series::BarSeries,
    universe::{Universe, universe_from_series},
};
use errors::ProviderError;

pub trait BarSource {
    /// Load every bar available for one ticker.
    fn load(&self, ticker: &str) -> Result<BarSeries, ProviderError>;

    /// Load a set of tickers, isolating failures.
    ///
    /// Tickers that fail to load are returned next to the universe instead of
    /// aborting the batch.
    fn load_universe<I, S>(&self, tickers: I) -> (Universe, Vec<(String, ProviderError)>)
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut loaded = Vec::new();
        let mut failed = Vec::new();
        for ticker in tickers {
            let ticker = ticker.as_ref();
            match self.load(ticker) {
                Ok(series) => loaded.push(series),
                Err(e) => {
                    warn!(ticker, error = %e, "failed to load bars");
                    failed.push((ticker.to_string(), e));
                }
            }
        }
        let universe = universe_from_series(loaded);
        info!(
            loaded = universe.len(),
            failed = failed.len(),
            "universe load complete"
        );
        (universe, failed)
    }
}
