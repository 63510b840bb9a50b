//! Typed market data for the scanner: OHLCV bars, per-ticker series, the
//! timeframe tag, and the [`providers::BarSource`] seam through which bars
//! enter the workspace.

pub mod errors;
pub mod models;
pub mod providers;
