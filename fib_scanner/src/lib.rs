//! Fibonacci retracement scanner.
//!
//! Flags trend-continuation candidates: a prior low -> high swing whose
//! subsequent pullback reached the 61.8%-78.6% retracement zone, filtered by
//! a per-timeframe policy (recency for weekly bars, proximity for daily and
//! hourly bars).
//!
//! The pipeline, leaves first:
//! - [`aggregate`]: daily -> weekly bar grouping
//! - [`swing`]: pivot-high search and swing low anchoring
//! - [`retracement`] + [`policy`]: zone arithmetic and the verdict
//! - [`engine`]: per-ticker orchestration over a whole universe
//!
//! [`config`] and [`report`] are the caller-side edges: TOML parameters in,
//! tables / CSV / JSON out.

#![deny(missing_docs)]

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod params;
pub mod policy;
pub mod report;
pub mod retracement;
pub mod swing;
