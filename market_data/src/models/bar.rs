//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! Every [`BarSource`](crate::providers::BarSource) yields these, whatever the
//! bar frequency. Timestamps are timezone-naive wall-clock times: a daily bar
//! is stamped at midnight of its session date.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::BarError;

/// A single time-series bar (OHLCV) for a given timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The timestamp for this bar (timezone-naive).
    pub timestamp: NaiveDateTime,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A daily bar stamped at midnight of `date`.
    pub fn daily(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self::new(
            date.and_time(chrono::NaiveTime::MIN),
            open,
            high,
            low,
            close,
            volume,
        )
    }

    /// Check the OHLCV shape rules.
    ///
    /// Prices must be finite and strictly positive, `low <= open, close <= high`,
    /// and volume must be finite and non-negative.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BarError::InvalidPrice { field, value });
            }
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(BarError::Envelope {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume(self.volume));
        }
        Ok(())
    }
}
