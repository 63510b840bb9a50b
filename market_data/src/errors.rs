use chrono::NaiveDateTime;
use thiserror::Error;

/// A single bar that violates the OHLCV shape rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    /// A price is zero, negative, NaN or infinite.
    #[error("{field} price must be positive and finite, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    /// `low <= open, close <= high` does not hold.
    #[error("price envelope violated: low {low}, open {open}, close {close}, high {high}")]
    Envelope {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    /// Volume is negative, NaN or infinite.
    #[error("volume must be non-negative and finite, got {0}")]
    InvalidVolume(f64),
}

/// A per-ticker bar sequence that cannot be analysed.
///
/// This is the "malformed input" case: the scanner drops the ticker and keeps
/// going with the rest of the universe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarSeriesError {
    /// One bar is malformed.
    #[error("bar at {timestamp}: {source}")]
    Bar {
        timestamp: NaiveDateTime,
        #[source]
        source: BarError,
    },

    /// Two bars share a timestamp, so no strictly increasing order exists.
    #[error("duplicate timestamp {0}")]
    DuplicateTimestamp(NaiveDateTime),
}
