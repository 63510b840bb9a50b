//! Swing detection.
//!
//! A swing is the most significant recent pivot high plus the lowest low that
//! precedes it:
//!
//! 1. Only the last `lookback` bars are searched for pivots. Fewer than
//!    `min_bars` bars in that window means there is not enough history.
//! 2. Bar `i` is a pivot high when its high is the maximum of the
//!    `pivot_width` bars on each side (inclusive window `i-w ..= i+w`). Bars
//!    closer than `pivot_width` to either end of the window are never pivots.
//! 3. The pivot with the greatest high wins; on equal highs the earliest one.
//! 4. The swing low is the lowest low from the *start of the series* through
//!    the pivot bar (earliest on ties), so a trough older than the lookback
//!    window still anchors the move.
//!
//! Input bars must be sorted ascending by timestamp.

use chrono::NaiveDateTime;
use market_data::models::bar::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest window the locator will work with.
pub const MIN_VIABLE_BARS: usize = 10;

/// A low -> high move: `low_price < high_price`, `low_timestamp < high_timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    /// Trough price.
    pub low_price: f64,
    /// When the trough printed.
    pub low_timestamp: NaiveDateTime,
    /// Peak price (a pivot high).
    pub high_price: f64,
    /// When the peak printed.
    pub high_timestamp: NaiveDateTime,
}

/// Why no swing came out of a series.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SwingRejection {
    /// The lookback window holds fewer than the minimum bar count.
    #[error("insufficient data: {bars} bars in window, need {required}")]
    InsufficientData {
        /// Bars available in the window.
        bars: usize,
        /// Bars required.
        required: usize,
    },
    /// No bar in the window qualifies as a pivot high.
    #[error("no pivot high in window")]
    NoPivot,
    /// The anchored low is not strictly below and before the high.
    #[error("degenerate swing: low {low} vs high {high}")]
    Degenerate {
        /// Computed low.
        low: f64,
        /// Computed high.
        high: f64,
    },
}

/// Swing search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwingSearch {
    /// Number of trailing bars searched for pivots.
    pub lookback: usize,
    /// Bars on each side a pivot high must dominate.
    pub pivot_width: usize,
    /// Minimum window length; shorter windows are insufficient data.
    pub min_bars: usize,
}

impl SwingSearch {
    /// Locate the swing, or say why there is none.
    pub fn locate(&self, bars: &[Bar]) -> Result<Swing, SwingRejection> {
        let offset = bars.len().saturating_sub(self.lookback);
        let window = &bars[offset..];
        if window.len() < self.min_bars {
            return Err(SwingRejection::InsufficientData {
                bars: window.len(),
                required: self.min_bars,
            });
        }

        let mut best: Option<usize> = None;
        for i in pivot_highs(window, self.pivot_width) {
            if best.is_none_or(|b| window[i].high > window[b].high) {
                best = Some(i);
            }
        }
        let peak_idx = offset + best.ok_or(SwingRejection::NoPivot)?;
        let peak = &bars[peak_idx];

        let mut trough = &bars[0];
        for bar in &bars[1..=peak_idx] {
            if bar.low < trough.low {
                trough = bar;
            }
        }

        if trough.low >= peak.high || trough.timestamp >= peak.timestamp {
            return Err(SwingRejection::Degenerate {
                low: trough.low,
                high: peak.high,
            });
        }

        Ok(Swing {
            low_price: trough.low,
            low_timestamp: trough.timestamp,
            high_price: peak.high,
            high_timestamp: peak.timestamp,
        })
    }
}

/// Indices of the pivot highs in `window`, in order.
pub fn pivot_highs(window: &[Bar], width: usize) -> Vec<usize> {
    if window.len() <= width.saturating_mul(2) {
        return Vec::new();
    }
    (width..window.len() - width)
        .filter(|&i| {
            let h = window[i].high;
            window[i - width..=i + width].iter().all(|b| b.high <= h)
        })
        .collect()
}

/// Locate the swing over the last `lookback` bars with pivot half-width
/// `pivot_width`, requiring [`MIN_VIABLE_BARS`] bars.
pub fn locate_swing(bars: &[Bar], lookback: usize, pivot_width: usize) -> Option<Swing> {
    SwingSearch {
        lookback,
        pivot_width,
        min_bars: MIN_VIABLE_BARS,
    }
    .locate(bars)
    .ok()
}
