//! Scan parameters and their validation.
//!
//! Parameter mistakes are programming or configuration errors, so they fail
//! the whole scan up front instead of degrading per ticker.

use chrono::Weekday;
use market_data::models::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::Period,
    policy::Policy,
    swing::{MIN_VIABLE_BARS, SwingSearch},
};

/// Invalid scan parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    /// `lookback` is zero.
    #[error("lookback must be positive")]
    ZeroLookback,
    /// `pivot_width` is zero.
    #[error("pivot_width must be positive")]
    ZeroPivotWidth,
    /// A pivot needs `2 * pivot_width + 1` bars, which must fit the lookback.
    #[error("pivot_width {pivot_width} must be less than half of lookback {lookback}")]
    PivotWidthTooWide {
        /// Offending width.
        pivot_width: usize,
        /// Lookback it was checked against.
        lookback: usize,
    },
    /// `min_bars` is zero or larger than the lookback window.
    #[error("min_bars {min_bars} must be between 1 and lookback {lookback}")]
    MinBars {
        /// Offending minimum.
        min_bars: usize,
        /// Lookback it was checked against.
        lookback: usize,
    },
    /// Recency threshold negative or not finite.
    #[error("recency threshold must be finite and non-negative, got {0}")]
    Threshold(f64),
    /// Proximity tolerance negative or not finite.
    #[error("proximity tolerance must be finite and non-negative, got {0}")]
    Tolerance(f64),
    /// Recency period of zero days.
    #[error("recency period_days must be positive")]
    PeriodDays,
}

/// Everything the engine needs for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanParams {
    /// Trailing bars searched for pivot highs.
    pub lookback: usize,
    /// Half-width of the pivot test.
    pub pivot_width: usize,
    /// Minimum bars in the lookback window.
    pub min_bars: usize,
    /// Minimum bars from the swing low through the latest bar, inclusive.
    pub min_bars_from_low: usize,
    /// Closing weekday of weekly periods. Only read for weekly scans.
    pub week_ends_on: Weekday,
    /// Acceptance policy.
    pub policy: Policy,
}

impl ScanParams {
    /// Defaults per timeframe: 80 weeks with an 8-week recency rule, or
    /// 250 days / 300 hours with a 3% proximity rule.
    pub fn defaults_for(timeframe: Timeframe) -> Self {
        let base = Self {
            lookback: 80,
            pivot_width: 3,
            min_bars: MIN_VIABLE_BARS,
            min_bars_from_low: 1,
            week_ends_on: Weekday::Fri,
            policy: Policy::weekly_recency(),
        };
        match timeframe {
            Timeframe::Weekly => base,
            Timeframe::Daily => Self {
                lookback: 250,
                min_bars_from_low: 5,
                policy: Policy::three_pct_proximity(),
                ..base
            },
            Timeframe::Hourly => Self {
                lookback: 300,
                min_bars_from_low: 5,
                policy: Policy::three_pct_proximity(),
                ..base
            },
        }
    }

    /// Check every bound; the first violation is returned.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.lookback == 0 {
            return Err(ParamsError::ZeroLookback);
        }
        if self.pivot_width == 0 {
            return Err(ParamsError::ZeroPivotWidth);
        }
        if self.pivot_width.saturating_mul(2) >= self.lookback {
            return Err(ParamsError::PivotWidthTooWide {
                pivot_width: self.pivot_width,
                lookback: self.lookback,
            });
        }
        if self.min_bars == 0 || self.min_bars > self.lookback {
            return Err(ParamsError::MinBars {
                min_bars: self.min_bars,
                lookback: self.lookback,
            });
        }
        self.policy.validate()
    }

    /// Swing locator settings.
    pub fn swing_search(&self) -> SwingSearch {
        SwingSearch {
            lookback: self.lookback,
            pivot_width: self.pivot_width,
            min_bars: self.min_bars,
        }
    }

    /// Aggregation applied before the swing search, if any.
    pub fn aggregation(&self, timeframe: Timeframe) -> Option<Period> {
        match timeframe {
            Timeframe::Weekly => Some(Period::Week {
                ends_on: self.week_ends_on,
            }),
            Timeframe::Daily | Timeframe::Hourly => None,
        }
    }
}
