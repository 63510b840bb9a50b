//! Per-timeframe acceptance policies.
//!
//! A retracement that lands in the Fibonacci zone is only VALID if the policy
//! agrees as well:
//! - [`Policy::Recency`]: the retracement low happened recently (weekly bars).
//! - [`Policy::Proximity`]: price is still close to the retracement low
//!   (daily and hourly bars).
//!
//! Both produce a [`PolicyMetric`] that is reported whatever the verdict.

use std::fmt;

use market_data::models::bar::Bar;
use serde::{Deserialize, Serialize};

use crate::{params::ParamsError, retracement::PricePoint};

const SECS_PER_DAY: f64 = 86_400.0;

/// Outcome of a retracement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// In the zone and accepted by the policy.
    Valid,
    /// Anything else.
    Invalid,
}

impl Verdict {
    /// `true` for [`Verdict::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Valid => "VALID",
            Verdict::Invalid => "INVALID",
        })
    }
}

/// Supporting number behind a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PolicyMetric {
    /// Periods between the retracement low and the latest bar (fractional).
    PeriodsSinceRetracement(f64),
    /// How far the latest close sits above the retracement low, in percent.
    PctAboveRetracementLow(f64),
}

impl PolicyMetric {
    /// The raw number, whichever variant.
    pub fn value(&self) -> f64 {
        match *self {
            PolicyMetric::PeriodsSinceRetracement(v) | PolicyMetric::PctAboveRetracementLow(v) => {
                v
            }
        }
    }

    /// Stable snake_case name of the variant, as serialized.
    pub fn label(&self) -> &'static str {
        match self {
            PolicyMetric::PeriodsSinceRetracement(_) => "periods_since_retracement",
            PolicyMetric::PctAboveRetracementLow(_) => "pct_above_retracement_low",
        }
    }
}

impl fmt::Display for PolicyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PolicyMetric::PeriodsSinceRetracement(v) => write!(f, "{v:.2} periods"),
            PolicyMetric::PctAboveRetracementLow(v) => write!(f, "{v:+.2}%"),
        }
    }
}

/// Acceptance rule applied after the zone test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// VALID if the retracement low is at most `max_periods` periods old.
    Recency {
        /// Threshold in periods; compared against the fractional elapsed time.
        max_periods: f64,
        /// Length of one period in days.
        period_days: u32,
    },
    /// VALID if `latest_close <= retracement_low * (1 + tolerance)`.
    Proximity {
        /// Allowed rise above the retracement low, as a fraction (0.03 = 3%).
        tolerance: f64,
    },
}

impl Policy {
    /// Eight weeks, the weekly default.
    pub const fn weekly_recency() -> Self {
        Policy::Recency {
            max_periods: 8.0,
            period_days: 7,
        }
    }

    /// Within 3% of the retracement low, the daily and hourly default.
    pub const fn three_pct_proximity() -> Self {
        Policy::Proximity { tolerance: 0.03 }
    }

    /// Reject negative or non-finite thresholds and zero-length periods.
    pub fn validate(&self) -> Result<(), ParamsError> {
        match *self {
            Policy::Recency {
                max_periods,
                period_days,
            } => {
                if !max_periods.is_finite() || max_periods < 0.0 {
                    return Err(ParamsError::Threshold(max_periods));
                }
                if period_days == 0 {
                    return Err(ParamsError::PeriodDays);
                }
            }
            Policy::Proximity { tolerance } => {
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(ParamsError::Tolerance(tolerance));
                }
            }
        }
        Ok(())
    }

    /// Decide the verdict for a retracement low against the latest bar.
    pub fn classify(&self, in_zone: bool, low: PricePoint, latest: &Bar) -> (Verdict, PolicyMetric) {
        let (accepted, metric) = match *self {
            Policy::Recency {
                max_periods,
                period_days,
            } => {
                let secs = (latest.timestamp - low.timestamp).num_seconds() as f64;
                let elapsed = secs / (period_days as f64 * SECS_PER_DAY);
                (
                    elapsed <= max_periods,
                    PolicyMetric::PeriodsSinceRetracement(elapsed),
                )
            }
            Policy::Proximity { tolerance } => {
                let pct = (latest.close / low.price - 1.0) * 100.0;
                (
                    latest.close <= low.price * (1.0 + tolerance),
                    PolicyMetric::PctAboveRetracementLow(pct),
                )
            }
        };
        let verdict = if in_zone && accepted {
            Verdict::Valid
        } else {
            Verdict::Invalid
        };
        (verdict, metric)
    }
}
