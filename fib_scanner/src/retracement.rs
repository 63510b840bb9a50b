//! Fibonacci zone arithmetic and the retracement check.
//!
//! Given a [`Swing`], the zone spans the 61.8% and 78.6% retracements of the
//! low -> high range. The correction segment is every bar strictly after the
//! swing high; its lowest low is the retracement low, which is then tested
//! against the zone and handed to the timeframe [`Policy`].

use chrono::NaiveDateTime;
use market_data::models::bar::Bar;
use serde::{Deserialize, Serialize};

use crate::{
    policy::{Policy, PolicyMetric, Verdict},
    swing::Swing,
};

/// A price observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// The price.
    pub price: f64,
    /// When it was observed.
    pub timestamp: NaiveDateTime,
}

impl PricePoint {
    /// Pair a price with its timestamp.
    pub fn new(price: f64, timestamp: NaiveDateTime) -> Self {
        Self { price, timestamp }
    }
}

/// The 61.8% / 78.6% retracement band of a swing.
///
/// `fib786 <= fib618 <= high`: `fib618` is the upper bound, `fib786` the lower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetracementZone {
    /// `high - 0.618 * (high - low)`
    pub fib618: f64,
    /// `high - 0.786 * (high - low)`
    pub fib786: f64,
}

impl RetracementZone {
    /// Shallow retracement ratio (upper bound of the zone).
    pub const SHALLOW: f64 = 0.618;
    /// Deep retracement ratio (lower bound of the zone).
    pub const DEEP: f64 = 0.786;

    /// Zone for `swing`.
    pub fn from_swing(swing: &Swing) -> Self {
        let range = swing.high_price - swing.low_price;
        Self {
            fib618: swing.high_price - Self::SHALLOW * range,
            fib786: swing.high_price - Self::DEEP * range,
        }
    }

    /// Inclusive test `fib786 <= price <= fib618`.
    pub fn contains(&self, price: f64) -> bool {
        self.fib786 <= price && price <= self.fib618
    }
}

/// Everything learnt about the pullback after a swing.
///
/// Carried for INVALID outcomes too; dropping them is the caller's choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetracementResult {
    /// Zone derived from the swing.
    pub zone: RetracementZone,
    /// Lowest low after the swing high (first occurrence on ties).
    pub low: PricePoint,
    /// Close and timestamp of the latest bar.
    pub latest: PricePoint,
    /// Whether `low` lies inside `zone`.
    pub in_zone: bool,
    /// Final decision.
    pub verdict: Verdict,
    /// Number the policy decided on.
    pub metric: PolicyMetric,
}

/// Evaluate the retracement that followed `swing`.
///
/// `bars` must be sorted ascending by timestamp. Returns `None` when no bar
/// exists after the swing high, i.e. no pullback has started.
pub fn evaluate(bars: &[Bar], swing: &Swing, policy: &Policy) -> Option<RetracementResult> {
    let zone = RetracementZone::from_swing(swing);

    let start = bars.partition_point(|b| b.timestamp <= swing.high_timestamp);
    let correction = &bars[start..];
    let latest = correction.last()?;

    let mut low = &correction[0];
    for bar in &correction[1..] {
        if bar.low < low.low {
            low = bar;
        }
    }
    let low = PricePoint::new(low.low, low.timestamp);

    let in_zone = zone.contains(low.price);
    let (verdict, metric) = policy.classify(in_zone, low, latest);

    Some(RetracementResult {
        zone,
        low,
        latest: PricePoint::new(latest.close, latest.timestamp),
        in_zone,
        verdict,
        metric,
    })
}
