//! Bar aggregation: group higher-frequency bars into calendar weeks.
//!
//! Weeks close on a fixed weekday (Friday by default, the same bucketing as a
//! `W-FRI` resample). Each output bar is stamped with the closing date at
//! midnight.
//!
//! Per period: `open` is the first bar's open, `high` the max high, `low` the
//! min low, `close` the last bar's close, `volume` the sum. Periods without
//! input bars produce no output bar. Intraday bars are bucketed by their
//! calendar date.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use market_data::models::bar::Bar;
use serde::{Deserialize, Serialize};

/// Grouping period for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Weeks closing on `ends_on`.
    Week {
        /// Last weekday of every period.
        ends_on: Weekday,
    },
}

impl Period {
    /// Weeks closing on Friday.
    pub const WEEK_ENDING_FRIDAY: Period = Period::Week {
        ends_on: Weekday::Fri,
    };

    /// Closing date of the period that contains `date`.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match *self {
            Period::Week { ends_on } => week_end(date, ends_on),
        }
    }
}

fn week_end(date: NaiveDate, ends_on: Weekday) -> NaiveDate {
    let today = date.weekday().num_days_from_monday() as i64;
    let target = ends_on.num_days_from_monday() as i64;
    date + Duration::days((target - today).rem_euclid(7))
}

/// Aggregate `bars` into one bar per non-empty `period`, in chronological order.
///
/// The input is sorted defensively first; empty input yields empty output.
pub fn aggregate(bars: &[Bar], period: Period) -> Vec<Bar> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|b| b.timestamp);

    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<NaiveDate> = None;

    for bar in sorted {
        let end = period.period_end(bar.timestamp.date());
        if current == Some(end) {
            if let Some(agg) = out.last_mut() {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            continue;
        }
        current = Some(end);
        out.push(Bar {
            timestamp: end.and_time(NaiveTime::MIN),
            ..bar
        });
    }
    out
}
