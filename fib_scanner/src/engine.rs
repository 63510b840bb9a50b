//! Signal engine: run the full pipeline over a universe.
//!
//! Per ticker: normalize (sort, validate, reject duplicates) -> aggregate when
//! the timeframe asks for it -> locate the swing -> check there is enough
//! history after the low -> evaluate the retracement. Every failure past
//! parameter validation is confined to its ticker and recorded as a
//! [`SkipReason`]; the rest of the universe is still scanned.

use market_data::{
    errors::BarSeriesError,
    models::{bar::Bar, bar_series::normalize_bars, timeframe::Timeframe, universe::Universe},
};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{Dispatch, debug, debug_span, dispatcher, info, info_span, warn};

use crate::{
    aggregate::aggregate,
    params::{ParamsError, ScanParams},
    policy::{PolicyMetric, Verdict},
    retracement::{PricePoint, RetracementZone, evaluate},
    swing::{Swing, SwingRejection},
};

/// One evaluated ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// Ticker symbol.
    pub ticker: String,
    /// Timeframe the swing was measured on.
    pub timeframe: Timeframe,
    /// The low -> high move.
    pub swing: Swing,
    /// Fibonacci band of the swing.
    pub zone: RetracementZone,
    /// Lowest low after the swing high.
    pub retracement_low: PricePoint,
    /// Latest close.
    pub latest: PricePoint,
    /// Whether the retracement low is inside the zone.
    pub in_zone: bool,
    /// Final decision.
    pub verdict: Verdict,
    /// Policy metric backing the verdict.
    pub metric: PolicyMetric,
}

/// Why a ticker produced no signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    /// Bars failed validation or carried duplicate timestamps.
    #[error("malformed series: {0}")]
    Malformed(#[from] BarSeriesError),
    /// Too little history, either in the lookback window or after the swing low.
    #[error("insufficient data: {bars} bars, need {required}")]
    InsufficientData {
        /// Bars available.
        bars: usize,
        /// Bars required.
        required: usize,
    },
    /// No pivot high in the lookback window.
    #[error("no pivot high in window")]
    NoPivot,
    /// Low not strictly below and before the high.
    #[error("degenerate swing: low {low} vs high {high}")]
    DegenerateSwing {
        /// Computed low.
        low: f64,
        /// Computed high.
        high: f64,
    },
    /// The swing high is the latest bar.
    #[error("no bars after the swing high")]
    NoCorrection,
}

impl From<SwingRejection> for SkipReason {
    fn from(rejection: SwingRejection) -> Self {
        match rejection {
            SwingRejection::InsufficientData { bars, required } => {
                SkipReason::InsufficientData { bars, required }
            }
            SwingRejection::NoPivot => SkipReason::NoPivot,
            SwingRejection::Degenerate { low, high } => SkipReason::DegenerateSwing { low, high },
        }
    }
}

/// A ticker left out of the signal list.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    /// Ticker symbol.
    pub ticker: String,
    /// What went wrong.
    pub reason: SkipReason,
}

/// Result of scanning a universe.
///
/// `signals` and `skipped` both follow the universe's iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    /// Timeframe that was scanned.
    pub timeframe: Timeframe,
    /// VALID and INVALID signals.
    pub signals: Vec<Signal>,
    /// Tickers that produced no signal.
    pub skipped: Vec<Skipped>,
}

impl ScanReport {
    /// Signals with a VALID verdict.
    pub fn valid(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.verdict.is_valid())
    }

    /// Signals with an INVALID verdict.
    pub fn invalid(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| !s.verdict.is_valid())
    }

    /// Number of VALID signals.
    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    /// Tickers looked at, emitted or not.
    pub fn scanned(&self) -> usize {
        self.signals.len() + self.skipped.len()
    }

    /// Skipped tickers whose data was malformed.
    pub fn malformed(&self) -> impl Iterator<Item = &Skipped> {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Malformed(_)))
    }
}

/// Scan every ticker of `universe` on `timeframe`.
///
/// Parameters are validated before any ticker is touched; that is the only
/// error this returns. Tickers are processed in parallel and reported in the
/// universe's order.
pub fn scan(
    universe: &Universe,
    timeframe: Timeframe,
    params: &ScanParams,
) -> Result<ScanReport, ParamsError> {
    params.validate()?;

    let span = info_span!("scan", %timeframe, tickers = universe.len());
    let _guard = span.enter();
    // rayon workers start without the caller's subscriber or span
    let dispatch = dispatcher::get_default(Dispatch::clone);

    let entries: Vec<(&String, &Vec<Bar>)> = universe.iter().collect();
    let outcomes: Vec<(&String, Result<Signal, SkipReason>)> = entries
        .par_iter()
        .map(|&(ticker, bars)| {
            dispatcher::with_default(&dispatch, || {
                let _ticker = debug_span!(parent: &span, "ticker", %ticker).entered();
                (ticker, scan_ticker(ticker, bars, timeframe, params))
            })
        })
        .collect();

    let mut report = ScanReport {
        timeframe,
        signals: Vec::new(),
        skipped: Vec::new(),
    };
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(signal) => {
                debug!(ticker = %ticker, verdict = %signal.verdict, "evaluated");
                report.signals.push(signal);
            }
            Err(reason) => {
                if matches!(reason, SkipReason::Malformed(_)) {
                    warn!(ticker = %ticker, error = %reason, "skipping malformed series");
                } else {
                    debug!(ticker = %ticker, reason = %reason, "skipped");
                }
                report.skipped.push(Skipped {
                    ticker: ticker.clone(),
                    reason,
                });
            }
        }
    }

    info!(
        valid = report.valid_count(),
        invalid = report.invalid().count(),
        skipped = report.skipped.len(),
        "scan finished"
    );
    Ok(report)
}

fn scan_ticker(
    ticker: &str,
    bars: &[Bar],
    timeframe: Timeframe,
    params: &ScanParams,
) -> Result<Signal, SkipReason> {
    let mut bars = normalize_bars(bars.to_vec())?;
    if let Some(period) = params.aggregation(timeframe) {
        bars = aggregate(&bars, period);
    }

    let swing = params.swing_search().locate(&bars)?;
    debug!(
        bars = bars.len(),
        low = swing.low_price,
        high = swing.high_price,
        "swing located"
    );

    let from_low = bars.len() - bars.partition_point(|b| b.timestamp < swing.low_timestamp);
    if from_low < params.min_bars_from_low {
        return Err(SkipReason::InsufficientData {
            bars: from_low,
            required: params.min_bars_from_low,
        });
    }

    let result = evaluate(&bars, &swing, &params.policy).ok_or(SkipReason::NoCorrection)?;
    Ok(Signal {
        ticker: ticker.to_owned(),
        timeframe,
        swing,
        zone: result.zone,
        retracement_low: result.low,
        latest: result.latest,
        in_zone: result.in_zone,
        verdict: result.verdict,
        metric: result.metric,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
    use indexmap::IndexMap;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::{
        layer::{Context, Layer, SubscriberExt},
        registry::LookupSpan,
    };

    use super::*;

    fn day(n: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(n)
    }

    fn series(rows: &[(f64, f64)]) -> Vec<Bar> {
        rows.iter()
            .enumerate()
            .map(|(i, &(low, high))| {
                let mid = (low + high) / 2.0;
                Bar::new(day(i as i64), mid, high, low, mid, 100.0)
            })
            .collect()
    }

    /// Daily swing 50 -> 100 with a pullback to 65, closing at 66.5.
    fn daily_hit() -> Vec<Bar> {
        series(&[
            (55.0, 60.0),
            (52.0, 58.0),
            (50.0, 56.0),
            (55.0, 65.0),
            (63.0, 75.0),
            (72.0, 85.0),
            (82.0, 95.0),
            (90.0, 100.0),
            (85.0, 97.0),
            (75.0, 90.0),
            (68.0, 80.0),
            (65.0, 72.0),
            (65.5, 68.0),
            (66.0, 67.0),
        ])
    }

    fn universe(entries: Vec<(&str, Vec<Bar>)>) -> Universe {
        entries
            .into_iter()
            .map(|(t, bars)| (t.to_owned(), bars))
            .collect::<IndexMap<_, _>>()
    }

    #[test]
    fn daily_hit_is_valid() {
        let u = universe(vec![("ACME", daily_hit())]);
        let report = scan(&u, Timeframe::Daily, &ScanParams::defaults_for(Timeframe::Daily)).unwrap();
        assert!(report.skipped.is_empty());
        let s = &report.signals[0];
        assert_eq!(s.swing.low_price, 50.0);
        assert_eq!(s.swing.high_price, 100.0);
        assert_eq!(s.retracement_low.price, 65.0);
        assert!(s.in_zone);
        assert_eq!(s.verdict, Verdict::Valid);
        assert_eq!(report.valid_count(), 1);
    }

    #[test]
    fn unsorted_input_is_normalized_first() {
        let mut bars = daily_hit();
        bars.reverse();
        let u = universe(vec![("ACME", bars)]);
        let report = scan(&u, Timeframe::Daily, &ScanParams::defaults_for(Timeframe::Daily)).unwrap();
        assert_eq!(report.signals[0].verdict, Verdict::Valid);
    }

    #[test]
    fn bad_params_fail_before_any_ticker() {
        let u = universe(vec![("ACME", daily_hit())]);
        let mut params = ScanParams::defaults_for(Timeframe::Daily);
        params.pivot_width = 200;
        assert!(matches!(
            scan(&u, Timeframe::Daily, &params),
            Err(ParamsError::PivotWidthTooWide { .. })
        ));
    }

    #[test]
    fn malformed_ticker_is_isolated() {
        let mut broken = daily_hit();
        broken[3].low = -1.0;
        let mut dupes = daily_hit();
        dupes[5].timestamp = dupes[4].timestamp;

        let u = universe(vec![("BAD", broken), ("ACME", daily_hit()), ("DUP", dupes)]);
        let report = scan(&u, Timeframe::Daily, &ScanParams::defaults_for(Timeframe::Daily)).unwrap();

        assert_eq!(report.signals.len(), 1);
        assert_eq!(report.signals[0].ticker, "ACME");
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(skipped, vec!["BAD", "DUP"]);
        assert_eq!(report.malformed().count(), 2);
        assert_eq!(report.scanned(), 3);
    }

    #[test]
    fn too_few_bars_after_low_is_skipped() {
        // trough on the bar right before the peak, 6 bars from low to latest
        let bars = series(&[
            (60.0, 70.0),
            (62.0, 72.0),
            (61.0, 71.0),
            (63.0, 73.0),
            (64.0, 74.0),
            (65.0, 75.0),
            (66.0, 76.0),
            (67.0, 77.0),
            (50.0, 80.0),
            (70.0, 100.0),
            (80.0, 90.0),
            (75.0, 85.0),
            (74.0, 84.0),
            (73.0, 83.0),
        ]);
        let u = universe(vec![("T", bars)]);
        let mut params = ScanParams::defaults_for(Timeframe::Daily);
        params.min_bars_from_low = 7;
        let report = scan(&u, Timeframe::Daily, &params).unwrap();
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::InsufficientData {
                bars: 6,
                required: 7
            }
        );
    }

    #[test]
    fn weekly_scan_aggregates_daily_input() {
        // the daily hit stretched to one bar per week, stamped on Wednesdays
        let bars: Vec<Bar> = daily_hit()
            .into_iter()
            .enumerate()
            .map(|(i, mut b)| {
                b.timestamp = NaiveDate::from_ymd_opt(2024, 1, 3)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + Duration::weeks(i as i64);
                b
            })
            .collect();
        let u = universe(vec![("ACME", bars)]);
        let report = scan(&u, Timeframe::Weekly, &ScanParams::defaults_for(Timeframe::Weekly)).unwrap();
        let s = &report.signals[0];
        assert_eq!(s.swing.high_timestamp.date().weekday(), Weekday::Fri);
        assert_eq!(s.retracement_low.timestamp.date().weekday(), Weekday::Fri);
        assert_eq!(s.metric, PolicyMetric::PeriodsSinceRetracement(2.0));
        assert_eq!(s.verdict, Verdict::Valid);
    }

    #[test]
    fn output_follows_universe_order() {
        let names = ["ZETA", "ALPHA", "MID", "BETA"];
        let u = universe(names.iter().map(|n| (*n, daily_hit())).collect());
        let report = scan(&u, Timeframe::Daily, &ScanParams::defaults_for(Timeframe::Daily)).unwrap();
        let got: Vec<&str> = report.signals.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(got, names);
    }

    /// Records the names of the spans around every event, root first.
    #[derive(Clone, Default)]
    struct ScopeRecorder(Arc<Mutex<Vec<Vec<String>>>>);

    impl<S> Layer<S> for ScopeRecorder
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
            let scope = ctx
                .event_scope(event)
                .map(|scope| scope.from_root().map(|span| span.name().to_owned()).collect())
                .unwrap_or_default();
            self.0.lock().unwrap().push(scope);
        }
    }

    #[test]
    fn worker_events_stay_inside_scan_and_ticker_spans() {
        let recorder = ScopeRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        let u = universe(vec![("ACME", daily_hit()), ("BETA", daily_hit()), ("GAMMA", daily_hit())]);

        let report = tracing::subscriber::with_default(subscriber, || {
            scan(&u, Timeframe::Daily, &ScanParams::defaults_for(Timeframe::Daily)).unwrap()
        });
        assert_eq!(report.signals.len(), 3);

        let scopes = recorder.0.lock().unwrap();
        // one "swing located" per ticker, emitted on the workers
        let per_ticker = scopes.iter().filter(|s| **s == ["scan", "ticker"]).count();
        assert_eq!(per_ticker, 3);
        assert!(scopes.iter().all(|s| s.first().map(String::as_str) == Some("scan")));
    }
}
