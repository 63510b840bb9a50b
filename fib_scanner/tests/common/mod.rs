#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use market_data::models::{bar::Bar, universe::Universe};

/// Friday `n` weeks after 2024-01-05.
pub fn friday(n: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::weeks(n as i64)
}

/// Calendar day `n` after 2024-03-01.
pub fn day(n: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(n as i64)
}

/// Hour `n` after Monday 2024-03-04 09:30.
pub fn hour(n: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
        + Duration::hours(n as i64)
}

/// One bar per `(low, high)` row; open and close sit at the midpoint.
pub fn bars(rows: &[(f64, f64)], at: impl Fn(usize) -> NaiveDateTime) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(low, high))| {
            let mid = (low + high) / 2.0;
            Bar::new(at(i), mid, high, low, mid, 1_000.0)
        })
        .collect()
}

pub fn weekly(rows: &[(f64, f64)]) -> Vec<Bar> {
    bars(rows, friday)
}

pub fn daily(rows: &[(f64, f64)]) -> Vec<Bar> {
    bars(rows, day)
}

pub fn hourly(rows: &[(f64, f64)]) -> Vec<Bar> {
    bars(rows, hour)
}

/// Weekly rally 100 -> 200 (peak on week 7) then a pullback to 138 on week 10.
pub fn weekly_swing_rows() -> Vec<(f64, f64)> {
    vec![
        (110.0, 120.0),
        (105.0, 115.0),
        (100.0, 110.0),
        (108.0, 130.0),
        (125.0, 150.0),
        (145.0, 170.0),
        (165.0, 190.0),
        (180.0, 200.0),
        (170.0, 190.0),
        (150.0, 175.0),
        (138.0, 160.0),
    ]
}

/// Daily rally 50 -> 100 (peak on day 7) followed by `tail`.
pub fn daily_swing_rows(tail: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut rows = vec![
        (55.0, 60.0),
        (52.0, 58.0),
        (50.0, 56.0),
        (55.0, 65.0),
        (63.0, 75.0),
        (72.0, 85.0),
        (82.0, 95.0),
        (90.0, 100.0),
    ];
    rows.extend_from_slice(tail);
    rows
}

pub fn universe(entries: Vec<(&str, Vec<Bar>)>) -> Universe {
    entries
        .into_iter()
        .map(|(ticker, bars)| (ticker.to_owned(), bars))
        .collect::<IndexMap<_, _>>()
}

/// Render bars the way a downloader writes them.
pub fn to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.close,
            b.volume
        ));
    }
    out
}
