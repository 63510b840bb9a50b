//! Bar periodicities the scanner understands.
//!
//! Typical usage:
//! ```
//! use market_data::models::timeframe::Timeframe;
//!
//! let tf: Timeframe = "1W".parse().unwrap();
//! assert_eq!(tf, Timeframe::Weekly);
//! assert_eq!(tf.to_string(), "weekly");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timeframe: {0:?} (expected weekly, daily or hourly)")]
pub struct TimeframeParseError(pub String);

/// Bar periodicity under analysis. Each one carries its own lookback and
/// validation policy in the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Weekly,
    Daily,
    Hourly,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Weekly, Timeframe::Daily, Timeframe::Hourly];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Weekly => "weekly",
            Timeframe::Daily => "daily",
            Timeframe::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the long names plus the short `1W` / `1D` / `1h` forms.
impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1W" | "W" => return Ok(Timeframe::Weekly),
            "1D" | "D" => return Ok(Timeframe::Daily),
            "1h" | "h" | "1H" | "H" => return Ok(Timeframe::Hourly),
            _ => {}
        }
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" | "wk" => Ok(Timeframe::Weekly),
            "daily" | "day" => Ok(Timeframe::Daily),
            "hourly" | "hour" | "hr" => Ok(Timeframe::Hourly),
            _ => Err(TimeframeParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!("weekly".parse::<Timeframe>().unwrap(), Timeframe::Weekly);
        assert_eq!(" Daily ".parse::<Timeframe>().unwrap(), Timeframe::Daily);
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::Hourly);
        assert_eq!("1D".parse::<Timeframe>().unwrap(), Timeframe::Daily);
    }

    #[test]
    fn rejects_unknown_unit() {
        let err = "monthly".parse::<Timeframe>().unwrap_err();
        assert!(err.to_string().contains("monthly"));
    }

    #[test]
    fn display_round_trips() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
    }
}
