//! Scanner configuration: TOML overrides merged over per-timeframe defaults.
//!
//! Every table is optional and so is every key inside it; whatever is left
//! out keeps the value from [`ScanParams::defaults_for`]. Unknown keys are
//! rejected so a typo cannot silently fall back to a default.
//!
//! ```toml
//! [weekly]
//! lookback = 104
//!
//! [daily.policy]
//! kind = "proximity"
//! tolerance = 0.05
//! ```
//!
//! Entrypoints:
//! - Parse, merge, and validate a TOML string: [`load_config_str`]
//! - Same from a file path: [`load_config_path`]

use anyhow::Context;
use chrono::Weekday;
use market_data::models::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::{
    params::{ParamsError, ScanParams},
    policy::Policy,
};

/// Partial [`ScanParams`] as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsOverride {
    /// See [`ScanParams::lookback`].
    pub lookback: Option<usize>,
    /// See [`ScanParams::pivot_width`].
    pub pivot_width: Option<usize>,
    /// See [`ScanParams::min_bars`].
    pub min_bars: Option<usize>,
    /// See [`ScanParams::min_bars_from_low`].
    pub min_bars_from_low: Option<usize>,
    /// See [`ScanParams::week_ends_on`]; accepts `"Fri"`, `"friday"`, ...
    pub week_ends_on: Option<Weekday>,
    /// Replaces the whole policy when present.
    pub policy: Option<Policy>,
}

impl ParamsOverride {
    /// Overlay the fields that are set onto `base`.
    pub fn apply(&self, base: ScanParams) -> ScanParams {
        ScanParams {
            lookback: self.lookback.unwrap_or(base.lookback),
            pivot_width: self.pivot_width.unwrap_or(base.pivot_width),
            min_bars: self.min_bars.unwrap_or(base.min_bars),
            min_bars_from_low: self.min_bars_from_low.unwrap_or(base.min_bars_from_low),
            week_ends_on: self.week_ends_on.unwrap_or(base.week_ends_on),
            policy: self.policy.unwrap_or(base.policy),
        }
    }
}

/// Raw file layout: one optional table per timeframe.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// `[weekly]` overrides.
    pub weekly: Option<ParamsOverride>,
    /// `[daily]` overrides.
    pub daily: Option<ParamsOverride>,
    /// `[hourly]` overrides.
    pub hourly: Option<ParamsOverride>,
}

/// Effective parameters for every timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Weekly scan parameters.
    pub weekly: ScanParams,
    /// Daily scan parameters.
    pub daily: ScanParams,
    /// Hourly scan parameters.
    pub hourly: ScanParams,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            weekly: ScanParams::defaults_for(Timeframe::Weekly),
            daily: ScanParams::defaults_for(Timeframe::Daily),
            hourly: ScanParams::defaults_for(Timeframe::Hourly),
        }
    }
}

impl ScanConfig {
    /// Defaults with `file` merged on top. Not validated.
    pub fn merged(file: &ConfigFile) -> Self {
        let base = Self::default();
        let merge = |o: &Option<ParamsOverride>, p: ScanParams| match o {
            Some(o) => o.apply(p),
            None => p,
        };
        Self {
            weekly: merge(&file.weekly, base.weekly),
            daily: merge(&file.daily, base.daily),
            hourly: merge(&file.hourly, base.hourly),
        }
    }

    /// Parameters for `timeframe`.
    pub fn params_for(&self, timeframe: Timeframe) -> &ScanParams {
        match timeframe {
            Timeframe::Weekly => &self.weekly,
            Timeframe::Daily => &self.daily,
            Timeframe::Hourly => &self.hourly,
        }
    }

    /// Validate all three parameter sets, reporting the first failing timeframe.
    pub fn validate(&self) -> Result<(), (Timeframe, ParamsError)> {
        for tf in Timeframe::ALL {
            self.params_for(tf).validate().map_err(|e| (tf, e))?;
        }
        Ok(())
    }

    /// Render as a complete TOML document that [`load_config_str`] accepts.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string(self).context("failed to serialize scan config")
    }
}

/// Parse a config TOML string, merge it over the defaults, and validate it.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<ScanConfig> {
    let file: ConfigFile = from_str(toml_str).context("failed to parse scan config TOML")?;
    let config = ScanConfig::merged(&file);
    if let Err((tf, err)) = config.validate() {
        return Err(anyhow::Error::new(err).context(format!("invalid [{tf}] parameters")));
    }
    Ok(config)
}

/// Read a config file from disk and load it like [`load_config_str`].
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<ScanConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
