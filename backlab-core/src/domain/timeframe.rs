//! Timeframe — the bar interval for a market data series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bar interval. The first timeframe of an engine's list is the "primary"
/// timeframe that drives the replay loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

#[derive(Debug, Error)]
#[error("unknown timeframe '{0}'")]
pub struct ParseTimeframeError(String);

impl Timeframe {
    /// Bar duration.
    pub fn duration(self) -> chrono::Duration {
        match self {
            Timeframe::M1 => chrono::Duration::minutes(1),
            Timeframe::M5 => chrono::Duration::minutes(5),
            Timeframe::M15 => chrono::Duration::minutes(15),
            Timeframe::H1 => chrono::Duration::hours(1),
            Timeframe::H4 => chrono::Duration::hours(4),
            Timeframe::D1 => chrono::Duration::days(1),
        }
    }

    /// Bars per year under the 24/7 crypto-market convention (365 days).
    ///
    /// Used as the annualization base for Sharpe/Sortino: ratios are scaled
    /// by sqrt(bars_per_year).
    pub fn bars_per_year(self) -> f64 {
        match self {
            Timeframe::M1 => 525_600.0,
            Timeframe::M5 => 105_120.0,
            Timeframe::M15 => 35_040.0,
            Timeframe::H1 => 8_760.0,
            Timeframe::H4 => 2_190.0,
            Timeframe::D1 => 365.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(ParseTimeframeError(other.to_string())),
        }
    }
}
