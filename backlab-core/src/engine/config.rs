//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default account size for a run.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Default commission rate per fill (0.1% of notional).
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

/// Default fraction of current equity committed when opening a position.
pub const DEFAULT_POSITION_FRACTION: f64 = 0.95;

/// Parameters of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Commission charged on each fill as a fraction of notional.
    pub commission_rate: f64,
    /// Fraction of current equity (commission included) spent on an entry.
    pub position_fraction: f64,
    pub alerts: AlertThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission_rate: DEFAULT_COMMISSION_RATE,
            position_fraction: DEFAULT_POSITION_FRACTION,
            alerts: AlertThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML. Missing keys fall back to defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

/// Thresholds for `monitor_and_alert`.
///
/// All checks are evaluated in a fixed order: drawdown, win rate, Sharpe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Drawdown at or below this (percent, negative) raises a high alert.
    pub max_drawdown_pct: f64,
    /// Win rate below this percent raises a medium alert...
    pub min_win_rate_pct: f64,
    /// ...but only once this many closed trades exist.
    pub min_trades_for_win_rate: usize,
    /// Sharpe below this raises a medium alert.
    pub min_sharpe: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_drawdown_pct: -15.0,
            min_win_rate_pct: 40.0,
            min_trades_for_win_rate: 10,
            min_sharpe: 1.0,
        }
    }
}
