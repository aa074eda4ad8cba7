//! Degraded-performance alerts.
//!
//! Checks run in a fixed order (drawdown, win rate, Sharpe) so callers
//! can rely on the most severe finding coming first.

use serde::{Deserialize, Serialize};

use super::config::AlertThresholds;
use super::engine::BacktestEngine;
use super::BacktestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Drawdown,
    WinRate,
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single finding. Produced, never persisted; the caller decides what to
/// do with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub metric_value: f64,
}

/// Evaluate `thresholds` against a finished run.
pub fn evaluate(thresholds: &AlertThresholds, results: &BacktestResult) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if results.max_drawdown <= thresholds.max_drawdown_pct {
        alerts.push(Alert {
            kind: AlertKind::Drawdown,
            severity: Severity::High,
            message: format!(
                "max drawdown {:.2}% breaches the {:.2}% limit",
                results.max_drawdown, thresholds.max_drawdown_pct
            ),
            metric_value: results.max_drawdown,
        });
    }

    // Win rate is only meaningful with a minimum sample of closed trades.
    if results.total_trades >= thresholds.min_trades_for_win_rate
        && results.win_rate < thresholds.min_win_rate_pct
    {
        alerts.push(Alert {
            kind: AlertKind::WinRate,
            severity: Severity::Medium,
            message: format!(
                "win rate {:.1}% below {:.1}% over {} trades",
                results.win_rate, thresholds.min_win_rate_pct, results.total_trades
            ),
            metric_value: results.win_rate,
        });
    }

    if results.sharpe_ratio < thresholds.min_sharpe {
        alerts.push(Alert {
            kind: AlertKind::Performance,
            severity: Severity::Medium,
            message: format!(
                "Sharpe ratio {:.2} below {:.2}",
                results.sharpe_ratio, thresholds.min_sharpe
            ),
            metric_value: results.sharpe_ratio,
        });
    }

    alerts
}

impl BacktestEngine {
    /// Evaluate the configured thresholds against a run.
    pub fn monitor_and_alert(&self, results: &BacktestResult) -> Vec<Alert> {
        evaluate(&self.config().alerts, results)
    }
}
