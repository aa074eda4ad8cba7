//! Performance metrics — pure functions that score a finished run.
//!
//! Every metric is a pure function: equity curve and/or closed trades in,
//! scalar out. Percentages follow the reporting convention (win_rate 60.0
//! means 60%, max_drawdown -8.5 means an 8.5% decline). Division-by-zero
//! conditions (no trades, zero variance, zero drawdown) resolve to 0.0.

use serde::{Deserialize, Serialize};

use crate::domain::{Timeframe, Trade};

/// Profit factor reported when there are gains but no losses.
const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Aggregate statistics for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub total_profit: f64,
    pub total_return_pct: f64,
    pub total_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub volatility: f64,
}

impl Metrics {
    /// Compute all metrics from an equity series and the closed trades of a
    /// run. `timeframe` is the primary timeframe, used for annualization.
    pub fn compute(
        equity: &[f64],
        closed_trades: &[&Trade],
        initial_capital: f64,
        timeframe: Timeframe,
    ) -> Self {
        let returns = period_returns(equity);
        let final_equity = equity.last().copied().unwrap_or(initial_capital);
        let total_profit = final_equity - initial_capital;
        let total_return = total_return_pct(initial_capital, final_equity);
        let drawdown = max_drawdown_pct(equity);
        let wins = closed_trades.iter().filter(|t| t.profit_loss > 0.0).count();

        Self {
            total_profit,
            total_return_pct: total_return,
            total_trades: closed_trades.len(),
            win_count: wins,
            loss_count: closed_trades.len() - wins,
            win_rate: win_rate_pct(wins, closed_trades.len()),
            max_drawdown: drawdown,
            sharpe_ratio: sharpe_ratio(&returns, timeframe),
            sortino_ratio: sortino_ratio(&returns, timeframe),
            calmar_ratio: calmar_ratio(total_return, drawdown),
            profit_factor: profit_factor(closed_trades),
            expectancy: expectancy(closed_trades),
            volatility: std_dev(&returns),
        }
    }
}

/// (final - initial) / initial * 100.
pub fn total_return_pct(initial_capital: f64, final_equity: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_equity - initial_capital) / initial_capital * 100.0
}

/// wins / total * 100; 0 with no trades.
pub fn win_rate_pct(wins: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    wins as f64 / total as f64 * 100.0
}

/// Most negative (equity / running_peak - 1) * 100 over the curve (<= 0).
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let mut peak = equity[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq / peak - 1.0) * 100.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// mean(returns) / std(returns) * sqrt(bars_per_year); 0 with zero variance.
pub fn sharpe_ratio(returns: &[f64], timeframe: Timeframe) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * timeframe.bars_per_year().sqrt()
}

/// Like Sharpe, but the denominator is the downside deviation (negative
/// returns only). 0 when there is no downside.
pub fn sortino_ratio(returns: &[f64], timeframe: Timeframe) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let downside_sq: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).collect();
    if downside_sq.is_empty() {
        return 0.0;
    }
    let downside_std = (downside_sq.iter().sum::<f64>() / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean / downside_std) * timeframe.bars_per_year().sqrt()
}

/// total_return_pct / |max_drawdown|; 0 when there is no drawdown.
pub fn calmar_ratio(total_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct >= 0.0 {
        return 0.0;
    }
    total_return_pct / max_drawdown_pct.abs()
}

/// Gross profit / gross loss over closed trades.
///
/// 0 with no trades or no gains; capped at 100 when there are gains but
/// no losses.
pub fn profit_factor(closed_trades: &[&Trade]) -> f64 {
    if closed_trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = closed_trades
        .iter()
        .filter(|t| t.profit_loss > 0.0)
        .map(|t| t.profit_loss)
        .sum();
    let gross_loss: f64 = closed_trades
        .iter()
        .filter(|t| t.profit_loss < 0.0)
        .map(|t| t.profit_loss.abs())
        .sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 {
            PROFIT_FACTOR_CAP
        } else {
            0.0
        };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

/// Mean profit/loss per closed trade; 0 with no trades.
pub fn expectancy(closed_trades: &[&Trade]) -> f64 {
    if closed_trades.is_empty() {
        return 0.0;
    }
    closed_trades.iter().map(|t| t.profit_loss).sum::<f64>() / closed_trades.len() as f64
}

/// Single-bar fractional returns from an equity series.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    if equity.len() < 2 {
        return Vec::new();
    }
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); 0 with fewer than 2 values.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
