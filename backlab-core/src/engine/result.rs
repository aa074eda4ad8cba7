//! Backtest result — the immutable output of one replay.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{EquityPoint, Timeframe, Trade};
use crate::metrics::Metrics;

/// Complete result of a single backtest run.
///
/// Owned by exactly one run; nothing mutates it after `run_backtest`
/// returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy_name: String,
    pub timeframes: Vec<Timeframe>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub initial_capital: f64,
    pub final_equity: f64,
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
    /// Every trade leg (entries and exits) in execution order.
    pub trades: Vec<Trade>,
    /// One point per primary-timeframe bar, ascending by timestamp.
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    /// The closing legs, i.e. the realized round trips.
    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| !t.entry_point)
    }

    pub(crate) fn apply_metrics(&mut self, metrics: &Metrics) {
        self.total_profit = metrics.total_profit;
        self.total_return_pct = metrics.total_return_pct;
        self.total_trades = metrics.total_trades;
        self.win_count = metrics.win_count;
        self.loss_count = metrics.loss_count;
        self.win_rate = metrics.win_rate;
        self.max_drawdown = metrics.max_drawdown;
        self.sharpe_ratio = metrics.sharpe_ratio;
        self.sortino_ratio = metrics.sortino_ratio;
        self.calmar_ratio = metrics.calmar_ratio;
        self.profit_factor = metrics.profit_factor;
        self.expectancy = metrics.expectancy;
        self.volatility = metrics.volatility;
    }
}
