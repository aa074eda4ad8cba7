//! Parameter grid search.
//!
//! Evaluates a strategy factory over the Cartesian product of candidate
//! values and keeps the best run. Candidates are independent, so the grid
//! is evaluated in parallel; selection is deterministic regardless of
//! completion order.

use std::collections::BTreeMap;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::strategy::StrategyDecision;

use super::engine::BacktestEngine;
use super::{BacktestResult, EngineError};

/// One parameter assignment.
pub type Params = BTreeMap<String, f64>;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("parameter grid is empty")]
    EmptyGrid,
}

/// Candidate values per parameter name.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    axes: BTreeMap<String, Vec<f64>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.axes.insert(name.into(), values);
        self
    }

    /// Total number of candidates (product of axis lengths).
    pub fn len(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.values().map(|v| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the full Cartesian product in a deterministic order.
    pub fn candidates(&self) -> Vec<Params> {
        let mut out = vec![Params::new()];
        for (name, values) in &self.axes {
            let mut next = Vec::with_capacity(out.len() * values.len());
            for partial in &out {
                for &value in values {
                    let mut params = partial.clone();
                    params.insert(name.clone(), value);
                    next.push(params);
                }
            }
            out = next;
        }
        out
    }
}

/// Winner of a grid search.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub params: Params,
    pub sharpe_ratio: f64,
    pub result: BacktestResult,
}

impl BacktestEngine {
    /// Run the full grid and return the best candidate.
    ///
    /// Ranking: highest Sharpe, ties broken by higher total return, then
    /// by smaller |max drawdown|. A strategy failure in any candidate
    /// aborts the whole search.
    pub fn optimize_parameters<F>(
        &self,
        strategy_factory: F,
        param_grid: &ParamGrid,
    ) -> Result<OptimizationResult, EngineError>
    where
        F: Fn(&Params) -> Box<dyn StrategyDecision> + Sync,
    {
        let candidates = param_grid.candidates();
        if param_grid.is_empty() {
            return Err(OptimizeError::EmptyGrid.into());
        }

        let mut evaluated: Vec<OptimizationResult> = candidates
            .into_par_iter()
            .map(|params| {
                let strategy = strategy_factory(&params);
                let result = self.run_backtest(strategy.as_ref())?;
                debug!(?params, sharpe = result.sharpe_ratio, "candidate scored");
                Ok(OptimizationResult {
                    sharpe_ratio: result.sharpe_ratio,
                    params,
                    result,
                })
            })
            .collect::<Result<_, EngineError>>()?;

        let mut best = evaluated.pop().expect("grid is non-empty");
        for candidate in evaluated {
            if beats(&candidate, &best) {
                best = candidate;
            }
        }
        Ok(best)
    }
}

fn beats(a: &OptimizationResult, b: &OptimizationResult) -> bool {
    if a.sharpe_ratio != b.sharpe_ratio {
        return a.sharpe_ratio > b.sharpe_ratio;
    }
    if a.result.total_return_pct != b.result.total_return_pct {
        return a.result.total_return_pct > b.result.total_return_pct;
    }
    a.result.max_drawdown.abs() < b.result.max_drawdown.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_product_is_cartesian() {
        let grid = ParamGrid::new()
            .insert("oversold", vec![20.0, 30.0, 40.0])
            .insert("overbought", vec![60.0, 70.0, 80.0]);
        assert_eq!(grid.len(), 9);
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 9);
        // Deterministic order: first axis alphabetically is "overbought"
        assert_eq!(candidates[0]["overbought"], 60.0);
        assert_eq!(candidates[0]["oversold"], 20.0);
        assert_eq!(candidates[8]["overbought"], 80.0);
        assert_eq!(candidates[8]["oversold"], 40.0);
        // All assignments distinct
        let unique: std::collections::BTreeSet<String> = candidates
            .iter()
            .map(|p| format!("{p:?}"))
            .collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn empty_grid_has_no_candidates() {
        assert!(ParamGrid::new().is_empty());
        let grid = ParamGrid::new().insert("x", Vec::new());
        assert!(grid.is_empty());
    }

    fn opt(sharpe: f64, ret: f64, dd: f64) -> OptimizationResult {
        use crate::domain::Timeframe;
        let ts = chrono::NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let result = BacktestResult {
            symbol: "BTCUSDT".into(),
            strategy_name: "test".into(),
            timeframes: vec![Timeframe::H1],
            start_date: ts,
            end_date: ts,
            initial_capital: 10_000.0,
            final_equity: 10_000.0,
            total_profit: 0.0,
            total_return_pct: ret,
            total_trades: 0,
            win_count: 0,
            loss_count: 0,
            win_rate: 0.0,
            max_drawdown: dd,
            sharpe_ratio: sharpe,
            sortino_ratio: 0.0,
            calmar_ratio: 0.0,
            profit_factor: 0.0,
            expectancy: 0.0,
            volatility: 0.0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        };
        OptimizationResult {
            params: Params::new(),
            sharpe_ratio: sharpe,
            result,
        }
    }

    #[test]
    fn ranking_prefers_sharpe_then_return_then_drawdown() {
        assert!(beats(&opt(2.0, 1.0, -10.0), &opt(1.0, 50.0, -1.0)));
        // Sharpe tied: higher return wins
        assert!(beats(&opt(1.0, 20.0, -10.0), &opt(1.0, 10.0, -1.0)));
        // Sharpe and return tied: smaller |drawdown| wins
        assert!(beats(&opt(1.0, 10.0, -5.0), &opt(1.0, 10.0, -9.0)));
        assert!(!beats(&opt(1.0, 10.0, -9.0), &opt(1.0, 10.0, -5.0)));
    }
}
