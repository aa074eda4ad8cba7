//! Strategy comparison and ranking.

use serde::{Deserialize, Serialize};

use crate::runner::BacktestRunner;

/// One comparison row per completed (symbol, strategy) pair.
///
/// Ranks are 1 = best and are computed independently across the full row
/// set; `overall_rank` is the mean of the return and Sharpe ranks, so
/// lower is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub symbol: String,
    pub strategy: String,
    pub total_return_pct: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub return_rank: usize,
    pub sharpe_rank: usize,
    pub overall_rank: f64,
}

impl BacktestRunner {
    /// Flatten completed results into ranked comparison rows, sorted by
    /// `overall_rank` ascending (best first). Failed pairs are skipped.
    pub fn compare_strategies(&self) -> Vec<ComparisonRow> {
        let mut rows: Vec<ComparisonRow> = self
            .completed_runs()
            .map(|(symbol, strategy, run)| ComparisonRow {
                symbol: symbol.to_string(),
                strategy: strategy.to_string(),
                total_return_pct: run.result.total_return_pct,
                win_rate: run.result.win_rate,
                sharpe_ratio: run.result.sharpe_ratio,
                max_drawdown: run.result.max_drawdown,
                total_trades: run.result.total_trades,
                return_rank: 0,
                sharpe_rank: 0,
                overall_rank: 0.0,
            })
            .collect();

        assign_ranks(&mut rows, |row| row.total_return_pct, |row, rank| {
            row.return_rank = rank
        });
        assign_ranks(&mut rows, |row| row.sharpe_ratio, |row, rank| {
            row.sharpe_rank = rank
        });
        for row in &mut rows {
            row.overall_rank = (row.return_rank + row.sharpe_rank) as f64 / 2.0;
        }

        rows.sort_by(|a, b| {
            a.overall_rank
                .partial_cmp(&b.overall_rank)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }
}

/// Rank rows by `metric` descending: the highest value gets rank 1.
fn assign_ranks<M, S>(rows: &mut [ComparisonRow], metric: M, mut set: S)
where
    M: Fn(&ComparisonRow) -> f64,
    S: FnMut(&mut ComparisonRow, usize),
{
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| {
        metric(&rows[b])
            .partial_cmp(&metric(&rows[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (rank_minus_one, &index) in order.iter().enumerate() {
        set(&mut rows[index], rank_minus_one + 1);
    }
}
