//! Text summary report over a batch of runs.

use std::collections::BTreeSet;

use crate::runner::BacktestRunner;

/// How many leaders to list per ranking.
const TOP_N: usize = 3;

impl BacktestRunner {
    /// Build the plain-text batch summary: run counts, distinct symbol and
    /// strategy counts, and the top pairs by return and by Sharpe.
    pub fn generate_summary_report(&self) -> String {
        let mut symbols = BTreeSet::new();
        let mut strategies = BTreeSet::new();
        for (symbol, by_strategy) in self.results() {
            symbols.insert(symbol.clone());
            for name in by_strategy.keys() {
                strategies.insert(name.clone());
            }
        }

        let mut report = String::new();
        report.push_str("=== Backtest Summary Report ===\n\n");
        report.push_str(&format!("Total backtests run: {}\n", self.run_count()));
        report.push_str(&format!("Symbols tested: {}\n", symbols.len()));
        report.push_str(&format!("Strategies tested: {}\n", strategies.len()));

        let failed: Vec<String> = self
            .results()
            .iter()
            .flat_map(|(symbol, by_strategy)| {
                by_strategy.iter().filter_map(move |(name, outcome)| {
                    outcome.completed().is_none().then(|| format!("{name} on {symbol}"))
                })
            })
            .collect();
        if !failed.is_empty() {
            report.push_str(&format!("Failed runs: {}\n", failed.join(", ")));
        }

        let mut by_return: Vec<(&str, &str, f64)> = self
            .completed_runs()
            .map(|(symbol, strategy, run)| (symbol, strategy, run.result.total_return_pct))
            .collect();
        by_return.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        report.push_str("\nTop Strategies by Return:\n");
        for (i, (symbol, strategy, ret)) in by_return.iter().take(TOP_N).enumerate() {
            report.push_str(&format!(
                "  {}. {strategy} on {symbol}: {ret:.2}% return\n",
                i + 1
            ));
        }

        let mut by_sharpe: Vec<(&str, &str, f64)> = self
            .completed_runs()
            .map(|(symbol, strategy, run)| (symbol, strategy, run.result.sharpe_ratio))
            .collect();
        by_sharpe.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        report.push_str("\nTop Strategies by Risk-Adjusted Return:\n");
        for (i, (symbol, strategy, sharpe)) in by_sharpe.iter().take(TOP_N).enumerate() {
            report.push_str(&format!(
                "  {}. {strategy} on {symbol}: Sharpe {sharpe:.2}\n",
                i + 1
            ));
        }

        report
    }
}
