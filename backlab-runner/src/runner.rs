//! Batch orchestration over (symbol, strategy) pairs.
//!
//! Each pair gets its own engine and its own mutable run state; pairs are
//! independent and run in parallel. Results are assembled fan-in after the
//! parallel section (nothing shared is mutated during the runs), and a
//! failing pair is recorded against that pair only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{info, warn};

use backlab_core::domain::Timeframe;
use backlab_core::engine::{Alert, BacktestEngine, BacktestResult, EngineConfig};
use backlab_core::store::MarketStore;
use backlab_core::strategy::StrategyDecision;

/// A completed (symbol, strategy) run.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub result: BacktestResult,
    pub alerts: Vec<Alert>,
}

/// Outcome slot for one pair.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(StrategyRun),
    Failed(String),
}

impl RunOutcome {
    pub fn completed(&self) -> Option<&StrategyRun> {
        match self {
            RunOutcome::Completed(run) => Some(run),
            RunOutcome::Failed(_) => None,
        }
    }
}

/// Results keyed symbol -> strategy name -> outcome. Insert-only: every
/// run writes exactly one slot.
pub type RunResults = BTreeMap<String, BTreeMap<String, RunOutcome>>;

/// Orchestrates many `BacktestEngine` runs and aggregates their results.
pub struct BacktestRunner {
    store: Arc<dyn MarketStore>,
    config: EngineConfig,
    results: RunResults,
}

impl BacktestRunner {
    pub fn new(store: Arc<dyn MarketStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            results: RunResults::new(),
        }
    }

    pub fn results(&self) -> &RunResults {
        &self.results
    }

    /// Replace the collected results wholesale (fixtures, replays).
    pub fn set_results(&mut self, results: RunResults) {
        self.results = results;
    }

    /// Run every (symbol, strategy) combination over [start, end].
    ///
    /// Each run is constructed, executed, alert-checked, and persisted
    /// independently; a failure in one pair does not disturb the others.
    pub fn run_multiple_backtests(
        &mut self,
        symbols: &[&str],
        timeframes: &[Timeframe],
        strategies: &[Arc<dyn StrategyDecision>],
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> &RunResults {
        let pairs: Vec<(&str, &Arc<dyn StrategyDecision>)> = symbols
            .iter()
            .flat_map(|&symbol| strategies.iter().map(move |s| (symbol, s)))
            .collect();

        let outcomes: Vec<(String, String, RunOutcome)> = pairs
            .par_iter()
            .map(|&(symbol, strategy)| {
                let outcome = self.run_pair(symbol, strategy.as_ref(), timeframes, start_date, end_date);
                (symbol.to_string(), strategy.name().to_string(), outcome)
            })
            .collect();

        for (symbol, strategy_name, outcome) in outcomes {
            if let RunOutcome::Failed(message) = &outcome {
                warn!(symbol = %symbol, strategy = %strategy_name, error = %message, "backtest failed");
            }
            self.results
                .entry(symbol)
                .or_default()
                .insert(strategy_name, outcome);
        }

        info!(
            pairs = symbols.len() * strategies.len(),
            symbols = symbols.len(),
            strategies = strategies.len(),
            "batch complete"
        );
        &self.results
    }

    fn run_pair(
        &self,
        symbol: &str,
        strategy: &dyn StrategyDecision,
        timeframes: &[Timeframe],
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> RunOutcome {
        let engine = match BacktestEngine::new(
            Arc::clone(&self.store),
            symbol,
            timeframes.to_vec(),
            start_date,
            end_date,
            self.config.clone(),
        ) {
            Ok(engine) => engine,
            Err(err) => return RunOutcome::Failed(err.to_string()),
        };

        let result = match engine.run_backtest(strategy) {
            Ok(result) => result,
            Err(err) => return RunOutcome::Failed(err.to_string()),
        };

        let alerts = engine.monitor_and_alert(&result);
        if let Err(err) = engine.save_results(&result, strategy.name()) {
            // Persistence is best-effort for a batch; the run itself stands.
            warn!(symbol = %symbol, strategy = %strategy.name(), error = %err, "persist failed");
        }

        RunOutcome::Completed(StrategyRun { result, alerts })
    }

    /// Iterate completed runs as (symbol, strategy, run).
    pub fn completed_runs(&self) -> impl Iterator<Item = (&str, &str, &StrategyRun)> {
        self.results.iter().flat_map(|(symbol, by_strategy)| {
            by_strategy.iter().filter_map(move |(name, outcome)| {
                outcome
                    .completed()
                    .map(|run| (symbol.as_str(), name.as_str(), run))
            })
        })
    }

    /// Total number of result slots, failures included.
    pub fn run_count(&self) -> usize {
        self.results.values().map(|m| m.len()).sum()
    }
}
