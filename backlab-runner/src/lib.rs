//! BackLab Runner — batch orchestration over the core engine.
//!
//! Runs (symbol × strategy) batches in parallel, collects per-pair results
//! and alerts, ranks strategies against each other, and renders the batch
//! summary.

pub mod compare;
pub mod export;
pub mod runner;
pub mod summary;

pub use compare::ComparisonRow;
pub use runner::{BacktestRunner, RunOutcome, RunResults, StrategyRun};
