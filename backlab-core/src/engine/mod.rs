//! Backtest engine: data preparation, replay loop, analysis, alerting,
//! optimization, and result persistence for one symbol.

pub mod alerts;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod optimize;
pub mod replay;
pub mod result;

pub use alerts::{Alert, AlertKind, Severity};
pub use analysis::{ConsolidatedView, MultiTimeframeAnalysis, TimeframeSnapshot, Trend, VolatilityBand};
pub use config::{AlertThresholds, EngineConfig, DEFAULT_INITIAL_CAPITAL};
pub use engine::BacktestEngine;
pub use optimize::{OptimizationResult, OptimizeError, ParamGrid, Params};
pub use result::BacktestResult;

use thiserror::Error;

use crate::report::ReportError;
use crate::store::DataError;
use crate::strategy::StrategyError;

/// Engine-level error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("optimization error: {0}")]
    Optimize(#[from] OptimizeError),
}
