//! BackLab Core — strategy backtesting engine.
//!
//! This crate contains the heart of the system:
//! - Domain types (bars, timeframes, trades, equity curve, indicator frames)
//! - Technical indicator library (SMA/EMA/RSI/Bollinger/MACD/ATR/ADX)
//! - Bar-by-bar replay loop with a structural no-lookahead guarantee
//! - Performance metrics (Sharpe/Sortino/Calmar/drawdown/profit factor)
//! - Multi-timeframe analysis and threshold alerting
//! - Parameter grid search
//! - Persistence collaborator (`MarketStore`) and reporting adapters

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod report;
pub mod sample;
pub mod store;
pub mod strategy;
