//! Persistence collaborator.
//!
//! The engine does not own a database; it talks to a `MarketStore` for bar
//! history and for append-only persistence of trades and run metrics.
//! Rows carry only strings and numbers; timestamps are canonicalized to
//! ISO-8601 strings once, when the row is built.

pub mod csv_store;
pub mod memory;

pub use csv_store::CsvStore;
pub use memory::MemoryStore;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{to_iso, Bar, Timeframe, TimestampError, Trade};

/// Errors from loading or persisting data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no market data for {symbol} {timeframe} in [{start}, {end}]")]
    NoData {
        symbol: String,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("serialization error: {0}")]
    Timestamp(#[from] TimestampError),
}

/// A persisted trade. Everything non-numeric is already a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub trade_id: String,
    pub symbol: String,
    pub strategy: String,
    pub side: String,
    /// ISO-8601, always.
    pub timestamp: String,
    pub price: f64,
    pub quantity: f64,
    pub value: f64,
    pub commission: f64,
    pub entry_point: bool,
    pub entry_price: Option<f64>,
    pub profit_loss: f64,
    pub roi_pct: f64,
}

impl TradeRow {
    pub fn from_trade(trade: &Trade, strategy: &str) -> Self {
        Self {
            trade_id: trade.trade_id.clone(),
            symbol: trade.symbol.clone(),
            strategy: strategy.to_string(),
            side: trade.side.as_str().to_string(),
            timestamp: to_iso(&trade.timestamp),
            price: trade.price,
            quantity: trade.quantity,
            value: trade.value,
            commission: trade.commission,
            entry_point: trade.entry_point,
            entry_price: trade.entry_price,
            profit_loss: trade.profit_loss,
            roi_pct: trade.roi_pct,
        }
    }
}

/// Persisted aggregate metrics for one (symbol, strategy) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRow {
    pub symbol: String,
    pub strategy: String,
    pub timeframes: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub volatility: f64,
}

/// The Database collaborator contract.
///
/// Implementations must tolerate concurrent writers: trade and metric
/// inserts are append-only and keyed by trade/run identity, never updates.
pub trait MarketStore: Send + Sync {
    /// Load raw bars for a (symbol, timeframe) over [start, end]. Order and
    /// uniqueness are NOT guaranteed here; the engine sorts and dedups.
    fn load_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError>;

    /// Persist a bar series, replacing any existing series for the key.
    fn store_market_data(
        &self,
        bars: &[Bar],
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<(), DataError>;

    /// Append one trade row.
    fn insert_trade(&self, row: &TradeRow) -> Result<(), DataError>;

    /// Append one metrics row.
    fn store_performance_metrics(&self, row: &MetricsRow) -> Result<(), DataError>;
}
