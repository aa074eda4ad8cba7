//! Trade log rendering.
//!
//! The log is a faithful tabular view of the trades it is given: input
//! order preserved, profit/ROI columns carried through untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{to_iso, Trade};
use crate::engine::{BacktestEngine, BacktestResult};

use super::ReportError;

/// One rendered trade-log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLogRow {
    pub trade_id: String,
    pub symbol: String,
    pub side: String,
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

impl TradeLogRow {
    fn from_trade(trade: &Trade) -> Self {
        Self {
            trade_id: trade.trade_id.clone(),
            symbol: trade.symbol.clone(),
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

/// The rendered table.
#[derive(Debug, Clone, Default)]
pub struct TradeLogTable {
    rows: Vec<TradeLogRow>,
}

impl TradeLogTable {
    pub fn from_trades(trades: &[Trade]) -> Self {
        Self {
            rows: trades.iter().map(TradeLogRow::from_trade).collect(),
        }
    }

    pub fn rows(&self) -> &[TradeLogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl BacktestEngine {
    /// Render the run's trades as a table; persist it as CSV when
    /// `filename` is given.
    pub fn generate_trade_log(
        &self,
        results: &BacktestResult,
        filename: Option<&Path>,
    ) -> Result<TradeLogTable, ReportError> {
        let table = TradeLogTable::from_trades(&results.trades);
        if let Some(path) = filename {
            table.write_csv(path)?;
        }
        Ok(table)
    }
}
