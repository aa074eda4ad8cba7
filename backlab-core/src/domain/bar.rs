//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timeframe::Timeframe;

/// OHLCV bar for a single symbol on a single timeframe.
///
/// A (symbol, timeframe) series is sorted ascending by timestamp and holds
/// no duplicate timestamps; `BacktestEngine` enforces both at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity check: high >= low, high bounds open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        if self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Sort bars ascending by timestamp and drop duplicate timestamps (first wins).
///
/// Returns the number of duplicates dropped.
pub fn sort_and_dedup(bars: &mut Vec<Bar>) -> usize {
    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    before - bars.len()
}
