//! In-memory market store for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::domain::{Bar, Timeframe};

use super::{DataError, MarketStore, MetricsRow, TradeRow};

#[derive(Default)]
pub struct MemoryStore {
    bars: Mutex<HashMap<(String, Timeframe), Vec<Bar>>>,
    trades: Mutex<Vec<TradeRow>>,
    metrics: Mutex<Vec<MetricsRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all inserted trade rows.
    pub fn trades(&self) -> Vec<TradeRow> {
        self.trades.lock().expect("lock poisoned").clone()
    }

    /// Snapshot of all inserted metrics rows.
    pub fn metrics(&self) -> Vec<MetricsRow> {
        self.metrics.lock().expect("lock poisoned").clone()
    }
}

impl MarketStore for MemoryStore {
    fn load_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.bars.lock().expect("lock poisoned");
        Ok(bars
            .get(&(symbol.to_string(), timeframe))
            .map(|series| {
                series
                    .iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn store_market_data(
        &self,
        bars: &[Bar],
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<(), DataError> {
        self.bars
            .lock()
            .expect("lock poisoned")
            .insert((symbol.to_string(), timeframe), bars.to_vec());
        Ok(())
    }

    fn insert_trade(&self, row: &TradeRow) -> Result<(), DataError> {
        self.trades.lock().expect("lock poisoned").push(row.clone());
        Ok(())
    }

    fn store_performance_metrics(&self, row: &MetricsRow) -> Result<(), DataError> {
        self.metrics.lock().expect("lock poisoned").push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn store_and_load_filters_range() {
        let store = MemoryStore::new();
        let bars: Vec<Bar> = (0..6)
            .map(|i| Bar {
                symbol: "BTCUSDT".into(),
                timeframe: Timeframe::H1,
                timestamp: ts(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1.0,
            })
            .collect();
        store.store_market_data(&bars, "BTCUSDT", Timeframe::H1).unwrap();

        let loaded = store
            .load_bars("BTCUSDT", Timeframe::H1, ts(2), ts(4))
            .unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn unknown_key_is_empty() {
        let store = MemoryStore::new();
        assert!(store
            .load_bars("BTCUSDT", Timeframe::H1, ts(0), ts(5))
            .unwrap()
            .is_empty());
    }
}
