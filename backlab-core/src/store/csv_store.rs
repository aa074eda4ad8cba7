//! File-backed market store.
//!
//! Layout under a root directory:
//! - `bars/<symbol>_<timeframe>.csv`: one CSV per bar series
//! - `trades.jsonl`: append-only, one JSON trade row per line
//! - `metrics.jsonl`: append-only, one JSON metrics row per line
//!
//! Appends open the file in append mode under a lock, so independent runs
//! can insert concurrently without interleaving partial lines.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::domain::{Bar, Timeframe};

use super::{DataError, MarketStore, MetricsRow, TradeRow};

pub struct CsvStore {
    root: PathBuf,
    append_lock: Mutex<()>,
}

impl CsvStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DataError> {
        let root = root.into();
        fs::create_dir_all(root.join("bars"))?;
        Ok(Self {
            root,
            append_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bars_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.root.join("bars").join(format!("{symbol}_{timeframe}.csv"))
    }

    fn append_jsonl<T: serde::Serialize>(&self, file: &str, row: &T) -> Result<(), DataError> {
        let line = serde_json::to_string(row)?;
        let _guard = self.append_lock.lock().expect("append lock poisoned");
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(file))?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

impl MarketStore for CsvStore {
    fn load_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self.bars_path(symbol, timeframe);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars = Vec::new();
        for record in reader.deserialize::<Bar>() {
            let bar = record?;
            if bar.timestamp >= start && bar.timestamp <= end {
                bars.push(bar);
            }
        }
        Ok(bars)
    }

    fn store_market_data(
        &self,
        bars: &[Bar],
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<(), DataError> {
        let path = self.bars_path(symbol, timeframe);
        let file = File::create(&path)?;
        let mut writer = csv::Writer::from_writer(file);
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn insert_trade(&self, row: &TradeRow) -> Result<(), DataError> {
        self.append_jsonl("trades.jsonl", row)
    }

    fn store_performance_metrics(&self, row: &MetricsRow) -> Result<(), DataError> {
        self.append_jsonl("metrics.jsonl", row)
    }
}
