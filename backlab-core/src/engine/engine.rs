//! Engine construction and data preparation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::domain::{sort_and_dedup, to_iso, IndicatorFrame, Timeframe};
use crate::indicators::{Adx, Atr, Bollinger, Ema, Indicator, Macd, Rsi, Sma};
use crate::store::{DataError, MarketStore, MetricsRow, TradeRow};

use super::config::EngineConfig;
use super::{BacktestResult, EngineError};

/// The default indicator columns added to every timeframe's frame.
///
/// Column names are the vocabulary strategies and reports program against.
pub fn default_indicator_set() -> Vec<(&'static str, Box<dyn Indicator>)> {
    vec![
        ("rsi", Box::new(Rsi::new(14))),
        ("upper_band", Box::new(Bollinger::upper(20, 2.0))),
        ("middle_band", Box::new(Bollinger::middle(20, 2.0))),
        ("lower_band", Box::new(Bollinger::lower(20, 2.0))),
        ("macd_line", Box::new(Macd::line(12, 26, 9))),
        ("signal_line", Box::new(Macd::signal(12, 26, 9))),
        ("macd_histogram", Box::new(Macd::histogram(12, 26, 9))),
        ("sma_20", Box::new(Sma::new(20))),
        ("sma_50", Box::new(Sma::new(50))),
        ("ema_20", Box::new(Ema::new(20))),
        ("atr", Box::new(Atr::new(14))),
        ("adx", Box::new(Adx::new(14))),
    ]
}

/// Bars consumed before every default column has a defined value.
pub fn default_warmup() -> usize {
    default_indicator_set()
        .iter()
        .map(|(_, ind)| ind.lookback())
        .max()
        .unwrap_or(0)
}

/// Backtest engine for one symbol over one or more timeframes.
///
/// The first timeframe is primary: it drives the replay loop. Market data
/// is loaded once at construction and read-only afterwards.
pub struct BacktestEngine {
    symbol: String,
    timeframes: Vec<Timeframe>,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    market_data: BTreeMap<Timeframe, IndicatorFrame>,
    config: EngineConfig,
    store: Arc<dyn MarketStore>,
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("symbol", &self.symbol)
            .field("timeframes", &self.timeframes)
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BacktestEngine {
    /// Build an engine: load bars per timeframe, sort, dedup, annotate.
    ///
    /// Fails with `DataError::NoData` if any requested timeframe has zero
    /// bars in [start_date, end_date].
    pub fn new(
        store: Arc<dyn MarketStore>,
        symbol: impl Into<String>,
        timeframes: Vec<Timeframe>,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        assert!(!timeframes.is_empty(), "at least one timeframe is required");
        let symbol = symbol.into();

        let mut market_data = BTreeMap::new();
        for &timeframe in &timeframes {
            let mut bars = store.load_bars(&symbol, timeframe, start_date, end_date)?;
            let dropped = sort_and_dedup(&mut bars);
            if dropped > 0 {
                warn!(symbol = %symbol, timeframe = %timeframe, dropped, "dropped duplicate bars");
            }
            if bars.is_empty() {
                return Err(DataError::NoData {
                    symbol,
                    timeframe,
                    start: start_date,
                    end: end_date,
                }
                .into());
            }
            let frame = annotate(IndicatorFrame::from_bars(bars));
            market_data.insert(timeframe, frame);
        }

        info!(
            symbol = %symbol,
            timeframes = timeframes.len(),
            primary_bars = market_data[&timeframes[0]].len(),
            "engine ready"
        );

        Ok(Self {
            symbol,
            timeframes,
            start_date,
            end_date,
            market_data,
            config,
            store,
        })
    }

    /// Annotate a frame with the default indicator columns.
    ///
    /// Returns a new frame; the input is untouched, and annotating an
    /// already-annotated frame yields identical columns (the computation
    /// reads only bars).
    pub fn add_indicators(&self, frame: &IndicatorFrame) -> IndicatorFrame {
        annotate_from(frame)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn primary_timeframe(&self) -> Timeframe {
        self.timeframes[0]
    }

    pub fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDateTime {
        self.end_date
    }

    pub fn market_data(&self) -> &BTreeMap<Timeframe, IndicatorFrame> {
        &self.market_data
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn primary_frame(&self) -> &IndicatorFrame {
        &self.market_data[&self.timeframes[0]]
    }

    /// Persist a run: every trade leg as a string-serialized row, then the
    /// aggregate metrics.
    pub fn save_results(
        &self,
        results: &BacktestResult,
        strategy_name: &str,
    ) -> Result<(), EngineError> {
        for trade in &results.trades {
            let row = TradeRow::from_trade(trade, strategy_name);
            self.store.insert_trade(&row)?;
        }
        let row = MetricsRow {
            symbol: results.symbol.clone(),
            strategy: strategy_name.to_string(),
            timeframes: results.timeframes.iter().map(|tf| tf.to_string()).collect(),
            start_date: to_iso(&results.start_date),
            end_date: to_iso(&results.end_date),
            initial_capital: results.initial_capital,
            final_equity: results.final_equity,
            total_return_pct: results.total_return_pct,
            total_trades: results.total_trades,
            win_rate: results.win_rate,
            max_drawdown: results.max_drawdown,
            sharpe_ratio: results.sharpe_ratio,
            sortino_ratio: results.sortino_ratio,
            calmar_ratio: results.calmar_ratio,
            profit_factor: results.profit_factor,
            expectancy: results.expectancy,
            volatility: results.volatility,
        };
        self.store.store_performance_metrics(&row)?;
        Ok(())
    }
}

fn annotate(frame: IndicatorFrame) -> IndicatorFrame {
    annotate_from(&frame)
}

fn annotate_from(frame: &IndicatorFrame) -> IndicatorFrame {
    let mut out = IndicatorFrame::from_bars(frame.bars().to_vec());
    for (column, indicator) in default_indicator_set() {
        out.set_column(column, indicator.compute(frame.bars()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn seeded_store(n: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let closes: Vec<f64> = (0..n).map(|i| 20_000.0 + (i as f64 * 0.37).sin() * 300.0).collect();
        let mut bars = make_bars(&closes);
        let base = ts(1, 0);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.symbol = "BTCUSDT".into();
            bar.timestamp = base + chrono::Duration::hours(i as i64);
        }
        store
            .store_market_data(&bars, "BTCUSDT", Timeframe::H1)
            .unwrap();
        store
    }

    #[test]
    fn construction_loads_and_annotates() {
        let store = seeded_store(120);
        let engine = BacktestEngine::new(
            store,
            "BTCUSDT",
            vec![Timeframe::H1],
            ts(1, 0),
            ts(31, 0),
            EngineConfig::default(),
        )
        .unwrap();

        let frame = &engine.market_data()[&Timeframe::H1];
        assert_eq!(frame.len(), 120);
        for column in [
            "rsi",
            "upper_band",
            "middle_band",
            "lower_band",
            "macd_line",
            "signal_line",
            "macd_histogram",
            "sma_20",
            "sma_50",
            "ema_20",
            "atr",
            "adx",
        ] {
            assert!(frame.has_column(column), "missing column {column}");
        }
    }

    #[test]
    fn construction_fails_without_data() {
        let store = Arc::new(MemoryStore::new());
        let err = BacktestEngine::new(
            store,
            "BTCUSDT",
            vec![Timeframe::H1],
            ts(1, 0),
            ts(31, 0),
            EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Data(DataError::NoData { .. })));
    }

    #[test]
    fn add_indicators_is_idempotent_and_nonmutating() {
        let store = seeded_store(120);
        let engine = BacktestEngine::new(
            store,
            "BTCUSDT",
            vec![Timeframe::H1],
            ts(1, 0),
            ts(31, 0),
            EngineConfig::default(),
        )
        .unwrap();

        let plain = IndicatorFrame::from_bars(engine.primary_frame().bars().to_vec());
        let once = engine.add_indicators(&plain);
        let twice = engine.add_indicators(&once);

        assert!(!plain.has_column("rsi"), "input must not be mutated");
        let a = once.column("rsi").unwrap();
        let b = twice.column("rsi").unwrap();
        assert_eq!(a.len(), b.len());
        for i in 0..a.len() {
            assert!(
                (a[i].is_nan() && b[i].is_nan()) || a[i] == b[i],
                "rsi differs at {i}"
            );
        }
    }

    #[test]
    fn default_warmup_covers_longest_indicator() {
        // sma_50 has the longest lookback in the default set
        assert_eq!(default_warmup(), 49);
    }
}
