//! Bar-by-bar replay loop.
//!
//! Per primary bar:
//! 1. Advance every secondary timeframe's cursor to the last bar whose
//!    timestamp is <= the primary bar's timestamp.
//! 2. After warmup, hand the strategy a `MarketView` truncated to those
//!    cursors and apply its signal (Buy opens while flat, Sell closes
//!    while long, everything else is a no-op).
//! 3. Mark the account to market at the bar's close and append an equity
//!    point.
//!
//! The view truncation is the no-lookahead guarantee: the strategy cannot
//! reach a bar the cursor has not passed. A position still open after the
//! last bar is force-closed at that bar's close, so the trade list, the
//! equity curve, and the metrics agree.

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::{EquityPoint, Trade};
use crate::metrics::Metrics;
use crate::strategy::{MarketView, Signal, StrategyDecision};

use super::engine::{default_warmup, BacktestEngine};
use super::{BacktestResult, EngineError};

/// An open long position.
struct OpenPosition {
    quantity: f64,
    entry: Trade,
}

impl BacktestEngine {
    /// Replay the primary timeframe through `strategy`.
    ///
    /// A strategy error aborts the run; no partial result is returned and
    /// the engine itself stays untouched (all run state is local).
    pub fn run_backtest(
        &self,
        strategy: &dyn StrategyDecision,
    ) -> Result<BacktestResult, EngineError> {
        let primary_tf = self.primary_timeframe();
        let primary = self.primary_frame();
        let n = primary.len();
        let warmup = default_warmup();
        let config = self.config();

        let mut cash = config.initial_capital;
        let mut position: Option<OpenPosition> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(n);
        let mut trade_seq: u64 = 0;
        let mut peak_equity = config.initial_capital;

        // One cursor per secondary timeframe: number of bars visible so far.
        let mut cursors: BTreeMap<_, usize> = self
            .timeframes()
            .iter()
            .skip(1)
            .map(|&tf| (tf, 0usize))
            .collect();

        for i in 0..n {
            let bar = primary.bar(i);
            let ts = bar.timestamp;

            for (&tf, cursor) in cursors.iter_mut() {
                let frame = &self.market_data()[&tf];
                while *cursor < frame.len() && frame.bar(*cursor).timestamp <= ts {
                    *cursor += 1;
                }
            }

            if i >= warmup {
                let mut frames = BTreeMap::new();
                frames.insert(primary_tf, primary.view(i + 1));
                for (&tf, &cursor) in cursors.iter() {
                    frames.insert(tf, self.market_data()[&tf].view(cursor));
                }
                let view = MarketView::new(frames, primary_tf);

                let signal = strategy.decide(&view, self.symbol())?;
                match (signal, position.is_some()) {
                    (Signal::Buy, false) => {
                        // Commit a fixed fraction of current equity; the
                        // commission comes out of the committed amount.
                        let budget = cash * config.position_fraction;
                        let commission = budget * config.commission_rate;
                        let quantity = (budget - commission) / bar.close;
                        if quantity > 0.0 {
                            trade_seq += 1;
                            let entry = Trade::entry(
                                trade_seq.to_string(),
                                self.symbol(),
                                ts,
                                bar.close,
                                quantity,
                                commission,
                            )
                            .expect("canonical timestamp");
                            cash -= entry.value + commission;
                            position = Some(OpenPosition {
                                quantity,
                                entry: entry.clone(),
                            });
                            trades.push(entry);
                        }
                    }
                    (Signal::Sell, true) => {
                        let open = position.take().expect("checked above");
                        trade_seq += 1;
                        let commission = open.quantity * bar.close * config.commission_rate;
                        let exit = Trade::exit_from(
                            &open.entry,
                            trade_seq.to_string(),
                            ts,
                            bar.close,
                            commission,
                        )
                        .expect("canonical timestamp");
                        cash += exit.value - commission;
                        trades.push(exit);
                    }
                    // Buy while long, Sell while flat, Hold: no-ops.
                    _ => {}
                }
            }

            // Mark to market at the close.
            let equity = cash
                + position
                    .as_ref()
                    .map(|p| p.quantity * bar.close)
                    .unwrap_or(0.0);
            if equity > peak_equity {
                peak_equity = equity;
            }
            let drawdown = if peak_equity > 0.0 {
                (equity / peak_equity - 1.0) * 100.0
            } else {
                0.0
            };
            let period_return = equity_curve.last().map(|prev: &EquityPoint| {
                if prev.equity > 0.0 {
                    (equity - prev.equity) / prev.equity
                } else {
                    0.0
                }
            });
            equity_curve.push(EquityPoint {
                timestamp: ts,
                equity,
                position_size: position.as_ref().map(|p| p.quantity).unwrap_or(0.0),
                drawdown: Some(drawdown),
                period_return,
            });
        }

        // Force-close policy: a position left open after the last bar is
        // closed at that bar's close.
        if let Some(open) = position.take() {
            let last = primary.bar(n - 1);
            trade_seq += 1;
            let commission = open.quantity * last.close * config.commission_rate;
            let exit = Trade::exit_from(
                &open.entry,
                trade_seq.to_string(),
                last.timestamp,
                last.close,
                commission,
            )
            .expect("canonical timestamp");
            cash += exit.value - commission;
            trades.push(exit);

            if let Some(last_point) = equity_curve.last_mut() {
                last_point.equity = cash;
                last_point.position_size = 0.0;
            }
        }

        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let closed: Vec<&Trade> = trades.iter().filter(|t| !t.entry_point).collect();
        let metrics = Metrics::compute(
            &equity_values,
            &closed,
            config.initial_capital,
            primary_tf,
        );

        let mut result = BacktestResult {
            symbol: self.symbol().to_string(),
            strategy_name: strategy.name().to_string(),
            timeframes: self.timeframes().to_vec(),
            start_date: self.start_date(),
            end_date: self.end_date(),
            initial_capital: config.initial_capital,
            final_equity: equity_values.last().copied().unwrap_or(config.initial_capital),
            total_profit: 0.0,
            total_return_pct: 0.0,
            total_trades: 0,
            win_count: 0,
            loss_count: 0,
            win_rate: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            calmar_ratio: 0.0,
            profit_factor: 0.0,
            expectancy: 0.0,
            volatility: 0.0,
            trades,
            equity_curve,
        };
        result.apply_metrics(&metrics);

        info!(
            symbol = %result.symbol,
            strategy = %result.strategy_name,
            trades = result.total_trades,
            total_return_pct = result.total_return_pct,
            "backtest complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::sample::sample_bars;
    use crate::store::{MarketStore, MemoryStore};
    use crate::strategy::{FnStrategy, StrategyError};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    use crate::domain::Timeframe;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn engine_with(n: usize, timeframes: Vec<Timeframe>) -> BacktestEngine {
        let store = Arc::new(MemoryStore::new());
        for &tf in &timeframes {
            let bars = sample_bars("BTCUSDT", tf, ts(1, 0), n, 7);
            store.store_market_data(&bars, "BTCUSDT", tf).unwrap();
        }
        BacktestEngine::new(
            store,
            "BTCUSDT",
            timeframes,
            ts(1, 0),
            ts(31, 0),
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn hold_strategy_trades_nothing() {
        let engine = engine_with(120, vec![Timeframe::H1]);
        let strategy = FnStrategy::new("hold", |_, _| Ok(Signal::Hold));
        let result = engine.run_backtest(&strategy).unwrap();

        assert_eq!(result.total_trades, 0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.profit_factor, 0.0);
        assert_eq!(result.final_equity, result.initial_capital);
        assert!(result.equity_curve.iter().all(|p| p.equity == 10_000.0));
    }

    #[test]
    fn equity_curve_matches_primary_bars_one_to_one() {
        let engine = engine_with(120, vec![Timeframe::H1]);
        let strategy = FnStrategy::new("hold", |_, _| Ok(Signal::Hold));
        let result = engine.run_backtest(&strategy).unwrap();

        let frame = &engine.market_data()[&Timeframe::H1];
        assert_eq!(result.equity_curve.len(), frame.len());
        for (point, bar) in result.equity_curve.iter().zip(frame.bars()) {
            assert_eq!(point.timestamp, bar.timestamp);
        }
        assert!(result
            .equity_curve
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn buy_then_sell_produces_round_trip() {
        let engine = engine_with(120, vec![Timeframe::H1]);
        // Buy on the first decided bar, sell 10 bars later.
        let strategy = FnStrategy::new("one_shot", |view: &MarketView<'_>, _: &str| {
            match view.primary().len() {
                50 => Ok(Signal::Buy),
                60 => Ok(Signal::Sell),
                _ => Ok(Signal::Hold),
            }
        });
        let result = engine.run_backtest(&strategy).unwrap();

        assert_eq!(result.trades.len(), 2);
        let entry = &result.trades[0];
        let exit = &result.trades[1];
        assert!(entry.entry_point);
        assert!(!exit.entry_point);
        assert_eq!(exit.entry_price, Some(entry.price));
        // Accounting identity of the round trip
        let expected = exit.value - entry.value - (entry.commission + exit.commission);
        assert!((exit.profit_loss - expected).abs() < 1e-9);
        assert!((exit.roi_pct - expected / entry.value * 100.0).abs() < 1e-9);
        // Cash conservation: final equity = initial + sum of realized pnl
        assert!(
            (result.final_equity - (result.initial_capital + exit.profit_loss)).abs() < 1e-6
        );
        assert_eq!(result.total_trades, 1);
    }

    #[test]
    fn redundant_signals_are_no_ops() {
        let engine = engine_with(120, vec![Timeframe::H1]);
        // Sell while flat, then buy twice in a row.
        let strategy = FnStrategy::new("noisy", |view: &MarketView<'_>, _: &str| {
            match view.primary().len() {
                50 => Ok(Signal::Sell),
                55 | 56 => Ok(Signal::Buy),
                _ => Ok(Signal::Hold),
            }
        });
        let result = engine.run_backtest(&strategy).unwrap();
        // One entry (the second Buy ignored), force-closed at the end
        assert_eq!(result.trades.len(), 2);
        assert!(result.trades[0].entry_point);
    }

    #[test]
    fn open_position_is_force_closed_at_final_bar() {
        let engine = engine_with(120, vec![Timeframe::H1]);
        let strategy = FnStrategy::new("buy_and_hold", |view: &MarketView<'_>, _: &str| {
            if view.primary().len() == 50 {
                Ok(Signal::Buy)
            } else {
                Ok(Signal::Hold)
            }
        });
        let result = engine.run_backtest(&strategy).unwrap();

        assert_eq!(result.trades.len(), 2);
        let exit = result.trades.last().unwrap();
        let last_bar_ts = engine.market_data()[&Timeframe::H1]
            .bars()
            .last()
            .unwrap()
            .timestamp;
        assert_eq!(exit.timestamp, last_bar_ts);
        // Flat after the forced exit
        let last_point = result.equity_curve.last().unwrap();
        assert_eq!(last_point.position_size, 0.0);
        assert!((last_point.equity - result.final_equity).abs() < 1e-9);
    }

    #[test]
    fn strategy_error_aborts_run() {
        let engine = engine_with(120, vec![Timeframe::H1]);
        let strategy = FnStrategy::new("broken", |view: &MarketView<'_>, _: &str| {
            if view.primary().len() >= 60 {
                Err(StrategyError("synthetic failure".into()))
            } else {
                Ok(Signal::Hold)
            }
        });
        let err = engine.run_backtest(&strategy).unwrap_err();
        assert!(matches!(err, EngineError::Strategy(_)));
    }

    #[test]
    fn secondary_timeframe_never_sees_the_future() {
        let engine = engine_with(240, vec![Timeframe::H1, Timeframe::H4]);
        let strategy = FnStrategy::new("causal_check", |view: &MarketView<'_>, _: &str| {
            let now = view.primary().last_bar().expect("non-empty").timestamp;
            if let Some(h4) = view.frame(Timeframe::H4) {
                if let Some(last) = h4.last_bar() {
                    assert!(last.timestamp <= now, "H4 view leaked a future bar");
                }
            }
            Ok(Signal::Hold)
        });
        engine.run_backtest(&strategy).unwrap();
    }
}
