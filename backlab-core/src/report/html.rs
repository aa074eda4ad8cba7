//! HTML performance report.
//!
//! A single self-contained document built with plain string templating:
//! a Performance Summary table, a Trade Analysis section, and a link to
//! the chart artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{BacktestEngine, BacktestResult};

use super::plot::{ChartOutput, PlotOptions};
use super::{ChartCanvas, ReportError};

/// Trade-level statistics derived for the report.
struct TradeStats {
    winning: usize,
    losing: usize,
    average_win: f64,
    average_loss: f64,
}

fn trade_stats(results: &BacktestResult) -> TradeStats {
    let wins: Vec<f64> = results
        .closed_trades()
        .filter(|t| t.profit_loss > 0.0)
        .map(|t| t.profit_loss)
        .collect();
    let losses: Vec<f64> = results
        .closed_trades()
        .filter(|t| t.profit_loss <= 0.0)
        .map(|t| t.profit_loss)
        .collect();
    let mean = |v: &[f64]| {
        if v.is_empty() {
            0.0
        } else {
            v.iter().sum::<f64>() / v.len() as f64
        }
    };
    TradeStats {
        winning: wins.len(),
        losing: losses.len(),
        average_win: mean(&wins),
        average_loss: mean(&losses),
    }
}

/// Render the report document.
pub fn render(results: &BacktestResult, chart_file: &str, trade_log_file: &str) -> String {
    let stats = trade_stats(results);
    let timeframes: Vec<String> = results.timeframes.iter().map(|t| t.to_string()).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{symbol} {strategy} backtest</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; }}
td, th {{ border: 1px solid #999; padding: 4px 10px; text-align: right; }}
th {{ background: #eee; }}
</style>
</head>
<body>
<h1>Backtest Report: {symbol} / {strategy}</h1>
<p>Timeframes: {timeframes} | Period: {start} to {end}</p>

<h2>Performance Summary</h2>
<table>
<tr><th>Metric</th><th>Value</th></tr>
<tr><td>Initial Capital</td><td>{initial_capital:.2}</td></tr>
<tr><td>Final Equity</td><td>{final_equity:.2}</td></tr>
<tr><td>Total Return</td><td>{total_return_pct:.2}%</td></tr>
<tr><td>Win Rate</td><td>{win_rate:.2}%</td></tr>
<tr><td>Max Drawdown</td><td>{max_drawdown:.2}%</td></tr>
<tr><td>Sharpe Ratio</td><td>{sharpe:.2}</td></tr>
<tr><td>Sortino Ratio</td><td>{sortino:.2}</td></tr>
<tr><td>Calmar Ratio</td><td>{calmar:.2}</td></tr>
<tr><td>Profit Factor</td><td>{profit_factor:.2}</td></tr>
<tr><td>Expectancy</td><td>{expectancy:.2}</td></tr>
<tr><td>Volatility</td><td>{volatility:.6}</td></tr>
</table>

<h2>Trade Analysis</h2>
<h3>Trade Statistics</h3>
<table>
<tr><th>Metric</th><th>Value</th></tr>
<tr><td>Total Trades</td><td>{total_trades}</td></tr>
<tr><td>Winning Trades</td><td>{winning}</td></tr>
<tr><td>Losing Trades</td><td>{losing}</td></tr>
<tr><td>Average Win</td><td>{average_win:.2}</td></tr>
<tr><td>Average Loss</td><td>{average_loss:.2}</td></tr>
</table>

<h2>Artifacts</h2>
<p><img src="{chart_file}" alt="equity and indicators"></p>
<p><a href="{trade_log_file}">Trade log (CSV)</a></p>
</body>
</html>
"#,
        symbol = results.symbol,
        strategy = results.strategy_name,
        timeframes = timeframes.join(", "),
        start = results.start_date,
        end = results.end_date,
        initial_capital = results.initial_capital,
        final_equity = results.final_equity,
        total_return_pct = results.total_return_pct,
        win_rate = results.win_rate,
        max_drawdown = results.max_drawdown,
        sharpe = results.sharpe_ratio,
        sortino = results.sortino_ratio,
        calmar = results.calmar_ratio,
        profit_factor = results.profit_factor,
        expectancy = results.expectancy,
        volatility = results.volatility,
        total_trades = results.total_trades,
        winning = stats.winning,
        losing = stats.losing,
        average_win = stats.average_win,
        average_loss = stats.average_loss,
        chart_file = chart_file,
        trade_log_file = trade_log_file,
    )
}

impl BacktestEngine {
    /// Produce the full report bundle under `output_dir`.
    ///
    /// Creates the directory (idempotent), saves the chart through
    /// `canvas`, writes the trade-log CSV, then the HTML document.
    /// Returns the HTML path, which ends with `_report.html`.
    pub fn generate_report(
        &self,
        results: &BacktestResult,
        output_dir: &Path,
        canvas: &mut dyn ChartCanvas,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(output_dir)?;

        let stem = format!("{}_{}", results.symbol, results.strategy_name);
        let chart_file = format!("{stem}_chart.svg");
        let trade_log_file = format!("{stem}_trades.csv");

        let options = PlotOptions {
            show_indicators: true,
            custom_indicators: None,
            output: ChartOutput::File(output_dir.join(&chart_file)),
        };
        self.plot_results(results, &options, canvas)?;
        self.generate_trade_log(results, Some(&output_dir.join(&trade_log_file)))?;

        let html = render(results, &chart_file, &trade_log_file);
        let report_path = output_dir.join(format!("{stem}_report.html"));
        fs::write(&report_path, html)?;
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::report::RecordingCanvas;
    use crate::sample::sample_bars;
    use crate::store::{MarketStore, MemoryStore};
    use crate::strategy::{FnStrategy, MarketView, Signal};
    use crate::domain::Timeframe;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn engine_and_result() -> (BacktestEngine, BacktestResult) {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let bars = sample_bars("BTCUSDT", Timeframe::H1, start, 150, 11);
        store.store_market_data(&bars, "BTCUSDT", Timeframe::H1).unwrap();
        let engine = BacktestEngine::new(
            store,
            "BTCUSDT",
            vec![Timeframe::H1],
            start,
            start + chrono::Duration::days(30),
            EngineConfig::default(),
        )
        .unwrap();
        let strategy = FnStrategy::new("Test_Strategy", |view: &MarketView<'_>, _: &str| {
            match view.primary().len() {
                60 | 100 => Ok(Signal::Buy),
                80 | 120 => Ok(Signal::Sell),
                _ => Ok(Signal::Hold),
            }
        });
        let result = engine.run_backtest(&strategy).unwrap();
        (engine, result)
    }

    #[test]
    fn report_contains_every_metric_label() {
        let (_, result) = engine_and_result();
        let html = render(&result, "chart.svg", "trades.csv");
        for label in [
            "Performance Summary",
            "Total Return",
            "Initial Capital",
            "Final Equity",
            "Win Rate",
            "Max Drawdown",
            "Sharpe Ratio",
            "Sortino Ratio",
            "Calmar Ratio",
            "Profit Factor",
            "Expectancy",
            "Volatility",
            "Trade Analysis",
            "Trade Statistics",
            "Winning Trades",
            "Losing Trades",
            "Average Win",
            "Average Loss",
        ] {
            assert!(html.contains(label), "missing label: {label}");
        }
        assert!(html.contains("10000.00"), "initial capital value missing");
    }

    #[test]
    fn generate_report_writes_bundle_and_returns_html_path() {
        let (engine, result) = engine_and_result();
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("reports");
        let mut canvas = RecordingCanvas::new();

        let path = engine
            .generate_report(&result, &output_dir, &mut canvas)
            .unwrap();

        assert!(path.to_string_lossy().ends_with("_report.html"));
        assert!(path.exists());
        // Plot and trade log were each produced exactly once
        assert_eq!(canvas.begins.len(), 1);
        assert!(output_dir.join("BTCUSDT_Test_Strategy_trades.csv").exists());
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Performance Summary"));
    }

    #[test]
    fn generate_report_is_idempotent_on_existing_dir() {
        let (engine, result) = engine_and_result();
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("reports");
        let mut canvas = RecordingCanvas::new();
        engine.generate_report(&result, &output_dir, &mut canvas).unwrap();
        // Second call over the same directory succeeds
        engine.generate_report(&result, &output_dir, &mut canvas).unwrap();
    }

    #[test]
    fn average_win_and_loss_come_from_closed_trades() {
        let (_, result) = engine_and_result();
        let stats = trade_stats(&result);
        assert_eq!(stats.winning + stats.losing, result.total_trades);
        if stats.winning > 0 {
            assert!(stats.average_win > 0.0);
        }
        if stats.losing > 0 {
            assert!(stats.average_loss <= 0.0);
        }
    }
}
