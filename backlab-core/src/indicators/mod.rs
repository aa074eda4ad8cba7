//! Technical indicator library.
//!
//! Indicators are pure transforms: bar history in, numeric series of the
//! same length out, NaN during warmup. They are computed once per frame
//! when the engine annotates market data; nothing is recomputed per bar.
//!
//! Multi-series indicators (Bollinger, MACD) are exposed as separate named
//! instances per series so the single-series `Indicator` trait stays
//! unchanged.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars` whose first
/// `lookback()` values are `f64::NAN`.
///
/// # Causality
/// No value at bar t may depend on data from bar t+1 or later. Every
/// indicator must pass the truncated-vs-full series test in
/// `tests/lookahead_test.rs`.
pub trait Indicator: Send + Sync {
    /// Name, e.g. "sma_20", "rsi_14".
    fn name(&self) -> &str;

    /// Number of bars consumed before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic hourly bars from close prices for testing.
///
/// Open = previous close (or close for the first bar), high/low bracket
/// open and close by 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use crate::domain::Timeframe;
    let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                timeframe: Timeframe::H1,
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// `make_bars` wrapped into an `IndicatorFrame`, for tests that need views.
#[cfg(test)]
pub fn make_bars_frame(closes: &[f64]) -> crate::domain::IndicatorFrame {
    crate::domain::IndicatorFrame::from_bars(make_bars(closes))
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
