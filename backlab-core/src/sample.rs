//! Deterministic synthetic market data.
//!
//! A seeded LCG random walk keeps fixtures reproducible without an RNG
//! dependency. Used by integration tests and benches; also handy for
//! seeding a store when wiring the engine up for the first time.

use chrono::NaiveDateTime;

use crate::domain::{Bar, Timeframe};

/// Generate `n` bars of plausible OHLCV data starting at `start`.
///
/// The walk is fully determined by `seed`; equal inputs give equal bars.
pub fn sample_bars(
    symbol: &str,
    timeframe: Timeframe,
    start: NaiveDateTime,
    n: usize,
    seed: u64,
) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(n);
    let mut price = 20_000.0_f64;
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);

    for i in 0..n {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let change = ((state >> 33) % 2001) as f64 - 1000.0; // -1000..=1000
        price += change * 0.1;
        price = price.max(1_000.0);

        let open = price - 5.0;
        let close = price + 3.0;
        let high = open.max(close) + 20.0;
        let low = open.min(close) - 20.0;
        let volume = 50.0 + ((state >> 17) % 100) as f64;

        bars.push(Bar {
            symbol: symbol.to_string(),
            timeframe,
            timestamp: start + timeframe.duration() * i as i32,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    bars
}
