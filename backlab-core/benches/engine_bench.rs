//! Replay-loop throughput benchmark.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use backlab_core::domain::Timeframe;
use backlab_core::engine::{BacktestEngine, EngineConfig};
use backlab_core::sample::sample_bars;
use backlab_core::store::{MarketStore, MemoryStore};
use backlab_core::strategy::examples::RsiReversal;

fn bench_engine(c: &mut Criterion) {
    let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let store = Arc::new(MemoryStore::new());
    let bars = sample_bars("BTCUSDT", Timeframe::H1, start, 5_000, 7);
    store.store_market_data(&bars, "BTCUSDT", Timeframe::H1).unwrap();
    let engine = BacktestEngine::new(
        store,
        "BTCUSDT",
        vec![Timeframe::H1],
        start,
        start + chrono::Duration::days(365),
        EngineConfig::default(),
    )
    .unwrap();
    let strategy = RsiReversal::new(40.0, 60.0);

    c.bench_function("replay_5000_bars", |b| {
        b.iter(|| engine.run_backtest(&strategy).unwrap())
    });
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
