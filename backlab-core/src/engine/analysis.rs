//! Multi-timeframe analysis.
//!
//! Condenses each timeframe's latest indicator readings into a snapshot
//! and aggregates the snapshots into a consolidated cross-timeframe view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{IndicatorFrame, Timeframe};

use super::engine::BacktestEngine;

/// Bollinger-width percentile cutoffs for the volatility bands.
const LOW_VOL_PERCENTILE: f64 = 0.25;
const HIGH_VOL_PERCENTILE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityBand {
    Low,
    Normal,
    High,
}

/// Latest readings for one timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeSnapshot {
    pub rsi: f64,
    pub macd_histogram: f64,
    /// Close position inside the Bollinger channel, clipped to [0, 1].
    pub bb_position: f64,
    pub trend: Trend,
    pub volatility: VolatilityBand,
}

/// Cross-timeframe aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsolidatedView {
    pub bullish_timeframes: Vec<Timeframe>,
    pub bearish_timeframes: Vec<Timeframe>,
    pub high_volatility_timeframes: Vec<Timeframe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiTimeframeAnalysis {
    pub timeframes: BTreeMap<Timeframe, TimeframeSnapshot>,
    pub consolidated: ConsolidatedView,
}

impl BacktestEngine {
    /// Snapshot every timeframe and consolidate.
    pub fn multi_timeframe_analysis(&self) -> MultiTimeframeAnalysis {
        let mut timeframes = BTreeMap::new();
        let mut consolidated = ConsolidatedView::default();

        for (&tf, frame) in self.market_data() {
            let snapshot = snapshot_frame(frame);
            match snapshot.trend {
                Trend::Bullish => consolidated.bullish_timeframes.push(tf),
                Trend::Bearish => consolidated.bearish_timeframes.push(tf),
                Trend::Neutral => {}
            }
            if snapshot.volatility == VolatilityBand::High {
                consolidated.high_volatility_timeframes.push(tf);
            }
            timeframes.insert(tf, snapshot);
        }

        MultiTimeframeAnalysis {
            timeframes,
            consolidated,
        }
    }
}

fn snapshot_frame(frame: &IndicatorFrame) -> TimeframeSnapshot {
    let last = frame.len().saturating_sub(1);
    let value = |name: &str| -> f64 {
        frame
            .column(name)
            .and_then(|col| col.get(last).copied())
            .unwrap_or(f64::NAN)
    };

    let rsi = value("rsi");
    let macd_histogram = value("macd_histogram");
    let close = frame.bars().last().map(|b| b.close).unwrap_or(f64::NAN);
    let upper = value("upper_band");
    let lower = value("lower_band");

    TimeframeSnapshot {
        rsi,
        macd_histogram,
        bb_position: bb_position(close, lower, upper),
        trend: classify_trend(macd_histogram),
        volatility: classify_volatility(frame),
    }
}

/// (close - lower) / (upper - lower), clipped to [0, 1]. 0.5 when the
/// channel is degenerate or not yet defined.
fn bb_position(close: f64, lower: f64, upper: f64) -> f64 {
    let width = upper - lower;
    if close.is_nan() || width.is_nan() || width <= 0.0 {
        return 0.5;
    }
    ((close - lower) / width).clamp(0.0, 1.0)
}

fn classify_trend(macd_histogram: f64) -> Trend {
    if macd_histogram.is_nan() || macd_histogram == 0.0 {
        Trend::Neutral
    } else if macd_histogram > 0.0 {
        Trend::Bullish
    } else {
        Trend::Bearish
    }
}

/// Band the current Bollinger channel width against its own history.
///
/// Width is measured relative to the middle band; the current value's
/// percentile rank over all defined widths picks the band.
fn classify_volatility(frame: &IndicatorFrame) -> VolatilityBand {
    let (upper, middle, lower) = match (
        frame.column("upper_band"),
        frame.column("middle_band"),
        frame.column("lower_band"),
    ) {
        (Some(u), Some(m), Some(l)) => (u, m, l),
        _ => return VolatilityBand::Normal,
    };

    let widths: Vec<f64> = upper
        .iter()
        .zip(middle)
        .zip(lower)
        .filter_map(|((&u, &m), &l)| {
            if u.is_nan() || m.is_nan() || l.is_nan() || m <= 0.0 {
                None
            } else {
                Some((u - l) / m)
            }
        })
        .collect();

    let current = match widths.last() {
        Some(&w) => w,
        None => return VolatilityBand::Normal,
    };
    if widths.len() < 2 {
        return VolatilityBand::Normal;
    }

    let below = widths.iter().filter(|&&w| w < current).count();
    let rank = below as f64 / widths.len() as f64;
    if rank < LOW_VOL_PERCENTILE {
        VolatilityBand::Low
    } else if rank > HIGH_VOL_PERCENTILE {
        VolatilityBand::High
    } else {
        VolatilityBand::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::make_bars;

    fn frame_with_columns(closes: &[f64], hist_last: f64, widths: &[f64]) -> IndicatorFrame {
        let bars: Vec<Bar> = make_bars(closes);
        let n = bars.len();
        let mut frame = IndicatorFrame::from_bars(bars);
        frame.set_column("rsi", vec![55.0; n]);
        let mut hist = vec![0.0; n];
        hist[n - 1] = hist_last;
        frame.set_column("macd_histogram", hist);
        // Bands centered on 100 with the given half-widths
        assert_eq!(widths.len(), n);
        frame.set_column("middle_band", vec![100.0; n]);
        frame.set_column(
            "upper_band",
            widths.iter().map(|w| 100.0 + w / 2.0).collect::<Vec<_>>(),
        );
        frame.set_column(
            "lower_band",
            widths.iter().map(|w| 100.0 - w / 2.0).collect::<Vec<_>>(),
        );
        frame
    }

    #[test]
    fn bb_position_clips_and_guards() {
        assert_eq!(bb_position(105.0, 90.0, 110.0), 0.75);
        assert_eq!(bb_position(200.0, 90.0, 110.0), 1.0);
        assert_eq!(bb_position(0.0, 90.0, 110.0), 0.0);
        // Degenerate channel
        assert_eq!(bb_position(100.0, 100.0, 100.0), 0.5);
        assert_eq!(bb_position(100.0, f64::NAN, f64::NAN), 0.5);
    }

    #[test]
    fn trend_follows_histogram_sign() {
        assert_eq!(classify_trend(1.5), Trend::Bullish);
        assert_eq!(classify_trend(-0.2), Trend::Bearish);
        assert_eq!(classify_trend(0.0), Trend::Neutral);
        assert_eq!(classify_trend(f64::NAN), Trend::Neutral);
    }

    #[test]
    fn widening_channel_reads_high_volatility() {
        let n = 40;
        let closes = vec![100.0; n];
        let widths: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
        let frame = frame_with_columns(&closes, 2.0, &widths);
        let snap = snapshot_frame(&frame);
        assert_eq!(snap.volatility, VolatilityBand::High);
        assert_eq!(snap.trend, Trend::Bullish);
    }

    #[test]
    fn narrowing_channel_reads_low_volatility() {
        let n = 40;
        let closes = vec![100.0; n];
        let widths: Vec<f64> = (0..n).map(|i| 40.0 - i as f64).collect();
        let frame = frame_with_columns(&closes, -2.0, &widths);
        let snap = snapshot_frame(&frame);
        assert_eq!(snap.volatility, VolatilityBand::Low);
        assert_eq!(snap.trend, Trend::Bearish);
    }
}
