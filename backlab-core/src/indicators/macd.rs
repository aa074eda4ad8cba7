//! MACD — Moving Average Convergence/Divergence.
//!
//! macd_line = EMA(close, fast) - EMA(close, slow)
//! signal_line = EMA(macd_line, signal)
//! histogram = macd_line - signal_line
//!
//! The three series are exposed as separate named instances, same pattern
//! as the Bollinger bands. Lookbacks: line = slow - 1,
//! signal/histogram = slow + signal - 2 (signal EMA seeds on the first
//! `signal` valid line values).

use crate::domain::Bar;
use crate::indicators::ema::ema_of_series;
use crate::indicators::Indicator;

/// Which MACD series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdSeries {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    series: MacdSeries,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, series: MacdSeries) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        let suffix = match series {
            MacdSeries::Line => "line",
            MacdSeries::Signal => "signal",
            MacdSeries::Histogram => "histogram",
        };
        Self {
            fast,
            slow,
            signal,
            series,
            name: format!("macd_{suffix}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdSeries::Line)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdSeries::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdSeries::Histogram)
    }

    fn line_series(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        fast.iter()
            .zip(&slow)
            .map(|(f, s)| {
                if f.is_nan() || s.is_nan() {
                    f64::NAN
                } else {
                    f - s
                }
            })
            .collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.series {
            MacdSeries::Line => self.slow - 1,
            MacdSeries::Signal | MacdSeries::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let line = self.line_series(&closes);
        match self.series {
            MacdSeries::Line => line,
            MacdSeries::Signal => ema_of_series(&line, self.signal),
            MacdSeries::Histogram => {
                let signal = ema_of_series(&line, self.signal);
                line.iter()
                    .zip(&signal)
                    .map(|(l, s)| {
                        if l.is_nan() || s.is_nan() {
                            f64::NAN
                        } else {
                            l - s
                        }
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn line_is_fast_minus_slow_ema() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let line = Macd::line(3, 6, 2).compute(&bars);
        let fast = ema_of_series(&closes, 3);
        let slow = ema_of_series(&closes, 6);
        for i in 5..20 {
            assert_approx(line[i], fast[i] - slow[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0)
            .collect();
        let bars = make_bars(&closes);
        let line = Macd::line(3, 6, 2).compute(&bars);
        let signal = Macd::signal(3, 6, 2).compute(&bars);
        let histogram = Macd::histogram(3, 6, 2).compute(&bars);
        for i in 0..30 {
            if histogram[i].is_nan() {
                continue;
            }
            assert_approx(histogram[i], line[i] - signal[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn warmup_matches_lookback() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        for macd in [
            Macd::line(12, 26, 9),
            Macd::signal(12, 26, 9),
            Macd::histogram(12, 26, 9),
        ] {
            let result = macd.compute(&bars);
            let lookback = macd.lookback();
            for (i, v) in result.iter().enumerate() {
                if i < lookback {
                    assert!(v.is_nan(), "{}: expected NaN at {i}", macd.name());
                } else {
                    assert!(!v.is_nan(), "{}: expected value at {i}", macd.name());
                }
            }
        }
    }

    #[test]
    fn steady_trend_has_positive_histogram_line() {
        // In a steady uptrend the fast EMA sits above the slow EMA
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + 2.0 * i as f64).collect();
        let bars = make_bars(&closes);
        let line = Macd::line(3, 6, 2).compute(&bars);
        assert!(line[20] > 0.0);
    }

    #[test]
    #[should_panic(expected = "fast period must be shorter")]
    fn rejects_inverted_periods() {
        let _ = Macd::line(26, 12, 9);
    }
}
