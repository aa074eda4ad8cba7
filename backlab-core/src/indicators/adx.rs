//! ADX — Average Directional Index (Wilder).
//!
//! +DM/-DM from consecutive bars, Wilder-smoothed along with TR into
//! +DI/-DI, DX = 100 * |+DI - -DI| / (+DI + -DI), ADX = smoothed DX.
//! Lookback: 2 * period.

use crate::domain::Bar;
use crate::indicators::atr::{true_range, wilder_smooth};
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        if n < 2 {
            return vec![f64::NAN; n];
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            if bars[i].high.is_nan()
                || bars[i].low.is_nan()
                || bars[i - 1].high.is_nan()
                || bars[i - 1].low.is_nan()
            {
                continue;
            }
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let smooth_tr = wilder_smooth(&true_range(bars), self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            if smooth_tr[i].is_nan()
                || smooth_plus[i].is_nan()
                || smooth_minus[i].is_nan()
                || smooth_tr[i] == 0.0
            {
                continue;
            }
            let plus_di = 100.0 * smooth_plus[i] / smooth_tr[i];
            let minus_di = 100.0 * smooth_minus[i] / smooth_tr[i];
            let di_sum = plus_di + minus_di;
            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            };
        }

        wilder_smooth(&dx, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;

    fn trending_bars(n: usize) -> Vec<Bar> {
        let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + 2.0 * i as f64;
                Bar {
                    symbol: "TEST".to_string(),
                    timeframe: Timeframe::H1,
                    timestamp: base + chrono::Duration::hours(i as i64),
                    open: close - 1.0,
                    high: close + 1.0,
                    low: close - 2.0,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[test]
    fn adx_bounds() {
        let result = Adx::new(3).compute(&trending_bars(30));
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn adx_high_in_steady_trend() {
        // A clean uptrend has all directional movement on the plus side
        let result = Adx::new(3).compute(&trending_bars(30));
        let last = *result.last().unwrap();
        assert!(last > 50.0, "steady trend should read high ADX, got {last}");
    }

    #[test]
    fn adx_warmup_is_nan() {
        // TR starts at index 1, DI smoothing seeds at 3, DX smoothing at 5
        let result = Adx::new(3).compute(&trending_bars(30));
        for v in result.iter().take(5) {
            assert!(v.is_nan());
        }
    }

    #[test]
    fn adx_lookback() {
        assert_eq!(Adx::new(14).lookback(), 28);
    }
}
