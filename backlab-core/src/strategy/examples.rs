//! Reference strategies.
//!
//! Small, dependency-free decision rules used by the integration tests and
//! as starting points for real strategies. Both read only the annotated
//! indicator columns of the view they are given.

use super::{MarketView, Signal, StrategyDecision, StrategyError};

/// Moving-average crossover on the primary timeframe.
///
/// Buy when the short SMA crosses above the long SMA on the latest bar,
/// sell on the opposite cross, hold otherwise.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    short_column: String,
    long_column: String,
    name: String,
}

impl SmaCrossover {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        assert!(
            short_period < long_period,
            "short period must be below long period"
        );
        Self {
            short_column: format!("sma_{short_period}"),
            long_column: format!("sma_{long_period}"),
            name: format!("sma_crossover_{short_period}_{long_period}"),
        }
    }
}

impl StrategyDecision for SmaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, view: &MarketView<'_>, _symbol: &str) -> Result<Signal, StrategyError> {
        let frame = view.primary();
        let n = frame.len();
        if n < 2 {
            return Ok(Signal::Hold);
        }

        let short = frame
            .column(&self.short_column)
            .ok_or_else(|| StrategyError(format!("missing column '{}'", self.short_column)))?;
        let long = frame
            .column(&self.long_column)
            .ok_or_else(|| StrategyError(format!("missing column '{}'", self.long_column)))?;

        let (ps, pl) = (short[n - 2], long[n - 2]);
        let (cs, cl) = (short[n - 1], long[n - 1]);
        if ps.is_nan() || pl.is_nan() || cs.is_nan() || cl.is_nan() {
            return Ok(Signal::Hold);
        }

        if ps <= pl && cs > cl {
            Ok(Signal::Buy)
        } else if ps >= pl && cs < cl {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }
}

/// RSI threshold reversal on the primary timeframe.
///
/// Buy when RSI crosses up out of the oversold zone, sell when it crosses
/// down out of the overbought zone.
#[derive(Debug, Clone)]
pub struct RsiReversal {
    oversold: f64,
    overbought: f64,
    name: String,
}

impl RsiReversal {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        assert!(oversold < overbought, "oversold must be below overbought");
        Self {
            oversold,
            overbought,
            name: format!("rsi_reversal_{oversold:.0}_{overbought:.0}"),
        }
    }
}

impl Default for RsiReversal {
    fn default() -> Self {
        Self::new(30.0, 70.0)
    }
}

impl StrategyDecision for RsiReversal {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, view: &MarketView<'_>, _symbol: &str) -> Result<Signal, StrategyError> {
        let frame = view.primary();
        let n = frame.len();
        if n < 2 {
            return Ok(Signal::Hold);
        }
        let rsi = match frame.column("rsi") {
            Some(col) => col,
            None => return Ok(Signal::Hold),
        };

        let prev = rsi[n - 2];
        let curr = rsi[n - 1];
        if prev.is_nan() || curr.is_nan() {
            return Ok(Signal::Hold);
        }

        if prev < self.oversold && curr > self.oversold {
            Ok(Signal::Buy)
        } else if prev > self.overbought && curr < self.overbought {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }
}
