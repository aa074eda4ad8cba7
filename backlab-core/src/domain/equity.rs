//! Equity curve point.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Mark-to-market account state at one primary-timeframe bar.
///
/// The curve holds exactly one point per primary bar, strictly increasing
/// by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    /// Open position quantity at this bar (0.0 while flat).
    pub position_size: f64,
    /// Drawdown from the running equity peak, in percent (<= 0).
    pub drawdown: Option<f64>,
    /// Single-bar return versus the previous point (fractional).
    pub period_return: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn equity_point_roundtrip() {
        let point = EquityPoint {
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            equity: 10_500.0,
            position_size: 0.5,
            drawdown: Some(-2.5),
            period_return: Some(0.001),
        };
        let json = serde_json::to_string(&point).unwrap();
        let back: EquityPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
    }
}
