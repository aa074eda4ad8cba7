//! Trade — one leg of a round trip (entry or exit).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timestamp::{canonicalize, RawTimestamp, TimestampError};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// One executed trade leg.
///
/// A closed round trip is an ordered (entry, exit) pair: the entry leg has
/// `entry_point = true` and zero profit; the exit leg carries the entry
/// price and the realized profit/ROI of the pair:
///
/// profit_loss = exit.value - entry.value - (entry.commission + exit.commission)
/// roi_pct = profit_loss / entry.value * 100
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub symbol: String,
    pub side: Side,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub quantity: f64,
    /// Notional: price * quantity.
    pub value: f64,
    pub commission: f64,
    pub entry_point: bool,
    /// Entry price of the round trip; set on the closing leg only.
    pub entry_price: Option<f64>,
    pub profit_loss: f64,
    pub roi_pct: f64,
}

impl Trade {
    /// Construct the opening leg of a round trip.
    ///
    /// The timestamp is canonicalized from any accepted representation.
    pub fn entry(
        trade_id: impl Into<String>,
        symbol: impl Into<String>,
        timestamp: impl Into<RawTimestamp>,
        price: f64,
        quantity: f64,
        commission: f64,
    ) -> Result<Self, TimestampError> {
        Ok(Self {
            trade_id: trade_id.into(),
            symbol: symbol.into(),
            side: Side::Buy,
            timestamp: canonicalize(timestamp.into())?,
            price,
            quantity,
            value: price * quantity,
            commission,
            entry_point: true,
            entry_price: None,
            profit_loss: 0.0,
            roi_pct: 0.0,
        })
    }

    /// Construct the closing leg of a round trip, realizing profit against `entry`.
    pub fn exit_from(
        entry: &Trade,
        trade_id: impl Into<String>,
        timestamp: impl Into<RawTimestamp>,
        price: f64,
        commission: f64,
    ) -> Result<Self, TimestampError> {
        let quantity = entry.quantity;
        let value = price * quantity;
        let profit_loss = value - entry.value - (entry.commission + commission);
        let roi_pct = if entry.value != 0.0 {
            profit_loss / entry.value * 100.0
        } else {
            0.0
        };
        Ok(Self {
            trade_id: trade_id.into(),
            symbol: entry.symbol.clone(),
            side: Side::Sell,
            timestamp: canonicalize(timestamp.into())?,
            price,
            quantity,
            value,
            commission,
            entry_point: false,
            entry_price: Some(entry.price),
            profit_loss,
            roi_pct,
        })
    }

    pub fn is_winner(&self) -> bool {
        !self.entry_point && self.profit_loss > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn round_trip_profit_and_roi() {
        // BUY 0.5 @ 20000 (commission 10), SELL 0.5 @ 22000 (commission 11)
        let entry = Trade::entry("1", "BTCUSDT", ts(5, 10), 20_000.0, 0.5, 10.0).unwrap();
        assert_eq!(entry.value, 10_000.0);
        assert!(entry.entry_point);
        assert_eq!(entry.profit_loss, 0.0);

        let exit = Trade::exit_from(&entry, "2", ts(10, 14), 22_000.0, 11.0).unwrap();
        assert_eq!(exit.value, 11_000.0);
        assert_eq!(exit.entry_price, Some(20_000.0));
        // 11000 - 10000 - (10 + 11)
        assert!((exit.profit_loss - 979.0).abs() < 1e-10);
        assert!((exit.roi_pct - 9.79).abs() < 1e-10);
        assert!(exit.is_winner());
    }

    #[test]
    fn losing_round_trip() {
        let entry = Trade::entry("1", "BTCUSDT", ts(5, 10), 20_000.0, 0.5, 10.0).unwrap();
        let exit = Trade::exit_from(&entry, "2", ts(6, 10), 19_000.0, 9.5).unwrap();
        assert!(exit.profit_loss < 0.0);
        assert!(!exit.is_winner());
    }

    #[test]
    fn entry_accepts_iso_timestamp() {
        let entry =
            Trade::entry("1", "BTCUSDT", "2023-01-15T10:00:00", 21_000.0, 0.6, 12.6).unwrap();
        assert_eq!(entry.timestamp, ts(15, 10));
    }

    #[test]
    fn side_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"SELL\"");
    }
}
