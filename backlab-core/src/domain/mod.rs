//! Domain types: bars, timeframes, trades, equity curve, indicator frames.

pub mod bar;
pub mod equity;
pub mod frame;
pub mod timeframe;
pub mod timestamp;
pub mod trade;

pub use bar::{sort_and_dedup, Bar};
pub use equity::EquityPoint;
pub use frame::{FrameView, IndicatorFrame};
pub use timeframe::Timeframe;
pub use timestamp::{canonicalize, to_iso, RawTimestamp, TimestampError};
pub use trade::{Side, Trade};
