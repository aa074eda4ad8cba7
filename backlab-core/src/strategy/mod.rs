//! Strategy contract: the pluggable decision function.
//!
//! A strategy sees a `MarketView` (per-timeframe frames truncated to the
//! bars seen so far) and returns one signal per bar. Strategies must be
//! pure functions of the view they are given so runs stay reproducible.

pub mod examples;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::domain::{FrameView, Timeframe};

/// Decision emitted by a strategy at one bar.
///
/// The closed enum is the whole contract: an out-of-vocabulary signal
/// cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        })
    }
}

/// A strategy failure. Aborts the run it occurs in; sibling runs are
/// unaffected.
#[derive(Debug, Error)]
#[error("strategy failure: {0}")]
pub struct StrategyError(pub String);

/// The truncated multi-timeframe window a strategy decides on.
///
/// Holds one `FrameView` per timeframe, each ending at the last bar whose
/// timestamp is <= the current primary bar's timestamp.
#[derive(Debug, Clone)]
pub struct MarketView<'a> {
    frames: BTreeMap<Timeframe, FrameView<'a>>,
    primary: Timeframe,
}

impl<'a> MarketView<'a> {
    pub fn new(frames: BTreeMap<Timeframe, FrameView<'a>>, primary: Timeframe) -> Self {
        debug_assert!(frames.contains_key(&primary));
        Self { frames, primary }
    }

    pub fn frame(&self, timeframe: Timeframe) -> Option<&FrameView<'a>> {
        self.frames.get(&timeframe)
    }

    /// The frame that drives the replay loop.
    pub fn primary(&self) -> &FrameView<'a> {
        &self.frames[&self.primary]
    }

    pub fn primary_timeframe(&self) -> Timeframe {
        self.primary
    }

    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.frames.keys().copied()
    }
}

/// The pluggable decision capability.
pub trait StrategyDecision: Send + Sync {
    /// Name used for persistence and report filenames.
    fn name(&self) -> &str {
        "strategy"
    }

    /// Decide on the current view. Called once per primary bar after warmup.
    fn decide(&self, view: &MarketView<'_>, symbol: &str) -> Result<Signal, StrategyError>;
}

/// Adapter turning a closure into a named strategy.
pub struct FnStrategy<F> {
    name: String,
    func: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&MarketView<'_>, &str) -> Result<Signal, StrategyError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> StrategyDecision for FnStrategy<F>
where
    F: Fn(&MarketView<'_>, &str) -> Result<Signal, StrategyError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, view: &MarketView<'_>, symbol: &str) -> Result<Signal, StrategyError> {
        (self.func)(view, symbol)
    }
}
