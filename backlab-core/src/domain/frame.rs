//! IndicatorFrame — a bar series plus named derived columns, with
//! borrowed truncated views.
//!
//! `FrameView` is the only shape strategies ever see: it exposes bars and
//! indicator values up to a fixed index and nothing beyond it. The replay
//! loop hands out views truncated to "now", which is what makes the
//! no-lookahead guarantee structural rather than a convention.

use std::collections::BTreeMap;

use crate::domain::Bar;

/// A bar series annotated with derived indicator columns.
///
/// Every column has exactly the same length as the bar series; warmup
/// indices hold NaN.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    bars: Vec<Bar>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> &Bar {
        &self.bars[index]
    }

    /// Insert (or replace) a derived column. Panics on length mismatch:
    /// a column that does not cover every bar is a construction bug.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.bars.len(),
            "column length must match bar count"
        );
        self.columns.insert(name.into(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|s| s.as_str())
    }

    /// Borrowed view of the first `len` bars (and their column values).
    pub fn view(&self, len: usize) -> FrameView<'_> {
        FrameView {
            frame: self,
            len: len.min(self.bars.len()),
        }
    }

    /// View of the whole frame.
    pub fn full_view(&self) -> FrameView<'_> {
        self.view(self.bars.len())
    }
}

/// A truncated, read-only window over an `IndicatorFrame`.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    frame: &'a IndicatorFrame,
    len: usize,
}

impl<'a> FrameView<'a> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bars(&self) -> &'a [Bar] {
        &self.frame.bars[..self.len]
    }

    pub fn bar(&self, index: usize) -> Option<&'a Bar> {
        self.bars().get(index)
    }

    pub fn last_bar(&self) -> Option<&'a Bar> {
        self.bars().last()
    }

    pub fn column(&self, name: &str) -> Option<&'a [f64]> {
        self.frame.column(name).map(|v| &v[..self.len])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.has_column(name)
    }

    /// Value of a column at an index inside the view.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.column(name).and_then(|v| v.get(index).copied())
    }

    /// Latest value of a column within the view (NaN warmup values included).
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.column(name).and_then(|v| v.last().copied())
    }
}
