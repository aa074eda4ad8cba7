//! Chart rendering through an abstract drawing surface.
//!
//! The engine never renders pixels itself: `plot_results` issues drawing
//! calls against a `ChartCanvas`, and the canvas decides what they become:
//! recorded calls in tests, an SVG file on disk, or an interactive window
//! in a host application.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::domain::Side;
use crate::engine::{BacktestEngine, BacktestResult};

use super::ReportError;

/// Default overlay columns drawn on the price panel.
const PRICE_OVERLAYS: &[&str] = &["upper_band", "middle_band", "lower_band", "sma_20", "sma_50"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Entry,
    Exit,
}

/// Where the finished figure goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutput {
    /// Hand off to an interactive surface.
    Display,
    /// Save to a file.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub show_indicators: bool,
    /// Column names to draw in the indicator panel instead of the default
    /// set. Every name must exist on the primary frame.
    pub custom_indicators: Option<Vec<String>>,
    pub output: ChartOutput,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            show_indicators: false,
            custom_indicators: None,
            output: ChartOutput::Display,
        }
    }
}

/// The plotting collaborator contract.
pub trait ChartCanvas {
    fn begin(&mut self, title: &str, panel_count: usize);
    fn line(&mut self, panel: usize, label: &str, xs: &[NaiveDateTime], ys: &[f64]);
    fn fill_between(
        &mut self,
        panel: usize,
        label: &str,
        xs: &[NaiveDateTime],
        lower: &[f64],
        upper: &[f64],
    );
    fn markers(
        &mut self,
        panel: usize,
        label: &str,
        style: MarkerStyle,
        points: &[(NaiveDateTime, f64)],
    );
    fn finish(&mut self, output: &ChartOutput) -> Result<(), ReportError>;
}

impl BacktestEngine {
    /// Draw the run onto `canvas`: equity with drawdown shading, the price
    /// series with entry/exit markers, and (optionally) indicator panels.
    pub fn plot_results(
        &self,
        results: &BacktestResult,
        options: &PlotOptions,
        canvas: &mut dyn ChartCanvas,
    ) -> Result<(), ReportError> {
        let frame = &self.market_data()[&self.primary_timeframe()];

        // Resolve the indicator panel layout up front so panel_count is
        // known before the first draw call.
        let indicator_panels: Vec<(String, Vec<String>)> = if !options.show_indicators {
            Vec::new()
        } else if let Some(custom) = &options.custom_indicators {
            for name in custom {
                if !frame.has_column(name) {
                    return Err(ReportError::MissingColumn(name.clone()));
                }
            }
            vec![("indicators".to_string(), custom.clone())]
        } else {
            vec![
                ("rsi".to_string(), vec!["rsi".to_string()]),
                (
                    "macd".to_string(),
                    vec![
                        "macd_line".to_string(),
                        "signal_line".to_string(),
                        "macd_histogram".to_string(),
                    ],
                ),
            ]
        };

        let title = format!("{} / {}", results.symbol, results.strategy_name);
        canvas.begin(&title, 2 + indicator_panels.len());

        // Panel 0: equity with drawdown shading against the running peak.
        let eq_xs: Vec<NaiveDateTime> = results.equity_curve.iter().map(|p| p.timestamp).collect();
        let eq_ys: Vec<f64> = results.equity_curve.iter().map(|p| p.equity).collect();
        let mut peak = f64::MIN;
        let peaks: Vec<f64> = eq_ys
            .iter()
            .map(|&e| {
                peak = peak.max(e);
                peak
            })
            .collect();
        canvas.line(0, "equity", &eq_xs, &eq_ys);
        canvas.fill_between(0, "drawdown", &eq_xs, &eq_ys, &peaks);

        // Panel 1: close price with trade markers and overlays.
        let bar_xs: Vec<NaiveDateTime> = frame.bars().iter().map(|b| b.timestamp).collect();
        let closes: Vec<f64> = frame.bars().iter().map(|b| b.close).collect();
        canvas.line(1, "close", &bar_xs, &closes);
        if options.show_indicators && options.custom_indicators.is_none() {
            for name in PRICE_OVERLAYS {
                if let Some(col) = frame.column(name) {
                    canvas.line(1, name, &bar_xs, col);
                }
            }
        }

        let entries: Vec<(NaiveDateTime, f64)> = results
            .trades
            .iter()
            .filter(|t| t.side == Side::Buy)
            .map(|t| (t.timestamp, t.price))
            .collect();
        let exits: Vec<(NaiveDateTime, f64)> = results
            .trades
            .iter()
            .filter(|t| t.side == Side::Sell)
            .map(|t| (t.timestamp, t.price))
            .collect();
        canvas.markers(1, "entries", MarkerStyle::Entry, &entries);
        canvas.markers(1, "exits", MarkerStyle::Exit, &exits);

        // Indicator panels.
        for (offset, (_, columns)) in indicator_panels.iter().enumerate() {
            let panel = 2 + offset;
            for name in columns {
                let col = frame
                    .column(name)
                    .ok_or_else(|| ReportError::MissingColumn(name.clone()))?;
                canvas.line(panel, name, &bar_xs, col);
            }
        }

        canvas.finish(&options.output)
    }
}

/// Test double: records every call it receives.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub begins: Vec<(String, usize)>,
    pub lines: Vec<(usize, String, usize)>,
    pub fills: Vec<(usize, String)>,
    pub markers: Vec<(usize, String, MarkerStyle, usize)>,
    pub finishes: Vec<ChartOutput>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_labels(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, label, _)| label.as_str()).collect()
    }
}

impl ChartCanvas for RecordingCanvas {
    fn begin(&mut self, title: &str, panel_count: usize) {
        self.begins.push((title.to_string(), panel_count));
    }

    fn line(&mut self, panel: usize, label: &str, xs: &[NaiveDateTime], ys: &[f64]) {
        debug_assert_eq!(xs.len(), ys.len());
        self.lines.push((panel, label.to_string(), xs.len()));
    }

    fn fill_between(
        &mut self,
        panel: usize,
        label: &str,
        _xs: &[NaiveDateTime],
        _lower: &[f64],
        _upper: &[f64],
    ) {
        self.fills.push((panel, label.to_string()));
    }

    fn markers(
        &mut self,
        panel: usize,
        label: &str,
        style: MarkerStyle,
        points: &[(NaiveDateTime, f64)],
    ) {
        self.markers.push((panel, label.to_string(), style, points.len()));
    }

    fn finish(&mut self, output: &ChartOutput) -> Result<(), ReportError> {
        self.finishes.push(output.clone());
        Ok(())
    }
}

/// Minimal SVG renderer: one stacked polyline panel per panel index.
///
/// Good enough for report artifacts; anything fancier belongs to a host
/// application's canvas.
pub struct SvgCanvas {
    width: u32,
    panel_height: u32,
    title: String,
    panel_count: usize,
    shapes: Vec<String>,
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self {
            width: 960,
            panel_height: 220,
            title: String::new(),
            panel_count: 0,
            shapes: Vec::new(),
        }
    }

    fn project(&self, panel: usize, xs: &[NaiveDateTime], ys: &[f64]) -> Vec<(f64, f64)> {
        let (min_x, max_x) = match (xs.first(), xs.last()) {
            (Some(a), Some(b)) => (a.and_utc().timestamp(), b.and_utc().timestamp()),
            _ => return Vec::new(),
        };
        let span_x = (max_x - min_x).max(1) as f64;
        let finite: Vec<f64> = ys.iter().copied().filter(|v| v.is_finite()).collect();
        let (min_y, max_y) = finite
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span_y = (max_y - min_y).max(1e-9);
        let top = (panel as u32 * self.panel_height) as f64;
        let height = self.panel_height as f64;

        xs.iter()
            .zip(ys)
            .filter(|(_, y)| y.is_finite())
            .map(|(x, &y)| {
                let px = (x.and_utc().timestamp() - min_x) as f64 / span_x * self.width as f64;
                let py = top + height - (y - min_y) / span_y * (height - 20.0) - 10.0;
                (px, py)
            })
            .collect()
    }
}

impl Default for SvgCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartCanvas for SvgCanvas {
    fn begin(&mut self, title: &str, panel_count: usize) {
        self.title = title.to_string();
        self.panel_count = panel_count;
        self.shapes.clear();
    }

    fn line(&mut self, panel: usize, label: &str, xs: &[NaiveDateTime], ys: &[f64]) {
        let points: Vec<String> = self
            .project(panel, xs, ys)
            .into_iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        if points.is_empty() {
            return;
        }
        self.shapes.push(format!(
            "<polyline fill=\"none\" stroke=\"currentColor\" stroke-width=\"1\" data-label=\"{label}\" points=\"{}\"/>",
            points.join(" ")
        ));
    }

    fn fill_between(
        &mut self,
        panel: usize,
        label: &str,
        xs: &[NaiveDateTime],
        lower: &[f64],
        upper: &[f64],
    ) {
        let mut down = self.project(panel, xs, lower);
        let up = self.project(panel, xs, upper);
        if down.is_empty() || up.is_empty() {
            return;
        }
        down.reverse();
        let points: Vec<String> = up
            .into_iter()
            .chain(down)
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        self.shapes.push(format!(
            "<polygon fill=\"#cccccc\" opacity=\"0.4\" data-label=\"{label}\" points=\"{}\"/>",
            points.join(" ")
        ));
    }

    fn markers(
        &mut self,
        panel: usize,
        label: &str,
        style: MarkerStyle,
        points: &[(NaiveDateTime, f64)],
    ) {
        let xs: Vec<NaiveDateTime> = points.iter().map(|(x, _)| *x).collect();
        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        let glyph = match style {
            MarkerStyle::Entry => "#2a9d2a",
            MarkerStyle::Exit => "#d0342c",
        };
        for (x, y) in self.project(panel, &xs, &ys) {
            self.shapes.push(format!(
                "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"3\" fill=\"{glyph}\" data-label=\"{label}\"/>"
            ));
        }
    }

    fn finish(&mut self, output: &ChartOutput) -> Result<(), ReportError> {
        let path = match output {
            ChartOutput::File(path) => path,
            ChartOutput::Display => {
                return Err(ReportError::Unsupported(
                    "SvgCanvas cannot display interactively; use a file output".to_string(),
                ))
            }
        };
        let height = self.panel_count.max(1) as u32 * self.panel_height;
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{height}\">\n<title>{}</title>\n",
            self.width, self.title
        );
        for shape in &self.shapes {
            svg.push_str(shape);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        fs::write(path, svg)?;
        Ok(())
    }
}
