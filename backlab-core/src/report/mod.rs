//! Reporting adapters: chart canvas contract, trade log, HTML report.

pub mod html;
pub mod plot;
pub mod trade_log;

pub use plot::{ChartCanvas, ChartOutput, MarkerStyle, PlotOptions, RecordingCanvas, SvgCanvas};
pub use trade_log::{TradeLogRow, TradeLogTable};

use thiserror::Error;

/// Errors from report and chart generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown indicator column '{0}'")]
    MissingColumn(String),

    #[error("{0}")]
    Unsupported(String),
}
