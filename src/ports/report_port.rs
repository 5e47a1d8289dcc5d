//! Report generation port.

use std::path::Path;

use crate::domain::engine::BacktestResult;
use crate::domain::error::SibylError;

/// Port for writing backtest artifacts (equity curve, trade log) for
/// report and dashboard consumers.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), SibylError>;
}
