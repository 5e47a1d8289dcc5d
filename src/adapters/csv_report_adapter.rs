//! CSV report adapter.
//!
//! Writes one backtest's artifacts into an output directory:
//! `<SYMBOL>_equity.csv`, `<SYMBOL>_trades.csv` and a machine-readable
//! `<SYMBOL>_summary.json` for dashboard consumers.

use crate::domain::engine::BacktestResult;
use crate::domain::error::SibylError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), SibylError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| SibylError::Persistence {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;
    wtr.write_record(["date", "value"])
        .map_err(|e| SibylError::Persistence {
            reason: format!("equity write failed: {}", e),
        })?;
    for point in &result.equity_curve {
        wtr.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", point.value),
        ])
        .map_err(|e| SibylError::Persistence {
            reason: format!("equity write failed: {}", e),
        })?;
    }
    wtr.flush().map_err(|e| SibylError::Persistence {
        reason: format!("equity flush failed: {}", e),
    })?;
    Ok(())
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), SibylError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| SibylError::Persistence {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;
    wtr.write_record([
        "date",
        "symbol",
        "action",
        "price",
        "quantity",
        "total",
        "resulting_balance",
    ])
    .map_err(|e| SibylError::Persistence {
        reason: format!("trade write failed: {}", e),
    })?;
    for trade in &result.trade_log {
        wtr.write_record([
            trade.date.format("%Y-%m-%d").to_string(),
            trade.symbol.clone(),
            trade.action.as_str().to_string(),
            format!("{:.2}", trade.price),
            trade.quantity.to_string(),
            format!("{:.2}", trade.total),
            format!("{:.2}", trade.resulting_balance),
        ])
        .map_err(|e| SibylError::Persistence {
            reason: format!("trade write failed: {}", e),
        })?;
    }
    wtr.flush().map_err(|e| SibylError::Persistence {
        reason: format!("trade flush failed: {}", e),
    })?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), SibylError> {
        fs::create_dir_all(output_dir).map_err(|e| SibylError::Persistence {
            reason: format!("failed to create {}: {}", output_dir.display(), e),
        })?;

        write_equity(
            result,
            &output_dir.join(format!("{}_equity.csv", result.symbol)),
        )?;
        write_trades(
            result,
            &output_dir.join(format!("{}_trades.csv", result.symbol)),
        )?;

        let summary_path = output_dir.join(format!("{}_summary.json", result.symbol));
        let summary = serde_json::json!({
            "symbol": result.symbol,
            "initial_capital": result.initial_capital,
            "final_value": result.final_value,
            "return_pct": result.return_pct,
            "trades_count": result.trades_count,
            "adjusted_days": result.adjusted_days,
            "cancelled": result.cancelled,
        });
        fs::write(
            &summary_path,
            serde_json::to_string_pretty(&summary).map_err(|e| SibylError::Persistence {
                reason: format!("summary encode failed: {}", e),
            })?,
        )
        .map_err(|e| SibylError::Persistence {
            reason: format!("failed to write {}: {}", summary_path.display(), e),
        })?;
        Ok(())
    }
}
