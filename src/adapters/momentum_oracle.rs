//! Momentum prediction oracle.
//!
//! A deterministic stand-in for a trained forecasting model: fits a
//! least-squares line through the window's scaled close column and
//! extrapolates one step ahead, clamped to the unit range. Useful for
//! backtesting the surrounding pipeline without model weights on disk.

use crate::domain::enrich::CLOSE_COLUMN;
use crate::domain::error::SibylError;
use crate::ports::oracle_port::{NormalizedWindow, PredictionOracle};

pub struct MomentumOracle {
    /// Scales the fitted slope before extrapolation. 1.0 projects the
    /// trend as-is; values below damp it.
    gain: f64,
}

impl MomentumOracle {
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }
}

impl Default for MomentumOracle {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PredictionOracle for MomentumOracle {
    fn predict(&self, window: &NormalizedWindow) -> Result<f64, SibylError> {
        let closes: Vec<f64> = window.rows().iter().map(|r| r[CLOSE_COLUMN]).collect();
        let n = closes.len() as f64;

        let mean_x = (n - 1.0) / 2.0;
        let mean_y = closes.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var = 0.0;
        for (i, y) in closes.iter().enumerate() {
            let dx = i as f64 - mean_x;
            cov += dx * (y - mean_y);
            var += dx * dx;
        }
        // var is always positive for the fixed window length.
        let slope = cov / var;

        let last = closes[closes.len() - 1];
        let forecast = last + slope * self.gain;
        if !forecast.is_finite() {
            return Err(SibylError::Oracle {
                reason: "non-finite forecast".to_string(),
            });
        }
        Ok(forecast.clamp(0.0, 1.0))
    }
}
