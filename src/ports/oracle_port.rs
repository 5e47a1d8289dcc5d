//! Prediction oracle port.

use crate::domain::enrich::FEATURE_COUNT;
use crate::domain::error::SibylError;

/// Number of trailing bars fed to the oracle as one inference input.
pub const LOOKBACK_WINDOW: usize = 60;

/// A fixed-length window of scaled feature rows, every value in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWindow {
    rows: Vec<[f64; FEATURE_COUNT]>,
}

impl NormalizedWindow {
    pub fn new(rows: Vec<[f64; FEATURE_COUNT]>) -> Result<Self, SibylError> {
        if rows.len() != LOOKBACK_WINDOW {
            return Err(SibylError::Data {
                reason: format!(
                    "prediction window has {} rows, expected {}",
                    rows.len(),
                    LOOKBACK_WINDOW
                ),
            });
        }
        Ok(NormalizedWindow { rows })
    }

    pub fn rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.rows
    }
}

/// A price forecaster consumed as a black box.
///
/// `predict` returns the scaled forecast for the close column; the caller
/// owns all scaling and unscaling around the call. The oracle is
/// stateless per call; loading and caching its parameters is the
/// constructor's concern, and the handle is passed explicitly into
/// whichever component starts a run, never held as process-wide state.
pub trait PredictionOracle {
    fn predict(&self, window: &NormalizedWindow) -> Result<f64, SibylError>;
}
