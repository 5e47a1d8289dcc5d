//! History provider port.

use crate::domain::error::SibylError;
use crate::domain::ohlcv::PriceBar;

/// Source of daily OHLCV history.
///
/// Bars come back chronologically ordered and gap-tolerant: missing trading
/// days are absent rows, never forward-filled. An empty vector means "no
/// data for this symbol", which the engine treats differently from "too
/// little data".
pub trait HistoryPort {
    fn get_history(&self, symbol: &str) -> Result<Vec<PriceBar>, SibylError>;

    fn list_symbols(&self) -> Result<Vec<String>, SibylError>;
}
