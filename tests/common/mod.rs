#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use sibyltrader::domain::enrich::{enrich, EnrichedBar, CLOSE_COLUMN, FEATURE_COUNT};
use sibyltrader::domain::error::SibylError;
pub use sibyltrader::domain::ohlcv::PriceBar;
use sibyltrader::domain::scaler::MinMaxScaler;
use sibyltrader::ports::data_port::HistoryPort;
use sibyltrader::ports::oracle_port::{NormalizedWindow, PredictionOracle};
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date_str: &str, close: f64) -> PriceBar {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap();
    PriceBar {
        symbol: symbol.to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 10_000,
    }
}

/// Consecutive daily bars with closes from a deterministic shape function.
pub fn generate_bars<F: Fn(usize) -> f64>(symbol: &str, start: &str, count: usize, close: F) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let c = close(i);
            PriceBar {
                symbol: symbol.to_string(),
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                open: c,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
                volume: 10_000 + (i as i64 % 7) * 500,
            }
        })
        .collect()
}

pub fn rising_bars(symbol: &str, count: usize) -> Vec<PriceBar> {
    generate_bars(symbol, "2022-01-03", count, |i| 100.0 + i as f64 * 0.25)
}

pub fn flat_bars(symbol: &str, count: usize) -> Vec<PriceBar> {
    generate_bars(symbol, "2022-01-03", count, |_| 100.0)
}

pub struct MockHistoryPort {
    pub data: HashMap<String, Vec<PriceBar>>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }
}

impl HistoryPort for MockHistoryPort {
    fn get_history(&self, symbol: &str) -> Result<Vec<PriceBar>, SibylError> {
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| SibylError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, SibylError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Oracle forecasting a fixed percentage move off the window's final close,
/// expressed back in the scaled close column.
pub struct FixedMoveOracle {
    pub move_pct: f64,
    scaler: MinMaxScaler,
}

impl FixedMoveOracle {
    /// Fit against the same full-series enrichment the engine's permissive
    /// mode uses, so scaled values round-trip exactly.
    pub fn fitted(bars: &[PriceBar], move_pct: f64) -> Self {
        let enriched = enrich(bars).unwrap();
        let features: Vec<[f64; FEATURE_COUNT]> =
            enriched.iter().map(EnrichedBar::feature_row).collect();
        Self {
            move_pct,
            scaler: MinMaxScaler::fit(&features),
        }
    }
}

impl PredictionOracle for FixedMoveOracle {
    fn predict(&self, window: &NormalizedWindow) -> Result<f64, SibylError> {
        let last_scaled = window.rows().last().unwrap()[CLOSE_COLUMN];
        let last_close = self.scaler.inverse_column(last_scaled, CLOSE_COLUMN);
        let target = last_close * (1.0 + self.move_pct / 100.0);

        let min = self.scaler.inverse_column(0.0, CLOSE_COLUMN);
        let max = self.scaler.inverse_column(1.0, CLOSE_COLUMN);
        let range = max - min;
        Ok(if range > 0.0 {
            (target - min) / range
        } else {
            0.0
        })
    }
}

/// Oracle that fails every call, for fatal-error propagation tests.
pub struct FailingOracle;

impl PredictionOracle for FailingOracle {
    fn predict(&self, _window: &NormalizedWindow) -> Result<f64, SibylError> {
        Err(SibylError::Oracle {
            reason: "model unavailable".to_string(),
        })
    }
}
