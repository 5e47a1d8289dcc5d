//! Indicator pipeline: raw OHLCV series in, enriched series out.
//!
//! Pure transform, safe to run concurrently on independent inputs. Rolling
//! fields come from the validity-flagged series in [`crate::domain::indicator`];
//! this module owns the policy for the not-yet-defined warm-up rows:
//!
//! - RSI is always neutral-filled at 50 where undefined, so downstream
//!   consumers index the latest row without null checks.
//! - If the fully-valid suffix is longer than 60 rows, the leading rows with
//!   any undefined field are dropped.
//! - Otherwise (short series, e.g. recent IPOs) undefined fields are
//!   backfilled from their first defined row; an SMA column that never
//!   becomes defined falls back to the whole-series mean of close.

use crate::domain::error::SibylError;
use crate::domain::indicator::bollinger::{calculate_bollinger, DEFAULT_PERIOD, DEFAULT_STDDEV_MULT};
use crate::domain::indicator::macd::{calculate_macd, DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::obv::calculate_obv;
use crate::domain::indicator::rsi::{calculate_rsi, RSI_NEUTRAL};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::{is_chronological, PriceBar};

/// Below this many bars the MACD signal line never becomes defined and no
/// backfill source exists.
pub const MIN_ENRICH_BARS: usize = DEFAULT_SLOW + DEFAULT_SIGNAL - 1;

/// A fully-valid suffix longer than this is preferred over backfilling.
pub const DROP_THRESHOLD: usize = 60;

pub const SHORT_SMA: usize = 50;
pub const LONG_SMA: usize = 200;
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: PriceBar,
    pub sma_50: f64,
    pub sma_200: f64,
    pub rsi_14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
    pub obv: f64,
}

/// Feature columns fed to the prediction oracle, in window order.
pub const FEATURE_COUNT: usize = 5;

/// Index of the close column within a feature row; predictions come back in
/// this column's scale.
pub const CLOSE_COLUMN: usize = 0;

impl EnrichedBar {
    pub fn feature_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.bar.close,
            self.rsi_14,
            self.sma_50,
            self.sma_200,
            self.obv,
        ]
    }
}

pub fn enrich(bars: &[PriceBar]) -> Result<Vec<EnrichedBar>, SibylError> {
    let symbol = bars.first().map(|b| b.symbol.clone()).unwrap_or_default();

    if bars.len() < MIN_ENRICH_BARS {
        return Err(SibylError::InsufficientData {
            symbol,
            bars: bars.len(),
            minimum: MIN_ENRICH_BARS,
        });
    }
    if !is_chronological(bars) {
        return Err(SibylError::Data {
            reason: format!("history for {} is not chronologically ordered", symbol),
        });
    }

    let sma50 = calculate_sma(bars, SHORT_SMA);
    let sma200 = calculate_sma(bars, LONG_SMA);
    let rsi = calculate_rsi(bars, RSI_PERIOD);
    let macd = calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
    let boll = calculate_bollinger(bars, DEFAULT_PERIOD, DEFAULT_STDDEV_MULT);
    let obv = calculate_obv(bars);

    // Warm-ups are prefixes, so validity is monotone: find the first row
    // where every rolling field is defined. RSI is excluded because it is
    // neutral-filled, OBV because it has no warm-up.
    let first_valid = (0..bars.len()).find(|&i| {
        sma50.values[i].valid && sma200.values[i].valid && macd.values[i].valid && boll.values[i].valid
    });

    let suffix_len = first_valid.map(|i| bars.len() - i).unwrap_or(0);

    if suffix_len > DROP_THRESHOLD {
        let start = first_valid.unwrap();
        Ok((start..bars.len())
            .map(|i| build_row(bars, i, &sma50, &sma200, &rsi, &macd, &boll, &obv))
            .collect())
    } else {
        let sma50 = backfilled_simple(&sma50, bars);
        let sma200 = backfilled_simple(&sma200, bars);
        let macd = backfill_first_valid(&macd)?;
        let boll = backfill_first_valid(&boll)?;
        Ok((0..bars.len())
            .map(|i| build_row(bars, i, &sma50, &sma200, &rsi, &macd, &boll, &obv))
            .collect())
    }
}

#[allow(clippy::too_many_arguments)]
fn build_row(
    bars: &[PriceBar],
    i: usize,
    sma50: &IndicatorSeries,
    sma200: &IndicatorSeries,
    rsi: &IndicatorSeries,
    macd: &IndicatorSeries,
    boll: &IndicatorSeries,
    obv: &IndicatorSeries,
) -> EnrichedBar {
    let rsi_14 = if rsi.values[i].valid {
        rsi.values[i].value.simple()
    } else {
        RSI_NEUTRAL
    };

    let (macd_line, macd_signal, macd_hist) = match macd.values[i].value {
        IndicatorValue::Macd {
            line,
            signal,
            histogram,
        } => (line, signal, histogram),
        _ => (0.0, 0.0, 0.0),
    };

    let (bollinger_upper, bollinger_lower) = match boll.values[i].value {
        IndicatorValue::Bollinger { upper, lower, .. } => (upper, lower),
        _ => (0.0, 0.0),
    };

    EnrichedBar {
        bar: bars[i].clone(),
        sma_50: sma50.values[i].value.simple(),
        sma_200: sma200.values[i].value.simple(),
        rsi_14,
        macd: macd_line,
        macd_signal,
        macd_hist,
        bollinger_upper,
        bollinger_lower,
        obv: obv.values[i].value.simple(),
    }
}

/// Backfill a simple-valued series from its first valid point; if the window
/// never completes (e.g. SMA-200 on a 90-bar series) every row takes the
/// whole-series mean of close.
fn backfilled_simple(series: &IndicatorSeries, bars: &[PriceBar]) -> IndicatorSeries {
    let fill = series
        .values
        .iter()
        .find(|p| p.valid)
        .map(|p| p.value.simple())
        .unwrap_or_else(|| bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64);

    let mut out = series.clone();
    for point in out.values.iter_mut() {
        if !point.valid {
            point.value = IndicatorValue::Simple(fill);
            point.valid = true;
        }
    }
    out
}

/// Backfill a compound series from its first valid point. MIN_ENRICH_BARS
/// guarantees one exists.
fn backfill_first_valid(series: &IndicatorSeries) -> Result<IndicatorSeries, SibylError> {
    let fill = series
        .values
        .iter()
        .find(|p| p.valid)
        .map(|p| p.value.clone())
        .ok_or_else(|| SibylError::Data {
            reason: format!("{} never became defined", series.indicator_type),
        })?;

    let mut out = series.clone();
    for point in out.values.iter_mut() {
        if !point.valid {
            point.value = fill.clone();
            point.valid = true;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + ((i % 11) as f64 - 5.0) * 1.5;
                PriceBar {
                    symbol: "TEST".into(),
                    date: NaiveDate::from_ymd_opt(2023, 1, 1)
                        .unwrap()
                        .checked_add_days(chrono::Days::new(i as u64))
                        .unwrap(),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000 + (i as i64 % 7) * 100,
                }
            })
            .collect()
    }

    #[test]
    fn enrich_too_short_fails() {
        let bars = make_bars(MIN_ENRICH_BARS - 1);
        let err = enrich(&bars).unwrap_err();
        assert!(matches!(err, SibylError::InsufficientData { .. }));
    }

    #[test]
    fn enrich_empty_fails() {
        assert!(matches!(
            enrich(&[]),
            Err(SibylError::InsufficientData { bars: 0, .. })
        ));
    }

    #[test]
    fn enrich_rejects_unordered_input() {
        let mut bars = make_bars(40);
        bars.swap(5, 6);
        assert!(matches!(enrich(&bars), Err(SibylError::Data { .. })));
    }

    #[test]
    fn enrich_long_series_drops_warmup() {
        let bars = make_bars(400);
        let enriched = enrich(&bars).unwrap();
        // SMA-200 is the longest warm-up: 199 rows dropped.
        assert_eq!(enriched.len(), 201);
        assert_eq!(enriched[0].bar.date, bars[199].date);
        // First retained row carries a real long SMA, not a placeholder.
        assert!(enriched[0].sma_200 > 0.0);
    }

    #[test]
    fn enrich_short_series_backfills_instead_of_dropping() {
        let bars = make_bars(90);
        let enriched = enrich(&bars).unwrap();
        assert_eq!(enriched.len(), 90);
        // SMA-200 never completes on 90 bars: filled with the mean close.
        let mean_close = bars.iter().map(|b| b.close).sum::<f64>() / 90.0;
        assert!((enriched[0].sma_200 - mean_close).abs() < 1e-9);
        assert!((enriched[89].sma_200 - mean_close).abs() < 1e-9);
        // SMA-50 completes at row 49; earlier rows take that first value.
        assert!((enriched[0].sma_50 - enriched[49].sma_50).abs() < 1e-9);
    }

    #[test]
    fn enrich_rsi_neutral_filled_at_start() {
        let bars = make_bars(90);
        let enriched = enrich(&bars).unwrap();
        for row in enriched.iter().take(RSI_PERIOD) {
            assert!((row.rsi_14 - 50.0).abs() < f64::EPSILON);
        }
        // Past the warm-up the real value flows through.
        assert!(enriched[30].rsi_14 >= 0.0 && enriched[30].rsi_14 <= 100.0);
    }

    #[test]
    fn enrich_macd_hist_consistent() {
        let bars = make_bars(300);
        let enriched = enrich(&bars).unwrap();
        for row in &enriched {
            assert!((row.macd_hist - (row.macd - row.macd_signal)).abs() < 1e-9);
        }
    }

    #[test]
    fn enrich_bollinger_brackets_close_mean() {
        let bars = make_bars(300);
        let enriched = enrich(&bars).unwrap();
        for row in &enriched {
            assert!(row.bollinger_upper >= row.bollinger_lower);
        }
    }

    #[test]
    fn feature_row_layout() {
        let bars = make_bars(300);
        let enriched = enrich(&bars).unwrap();
        let row = enriched.last().unwrap();
        let features = row.feature_row();
        assert!((features[CLOSE_COLUMN] - row.bar.close).abs() < f64::EPSILON);
        assert!((features[1] - row.rsi_14).abs() < f64::EPSILON);
        assert!((features[4] - row.obv).abs() < f64::EPSILON);
    }

    #[test]
    fn enrich_is_pure() {
        let bars = make_bars(120);
        let a = enrich(&bars).unwrap();
        let b = enrich(&bars).unwrap();
        assert_eq!(a, b);
    }
}
