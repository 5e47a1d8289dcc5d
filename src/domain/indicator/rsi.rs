//! RSI (Relative Strength Index).
//!
//! Simple n-bar rolling mean of day-over-day gains and losses (not Wilder
//! smoothing): RS = avg_gain / avg_loss, RSI = 100 - 100/(1 + RS).
//! If avg_loss == 0: RSI = 100. If avg_gain == 0: RSI = 0. A window with
//! neither gains nor losses is neutral 50, not overbought.
//!
//! Warmup: the first n bars are invalid (n deltas are needed). Consumers
//! neutral-fill invalid RSI at 50, see [`crate::domain::enrich`].

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

/// Neutral value substituted wherever RSI is undefined.
pub const RSI_NEUTRAL: f64 = 50.0;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        let values = bars
            .iter()
            .map(|b| IndicatorPoint {
                date: b.date,
                valid: false,
                value: IndicatorValue::Simple(RSI_NEUTRAL),
            })
            .collect();
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values,
        };
    }

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint {
        date: bars[0].date,
        valid: false,
        value: IndicatorValue::Simple(RSI_NEUTRAL),
    });

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let delta_idx = i - 1;
        if delta_idx + 1 < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(RSI_NEUTRAL),
            });
            continue;
        }

        let window = (delta_idx + 1 - period)..=delta_idx;
        let avg_gain: f64 = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[window].iter().sum::<f64>() / period as f64;

        let rsi = if avg_gain == 0.0 && avg_loss == 0.0 {
            // A window with no movement at all has no strength either way.
            RSI_NEUTRAL
        } else if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
