//! Signal policy: predicted move → trading decision.
//!
//! Thresholds are configuration, not constants: 0.5, 1.0 and 1.5 percent
//! have all been deployed against this strategy at different times.

use serde::Serialize;

use crate::domain::error::SibylError;

/// Closed set of tradeable and advisory signals. `Avoid` and `Watch` are
/// refinements of `Sell`/`Hold` for accounts that own nothing; risk context
/// lives in [`Decision::risk_flag`], never in the signal name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    Avoid,
    Watch,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
            Signal::Avoid => "AVOID",
            Signal::Watch => "WATCH",
        }
    }
}

/// A refined signal plus a separate high-risk marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub signal: Signal,
    pub risk_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Predicted move (percent) above which the policy says BUY.
    pub buy_pct: f64,
    /// Predicted move (percent) below which the policy says SELL. Negative.
    pub sell_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            buy_pct: 1.5,
            sell_pct: -1.5,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), SibylError> {
        if self.buy_pct <= 0.0 {
            return Err(SibylError::ConfigInvalid {
                section: "policy".into(),
                key: "buy_threshold".into(),
                reason: "must be positive".into(),
            });
        }
        if self.sell_pct >= 0.0 {
            return Err(SibylError::ConfigInvalid {
                section: "policy".into(),
                key: "sell_threshold".into(),
                reason: "must be negative".into(),
            });
        }
        Ok(())
    }
}

/// Map a predicted move (percent) onto a raw signal.
pub fn decide(move_pct: f64, thresholds: &Thresholds) -> Signal {
    if move_pct > thresholds.buy_pct {
        Signal::Buy
    } else if move_pct < thresholds.sell_pct {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Sentiment below this turns a BUY into a flagged WATCH.
pub const RISK_SENTIMENT_FLOOR: f64 = -0.2;

/// Refine a raw signal with ownership and sentiment context.
///
/// SELL downgrades to AVOID and HOLD to WATCH when the account holds
/// nothing; a BUY against strongly negative sentiment downgrades to WATCH
/// with the risk flag set.
pub fn refine(signal: Signal, held_quantity: u64, sentiment: f64) -> Decision {
    let mut refined = signal;
    if held_quantity == 0 {
        match signal {
            Signal::Sell => refined = Signal::Avoid,
            Signal::Hold => refined = Signal::Watch,
            _ => {}
        }
    }

    if refined == Signal::Buy && sentiment < RISK_SENTIMENT_FLOOR {
        return Decision {
            signal: Signal::Watch,
            risk_flag: true,
        };
    }

    Decision {
        signal: refined,
        risk_flag: false,
    }
}

/// Confidence score in [10, 99] combining signal direction, sentiment
/// polarity, RSI position relative to 50, and MACD-histogram sign.
/// Advisory only; the backtest loop never consults it.
pub fn confidence(signal: Signal, sentiment: f64, rsi: f64, macd_hist: f64) -> f64 {
    let mut score: f64 = 50.0;

    match signal {
        Signal::Buy => {
            if sentiment > 0.1 {
                score += 20.0;
            }
            if rsi < 50.0 {
                score += 10.0;
            }
            if macd_hist > 0.0 {
                score += 10.0;
            }
        }
        Signal::Sell => {
            if sentiment < -0.1 {
                score += 20.0;
            }
            if rsi > 50.0 {
                score += 10.0;
            }
            if macd_hist < 0.0 {
                score += 10.0;
            }
        }
        _ => {}
    }

    score.clamp(10.0, 99.0)
}
