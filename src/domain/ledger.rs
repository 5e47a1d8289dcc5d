//! Paper-trading ledger: cash, holdings, and an append-only trade log.
//!
//! One instance is owned by one run (backtest) or one wallet (live paper
//! trading); sequencing is the caller's job, no concurrent mutation.
//! `buy` and `sell` validate before touching anything, so a failed trade
//! leaves no partial state behind and `cash >= 0`, `holdings >= 0` hold
//! after every mutation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::SibylError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: u64,
    pub total: f64,
    pub resulting_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    pub cash: f64,
    pub holdings: u64,
    pub initial_capital: f64,
    pub trade_log: Vec<Trade>,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Ledger {
            cash: initial_capital,
            holdings: 0,
            initial_capital,
            trade_log: Vec::new(),
        }
    }

    /// Restore from persisted wallet state; the trade log starts empty and
    /// only records what happens from here on.
    pub fn from_parts(cash: f64, holdings: u64) -> Self {
        Ledger {
            cash,
            holdings,
            initial_capital: cash,
            trade_log: Vec::new(),
        }
    }

    /// Buy `quantity` shares at `price`. Fails without mutating when cash
    /// cannot cover the total.
    pub fn buy(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        quantity: u64,
    ) -> Result<(), SibylError> {
        validate_order(price, quantity)?;

        let total = price * quantity as f64;
        if total > self.cash {
            return Err(SibylError::InsufficientFunds {
                needed: total,
                cash: self.cash,
            });
        }

        self.cash -= total;
        self.holdings += quantity;
        self.trade_log.push(Trade {
            date,
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            price,
            quantity,
            total,
            resulting_balance: self.cash,
        });
        Ok(())
    }

    /// Full-deployment buy: floor(cash / price) shares. Returns the quantity
    /// bought, or `None` when even one share is unaffordable. Not an error;
    /// the backtest just holds.
    pub fn buy_max(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
    ) -> Result<Option<u64>, SibylError> {
        if price <= 0.0 {
            return Err(SibylError::Data {
                reason: format!("non-positive price {} for {}", price, symbol),
            });
        }
        let quantity = (self.cash / price).floor() as u64;
        if quantity == 0 {
            return Ok(None);
        }
        self.buy(date, symbol, price, quantity)?;
        Ok(Some(quantity))
    }

    /// Sell `quantity` shares at `price`. Fails without mutating when
    /// holdings are short.
    pub fn sell(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        quantity: u64,
    ) -> Result<(), SibylError> {
        validate_order(price, quantity)?;

        if quantity > self.holdings {
            return Err(SibylError::InsufficientHoldings {
                requested: quantity,
                held: self.holdings,
            });
        }

        let total = price * quantity as f64;
        self.cash += total;
        self.holdings -= quantity;
        self.trade_log.push(Trade {
            date,
            symbol: symbol.to_string(),
            action: TradeAction::Sell,
            price,
            quantity,
            total,
            resulting_balance: self.cash,
        });
        Ok(())
    }

    /// Liquidate the entire position (backtest SELL semantics; partial sells
    /// are a live-trading behavior). Returns the quantity sold; fails with
    /// `InsufficientHoldings` when nothing is held.
    pub fn sell_all(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
    ) -> Result<u64, SibylError> {
        let quantity = self.holdings;
        if quantity == 0 {
            return Err(SibylError::InsufficientHoldings {
                requested: 1,
                held: 0,
            });
        }
        self.sell(date, symbol, price, quantity)?;
        Ok(quantity)
    }

    /// Cash plus holdings valued at `price`. Pure, callable any number of
    /// times.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.cash + self.holdings as f64 * price
    }
}

fn validate_order(price: f64, quantity: u64) -> Result<(), SibylError> {
    if price <= 0.0 || !price.is_finite() {
        return Err(SibylError::Data {
            reason: format!("non-positive trade price {}", price),
        });
    }
    if quantity == 0 {
        return Err(SibylError::Data {
            reason: "zero trade quantity".into(),
        });
    }
    Ok(())
}

/// Value-semantics trade application for the live-trading persistence
/// boundary: validates and returns the successor state, leaving the input
/// untouched. The store layer decides how and when to persist it.
pub fn apply_trade(
    ledger: &Ledger,
    action: TradeAction,
    date: NaiveDate,
    symbol: &str,
    price: f64,
    quantity: u64,
) -> Result<Ledger, SibylError> {
    let mut next = ledger.clone();
    match action {
        TradeAction::Buy => next.buy(date, symbol, price, quantity)?,
        TradeAction::Sell => next.sell(date, symbol, price, quantity)?,
    }
    Ok(next)
}
