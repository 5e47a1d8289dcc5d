//! Virtual wallet state for the live paper-trading path.
//!
//! Holdings are always a [`PortfolioEntry`] with an explicit integer
//! quantity. Legacy stores that kept a bare count must be migrated at the
//! persistence boundary, never special-cased here.

use serde::Serialize;

use crate::domain::ledger::{Ledger, Trade, TradeAction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    pub balance: f64,
    pub entries: Vec<PortfolioEntry>,
    pub trades: Vec<Trade>,
}

impl Wallet {
    pub fn new(balance: f64) -> Self {
        Wallet {
            balance,
            entries: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn holding_quantity(&self, symbol: &str) -> u64 {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.quantity)
            .unwrap_or(0)
    }

    /// Project this wallet onto a single-symbol ledger for trade validation.
    pub fn ledger_for(&self, symbol: &str) -> Ledger {
        Ledger::from_parts(self.balance, self.holding_quantity(symbol))
    }

    /// Fold a committed ledger trade back into the wallet. Zero-quantity
    /// entries are removed rather than kept as tombstones.
    pub fn absorb(&mut self, trade: &Trade) {
        match trade.action {
            TradeAction::Buy => {
                self.balance -= trade.total;
                match self.entries.iter_mut().find(|e| e.symbol == trade.symbol) {
                    Some(entry) => entry.quantity += trade.quantity,
                    None => self.entries.push(PortfolioEntry {
                        symbol: trade.symbol.clone(),
                        quantity: trade.quantity,
                    }),
                }
            }
            TradeAction::Sell => {
                self.balance += trade.total;
                if let Some(entry) = self.entries.iter_mut().find(|e| e.symbol == trade.symbol) {
                    entry.quantity = entry.quantity.saturating_sub(trade.quantity);
                }
                self.entries.retain(|e| e.quantity > 0);
            }
        }
        self.trades.push(trade.clone());
    }
}
