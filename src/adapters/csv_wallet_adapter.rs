//! CSV wallet persistence adapter.
//!
//! Persists wallet state as a single tagged-row CSV file:
//!
//! ```text
//! BALANCE,97500.00
//! HOLDING,INFY,5
//! TRADE,2024-06-03,INFY,BUY,500.00,5,2500.00,97500.00
//! ```
//!
//! Rows vary in width by tag, so both reader and writer run flexible and
//! headerless. Legacy files that stored a holding as a bare fractional
//! count are migrated on load by flooring the quantity. Saves go through a
//! temp file in the same directory followed by a rename, so a crash
//! mid-write never leaves a truncated wallet behind.

use crate::domain::error::SibylError;
use crate::domain::ledger::{Trade, TradeAction};
use crate::domain::wallet::{PortfolioEntry, Wallet};
use crate::ports::wallet_port::WalletPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvWalletAdapter {
    path: PathBuf,
}

impl CsvWalletAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn persistence_err(&self, what: &str, detail: impl std::fmt::Display) -> SibylError {
        SibylError::Persistence {
            reason: format!("{} {}: {}", what, self.path.display(), detail),
        }
    }
}

fn parse_action(value: &str) -> Result<TradeAction, SibylError> {
    match value {
        "BUY" => Ok(TradeAction::Buy),
        "SELL" => Ok(TradeAction::Sell),
        other => Err(SibylError::Persistence {
            reason: format!("unknown trade action {:?}", other),
        }),
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    bad_row: &impl Fn(&str) -> SibylError,
    name: &str,
) -> Result<&'a str, SibylError> {
    record
        .get(index)
        .ok_or_else(|| bad_row(&format!("missing {}", name)))
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    bad_row: &impl Fn(&str) -> SibylError,
    name: &str,
) -> Result<T, SibylError> {
    field(record, index, bad_row, name)?
        .parse()
        .map_err(|_| bad_row(&format!("bad {}", name)))
}

impl WalletPort for CsvWalletAdapter {
    fn load(&self) -> Result<Option<Wallet>, SibylError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.persistence_err("failed to read", e))?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut wallet = Wallet::new(0.0);
        for (row, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| self.persistence_err("failed to parse", e))?;
            let bad_row = |detail: &str| SibylError::Persistence {
                reason: format!("{} row {}: {}", self.path.display(), row + 1, detail),
            };

            match field(&record, 0, &bad_row, "row tag")? {
                "BALANCE" => {
                    wallet.balance = parse_field(&record, 1, &bad_row, "balance")?;
                }
                "HOLDING" => {
                    let symbol = field(&record, 1, &bad_row, "symbol")?.to_string();
                    // Older versions wrote fractional quantities.
                    let quantity =
                        parse_field::<f64>(&record, 2, &bad_row, "quantity")?.floor() as u64;
                    if quantity > 0 {
                        wallet.entries.push(PortfolioEntry { symbol, quantity });
                    }
                }
                "TRADE" => {
                    let date_str = field(&record, 1, &bad_row, "trade date")?;
                    wallet.trades.push(Trade {
                        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                            .map_err(|_| bad_row("bad trade date"))?,
                        symbol: field(&record, 2, &bad_row, "symbol")?.to_string(),
                        action: parse_action(field(&record, 3, &bad_row, "action")?)?,
                        price: parse_field(&record, 4, &bad_row, "price")?,
                        quantity: parse_field(&record, 5, &bad_row, "quantity")?,
                        total: parse_field(&record, 6, &bad_row, "total")?,
                        resulting_balance: parse_field(&record, 7, &bad_row, "balance")?,
                    });
                }
                other => {
                    return Err(bad_row(&format!("unknown row tag {:?}", other)));
                }
            }
        }
        Ok(Some(wallet))
    }

    fn save(&self, wallet: &Wallet) -> Result<(), SibylError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());

        let write_err = |e: csv::Error| SibylError::Persistence {
            reason: format!("failed to serialize wallet: {}", e),
        };
        wtr.write_record(["BALANCE", format!("{:.2}", wallet.balance).as_str()])
            .map_err(write_err)?;
        for entry in &wallet.entries {
            wtr.write_record([
                "HOLDING",
                entry.symbol.as_str(),
                entry.quantity.to_string().as_str(),
            ])
            .map_err(write_err)?;
        }
        for trade in &wallet.trades {
            wtr.write_record([
                "TRADE",
                trade.date.format("%Y-%m-%d").to_string().as_str(),
                trade.symbol.as_str(),
                trade.action.as_str(),
                format!("{:.2}", trade.price).as_str(),
                trade.quantity.to_string().as_str(),
                format!("{:.2}", trade.total).as_str(),
                format!("{:.2}", trade.resulting_balance).as_str(),
            ])
            .map_err(write_err)?;
        }
        let out = wtr.into_inner().map_err(|e| SibylError::Persistence {
            reason: format!("failed to serialize wallet: {}", e),
        })?;

        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, out).map_err(|e| self.persistence_err("failed to write", e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| self.persistence_err("failed to replace", e))?;
        Ok(())
    }
}
