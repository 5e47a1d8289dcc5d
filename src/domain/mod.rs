//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod enrich;
pub mod scaler;
pub mod signal;
pub mod ledger;
pub mod wallet;
pub mod engine;
pub mod config_validation;
pub mod error;
