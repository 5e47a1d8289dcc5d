//! Configuration validation.
//!
//! Validates all config fields before a backtest or prediction run.

use crate::domain::error::SibylError;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SibylError> {
    validate_initial_capital(config)?;
    validate_days(config)?;
    Ok(())
}

pub fn validate_policy_config(config: &dyn ConfigPort) -> Result<(), SibylError> {
    validate_buy_threshold(config)?;
    validate_sell_threshold(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SibylError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 {
        return Err(SibylError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_days(config: &dyn ConfigPort) -> Result<(), SibylError> {
    let value = config.get_int("backtest", "days", 180);
    if value <= 0 {
        return Err(SibylError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "days".to_string(),
            reason: "days must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_buy_threshold(config: &dyn ConfigPort) -> Result<(), SibylError> {
    let value = config.get_double("policy", "buy_threshold", 1.5);
    if value <= 0.0 {
        return Err(SibylError::ConfigInvalid {
            section: "policy".to_string(),
            key: "buy_threshold".to_string(),
            reason: "buy_threshold must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_sell_threshold(config: &dyn ConfigPort) -> Result<(), SibylError> {
    let value = config.get_double("policy", "sell_threshold", -1.5);
    if value >= 0.0 {
        return Err(SibylError::ConfigInvalid {
            section: "policy".to_string(),
            key: "sell_threshold".to_string(),
            reason: "sell_threshold must be negative".to_string(),
        });
    }
    Ok(())
}
