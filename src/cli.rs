//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvHistoryAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::csv_wallet_adapter::CsvWalletAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::momentum_oracle::MomentumOracle;
use crate::domain::config_validation::{validate_backtest_config, validate_policy_config};
use crate::domain::engine::{self, BacktestParams};
use crate::domain::enrich::{enrich, EnrichedBar, CLOSE_COLUMN};
use crate::domain::error::SibylError;
use crate::domain::ledger::{apply_trade, TradeAction};
use crate::domain::scaler::MinMaxScaler;
use crate::domain::signal::{confidence, decide, refine, Thresholds};
use crate::domain::wallet::Wallet;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::HistoryPort;
use crate::ports::oracle_port::{NormalizedWindow, PredictionOracle, LOOKBACK_WINDOW};
use crate::ports::report_port::ReportPort;
use crate::ports::wallet_port::WalletPort;

#[derive(Parser, Debug)]
#[command(name = "sibyltrader", about = "Prediction-driven trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a historical backtest for one symbol
    Backtest {
        /// Directory of <SYMBOL>.csv history files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Simulated day count (degrades to fit the history)
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        capital: Option<f64>,
        #[arg(long)]
        buy_threshold: Option<f64>,
        #[arg(long)]
        sell_threshold: Option<f64>,
        /// Re-fit the feature scaler each step on past bars only
        #[arg(long)]
        strict_scaler: bool,
        /// Directory for equity/trade/summary artifacts
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Predict tomorrow's signal for one symbol
    Predict {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// News sentiment score in [-1, 1]
        #[arg(long, default_value_t = 0.0)]
        sentiment: f64,
        /// Wallet file, used to refine the signal against holdings
        #[arg(short, long)]
        wallet: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Record a paper trade against the wallet
    Trade {
        #[arg(short, long)]
        wallet: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        action: TradeSide,
        #[arg(short, long)]
        price: f64,
        #[arg(short, long)]
        quantity: u64,
        /// Starting balance when the wallet file does not exist yet
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            data,
            symbol,
            config,
            days,
            capital,
            buy_threshold,
            sell_threshold,
            strict_scaler,
            output,
            json,
        } => run_backtest(
            &data,
            &symbol,
            config.as_ref(),
            days,
            capital,
            buy_threshold,
            sell_threshold,
            strict_scaler,
            output.as_ref(),
            json,
        ),
        Command::Predict {
            data,
            symbol,
            sentiment,
            wallet,
            config,
        } => run_predict(&data, &symbol, sentiment, wallet.as_ref(), config.as_ref()),
        Command::Trade {
            wallet,
            symbol,
            action,
            price,
            quantity,
            capital,
        } => run_trade(&wallet, &symbol, action, price, quantity, capital),
        Command::ListSymbols { data } => run_list_symbols(&data),
    }
}

fn fail(e: &SibylError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

fn load_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    match path {
        Some(p) => {
            let adapter = FileConfigAdapter::from_file(p).map_err(|e| fail(&e))?;
            validate_backtest_config(&adapter).map_err(|e| fail(&e))?;
            validate_policy_config(&adapter).map_err(|e| fail(&e))?;
            Ok(Some(adapter))
        }
        None => Ok(None),
    }
}

fn build_params(
    config: Option<&FileConfigAdapter>,
    days: Option<usize>,
    capital: Option<f64>,
    buy_threshold: Option<f64>,
    sell_threshold: Option<f64>,
    strict_scaler: bool,
) -> BacktestParams {
    let defaults = BacktestParams::default();
    // CLI flags beat config values beat built-in defaults.
    let from_config = |section: &str, key: &str, fallback: f64| -> f64 {
        config
            .map(|c| c.get_double(section, key, fallback))
            .unwrap_or(fallback)
    };

    BacktestParams {
        days: days.unwrap_or_else(|| {
            config
                .map(|c| c.get_int("backtest", "days", defaults.days as i64) as usize)
                .unwrap_or(defaults.days)
        }),
        initial_capital: capital
            .unwrap_or_else(|| from_config("backtest", "initial_capital", defaults.initial_capital)),
        thresholds: Thresholds {
            buy_pct: buy_threshold
                .unwrap_or_else(|| from_config("policy", "buy_threshold", defaults.thresholds.buy_pct)),
            sell_pct: sell_threshold.unwrap_or_else(|| {
                from_config("policy", "sell_threshold", defaults.thresholds.sell_pct)
            }),
        },
        strict_scaler: strict_scaler
            || config
                .map(|c| c.get_bool("policy", "strict_scaler", false))
                .unwrap_or(false),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_backtest(
    data: &PathBuf,
    symbol: &str,
    config_path: Option<&PathBuf>,
    days: Option<usize>,
    capital: Option<f64>,
    buy_threshold: Option<f64>,
    sell_threshold: Option<f64>,
    strict_scaler: bool,
    output: Option<&PathBuf>,
    json: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let params = build_params(
        config.as_ref(),
        days,
        capital,
        buy_threshold,
        sell_threshold,
        strict_scaler,
    );

    let history = CsvHistoryAdapter::new(data.clone());
    let bars = match history.get_history(symbol) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    let oracle = MomentumOracle::default();
    let result = match engine::run_backtest(symbol, &bars, &oracle, &params) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    if let Some(dir) = output {
        if let Err(e) = CsvReportAdapter::new().write(&result, dir) {
            return fail(&e);
        }
        eprintln!("Reports written to {}", dir.display());
    }

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                let err = SibylError::Persistence {
                    reason: format!("JSON encode failed: {}", e),
                };
                return fail(&err);
            }
        }
    } else {
        println!("Symbol:          {}", result.symbol);
        println!("Simulated days:  {}", result.adjusted_days);
        println!("Initial capital: {:.2}", result.initial_capital);
        println!("Final value:     {:.2}", result.final_value);
        println!("Return:          {:.2}%", result.return_pct);
        println!("Trades:          {}", result.trades_count);
    }
    ExitCode::SUCCESS
}

fn run_predict(
    data: &PathBuf,
    symbol: &str,
    sentiment: f64,
    wallet_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let thresholds = Thresholds {
        buy_pct: config
            .as_ref()
            .map(|c| c.get_double("policy", "buy_threshold", 1.5))
            .unwrap_or(1.5),
        sell_pct: config
            .as_ref()
            .map(|c| c.get_double("policy", "sell_threshold", -1.5))
            .unwrap_or(-1.5),
    };

    let history = CsvHistoryAdapter::new(data.clone());
    let bars = match history.get_history(symbol) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    let enriched = match enrich(&bars) {
        Ok(e) => e,
        Err(e) => return fail(&e),
    };
    if enriched.len() < LOOKBACK_WINDOW {
        let err = SibylError::HistoryTooShort {
            symbol: symbol.to_string(),
            available: enriched.len(),
            required: LOOKBACK_WINDOW,
        };
        return fail(&err);
    }

    let features: Vec<_> = enriched.iter().map(EnrichedBar::feature_row).collect();
    let scaler = MinMaxScaler::fit(&features);
    let scaled = scaler.transform(&features);
    let window = match NormalizedWindow::new(scaled[scaled.len() - LOOKBACK_WINDOW..].to_vec()) {
        Ok(w) => w,
        Err(e) => return fail(&e),
    };

    let oracle = MomentumOracle::default();
    let predicted_scaled = match oracle.predict(&window) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let predicted_price = scaler.inverse_column(predicted_scaled, CLOSE_COLUMN);

    // Length was checked against the lookback above.
    let last_enriched = enriched.last().unwrap();
    let current_close = last_enriched.bar.close;
    let move_pct = (predicted_price - current_close) / current_close * 100.0;

    let held_quantity = match wallet_path {
        Some(path) => match CsvWalletAdapter::new(path.clone()).load() {
            Ok(Some(wallet)) => wallet.holding_quantity(symbol),
            Ok(None) => 0,
            Err(e) => return fail(&e),
        },
        None => 0,
    };

    let raw = decide(move_pct, &thresholds);
    let decision = refine(raw, held_quantity, sentiment);
    let score = confidence(
        decision.signal,
        sentiment,
        last_enriched.rsi_14,
        last_enriched.macd_hist,
    );

    println!("Symbol:          {symbol}");
    println!("Current close:   {current_close:.2}");
    println!("Predicted close: {predicted_price:.2} ({move_pct:+.2}%)");
    println!("Signal:          {}", decision.signal.as_str());
    println!("Confidence:      {score}");
    if decision.risk_flag {
        println!("Risk:            strongly negative sentiment against a buy signal");
    }
    ExitCode::SUCCESS
}

fn run_trade(
    wallet_path: &PathBuf,
    symbol: &str,
    action: TradeSide,
    price: f64,
    quantity: u64,
    capital: f64,
) -> ExitCode {
    let store = CsvWalletAdapter::new(wallet_path.clone());
    let mut wallet = match store.load() {
        Ok(Some(w)) => w,
        Ok(None) => Wallet::new(capital),
        Err(e) => return fail(&e),
    };

    let action = match action {
        TradeSide::Buy => TradeAction::Buy,
        TradeSide::Sell => TradeAction::Sell,
    };
    let today = chrono::Local::now().date_naive();

    let ledger = wallet.ledger_for(symbol);
    let updated = match apply_trade(&ledger, action, today, symbol, price, quantity) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };
    // apply_trade appends exactly one trade on success.
    let trade = updated.trade_log.last().cloned();
    if let Some(trade) = trade {
        wallet.absorb(&trade);
    }

    if let Err(e) = store.save(&wallet) {
        return fail(&e);
    }

    println!(
        "{} {} {} @ {:.2}, balance {:.2}",
        action.as_str(),
        quantity,
        symbol,
        price,
        wallet.balance
    );
    ExitCode::SUCCESS
}

fn run_list_symbols(data: &PathBuf) -> ExitCode {
    let history = CsvHistoryAdapter::new(data.clone());
    match history.list_symbols() {
        Ok(symbols) => {
            for symbol in symbols {
                println!("{symbol}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
