//! Domain error types.
//!
//! Data-availability and configuration errors abort a run and surface to the
//! caller. Per-step trade-validity errors ([`SibylError::InsufficientFunds`],
//! [`SibylError::InsufficientHoldings`]) are absorbed by the engine as a
//! forced HOLD; they only surface from the direct ledger / paper-trading API.

/// Top-level error type for sibyltrader.
#[derive(Debug, thiserror::Error)]
pub enum SibylError {
    #[error("no history for {symbol}")]
    NoData { symbol: String },

    #[error("history too short for {symbol}: {available} simulable days available, need at least {required}")]
    HistoryTooShort {
        symbol: String,
        available: usize,
        required: usize,
    },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("insufficient funds: trade needs {needed:.2}, cash is {cash:.2}")]
    InsufficientFunds { needed: f64, cash: f64 },

    #[error("insufficient holdings: requested {requested}, hold {held}")]
    InsufficientHoldings { requested: u64, held: u64 },

    #[error("degenerate scale in feature column {column}: min equals max")]
    DegenerateScale { column: usize },

    #[error("simulation for {symbol} produced zero steps")]
    EmptySimulation { symbol: String },

    #[error("oracle failure: {reason}")]
    Oracle { reason: String },

    #[error("persistence failure: {reason}")]
    Persistence { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SibylError> for std::process::ExitCode {
    fn from(err: &SibylError) -> Self {
        let code: u8 = match err {
            SibylError::Io(_) => 1,
            SibylError::ConfigParse { .. }
            | SibylError::ConfigMissing { .. }
            | SibylError::ConfigInvalid { .. } => 2,
            SibylError::Data { .. } | SibylError::Persistence { .. } => 3,
            SibylError::Oracle { .. } | SibylError::DegenerateScale { .. } => 4,
            SibylError::NoData { .. }
            | SibylError::HistoryTooShort { .. }
            | SibylError::InsufficientData { .. }
            | SibylError::EmptySimulation { .. } => 5,
            SibylError::InsufficientFunds { .. } | SibylError::InsufficientHoldings { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
