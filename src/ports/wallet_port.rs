//! Wallet persistence port.

use crate::domain::error::SibylError;
use crate::domain::wallet::Wallet;

/// Store for virtual-wallet state between paper-trading steps.
///
/// Failures are explicit [`SibylError::Persistence`] values. The caller
/// decides once whether they are fatal; nothing is silently swallowed.
pub trait WalletPort {
    /// Load the wallet, or `None` when no state has been persisted yet.
    fn load(&self) -> Result<Option<Wallet>, SibylError>;

    fn save(&self, wallet: &Wallet) -> Result<(), SibylError>;
}
