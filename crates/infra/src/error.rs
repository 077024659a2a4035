//! Errors surfaced by the bank service.

use thiserror::Error;

use guildbank_finance::LedgerError;

use crate::store::StoreError;

pub type BankResult<T> = Result<T, BankError>;

/// Either a ledger rule was violated or the store failed.
///
/// Both propagate to the caller untouched: no retries, no logging here.
#[derive(Debug, Error)]
pub enum BankError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BankError {
    /// The ledger rule that was violated, if that is what failed.
    pub fn ledger(&self) -> Option<&LedgerError> {
        match self {
            BankError::Ledger(e) => Some(e),
            BankError::Store(_) => None,
        }
    }
}
