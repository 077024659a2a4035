//! Ledger error taxonomy.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Result type used across the ledger domain.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger rule violation.
///
/// Every variant is a local, deterministic validation failure: nothing here is
/// worth retrying. Callers translate these into user-facing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("balance cannot be negative (requested {requested})")]
    NegativeBalance { requested: i64 },

    #[error("insufficient funds: {requested} requested, {available} available")]
    InsufficientFunds { requested: i64, available: i64 },

    #[error("balance would exceed the ceiling of {ceiling} credits")]
    BalanceCeilingExceeded { ceiling: i64 },

    /// Deposits, withdrawals and transfers only accept non-negative amounts.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("invalid balance ceiling: {0} (must be positive)")]
    InvalidCeiling(i64),

    #[error("no operation recorded at {0}")]
    OperationNotFound(DateTime<Utc>),

    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("the daily bonus is disabled in this guild")]
    BonusDisabled,

    #[error("daily bonus already claimed on {0}")]
    BonusAlreadyClaimed(NaiveDate),

    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
}

impl LedgerError {
    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting(msg.into())
    }

    pub fn invalid_currency(msg: impl Into<String>) -> Self {
        Self::InvalidCurrency(msg.into())
    }
}
