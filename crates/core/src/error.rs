//! Domain error model for shared primitives.

use thiserror::Error;

/// Failures raised by identifiers and other shared building blocks.
///
/// Ledger rule violations live in `guildbank-finance`; this type only covers
/// what the primitives themselves can reject.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
