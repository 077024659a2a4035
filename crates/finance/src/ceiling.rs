//! Process-wide balance ceiling.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Maximum balance any account may hold, in any guild.
///
/// Always strictly positive. Passed explicitly to every mutating ledger call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct BalanceCeiling(i64);

impl BalanceCeiling {
    pub const DEFAULT: Self = Self(1_000_000_000);

    pub fn new(value: i64) -> LedgerResult<Self> {
        if value <= 0 {
            return Err(LedgerError::InvalidCeiling(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Rejects balances that are negative or above the ceiling.
    pub fn check(self, balance: i64) -> LedgerResult<()> {
        if balance < 0 {
            return Err(LedgerError::NegativeBalance { requested: balance });
        }
        if balance > self.0 {
            return Err(LedgerError::BalanceCeilingExceeded { ceiling: self.0 });
        }
        Ok(())
    }
}

impl Default for BalanceCeiling {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for BalanceCeiling {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BalanceCeiling> for i64 {
    fn from(value: BalanceCeiling) -> Self {
        value.0
    }
}

impl core::fmt::Display for BalanceCeiling {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
