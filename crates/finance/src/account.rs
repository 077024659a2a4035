//! Member accounts: bounded balance plus daily operation log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::bonus::BonusCache;
use crate::ceiling::BalanceCeiling;
use crate::error::{LedgerError, LedgerResult};
use crate::operation::{Operation, OperationLog};

/// A member's balance-and-log record within one guild's economy.
///
/// `Default` is the implicit account every member has before their first
/// operation: zero balance, empty log.
///
/// Invariant: `0 <= balance <= ceiling` for the ceiling in force when the
/// balance was last written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    balance: i64,
    #[serde(default)]
    operations: OperationLog,
    #[serde(default)]
    bonus: BonusCache,
}

fn ensure_amount(amount: i64) -> LedgerResult<()> {
    if amount < 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn operations(&self) -> &OperationLog {
        &self.operations
    }

    pub fn bonus(&self) -> &BonusCache {
        &self.bonus
    }

    pub(crate) fn bonus_mut(&mut self) -> &mut BonusCache {
        &mut self.bonus
    }

    /// Whether the account can afford `amount`. A negative amount is never affordable.
    pub fn has_at_least(&self, amount: i64) -> bool {
        amount >= 0 && self.balance >= amount
    }

    /// Overwrite the balance and log the difference.
    pub fn set_balance(
        &mut self,
        new_balance: i64,
        reason: impl Into<String>,
        ceiling: BalanceCeiling,
        now: DateTime<Utc>,
    ) -> LedgerResult<i64> {
        ceiling.check(new_balance)?;

        let delta = new_balance - self.balance;
        self.balance = new_balance;
        self.operations.append(Operation::new(delta, reason, now));
        Ok(new_balance)
    }

    pub fn deposit(
        &mut self,
        amount: i64,
        reason: impl Into<String>,
        ceiling: BalanceCeiling,
        now: DateTime<Utc>,
    ) -> LedgerResult<i64> {
        ensure_amount(amount)?;
        let target = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceCeilingExceeded {
                ceiling: ceiling.get(),
            })?;
        self.set_balance(target, reason, ceiling, now)
    }

    pub fn withdraw(
        &mut self,
        amount: i64,
        reason: impl Into<String>,
        ceiling: BalanceCeiling,
        now: DateTime<Utc>,
    ) -> LedgerResult<i64> {
        ensure_amount(amount)?;
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.set_balance(self.balance - amount, reason, ceiling, now)
    }

    /// Transfer where sender and receiver are the same account.
    ///
    /// Same checks and log entries as [`transfer`]; the balance is unchanged.
    pub fn transfer_to_self(
        &mut self,
        amount: i64,
        reason: impl Into<String>,
        ceiling: BalanceCeiling,
        now: DateTime<Utc>,
    ) -> LedgerResult<i64> {
        ensure_amount(amount)?;
        ensure_receivable(self.balance, amount, ceiling)?;

        let mut next = self.clone();
        let reason = reason.into();
        next.withdraw(amount, reason.clone(), ceiling, now)?;
        next.deposit(amount, reason, ceiling, now)?;
        *self = next;
        Ok(self.balance)
    }

    /// Clear the log if it belongs to a previous day.
    pub fn rotate_operations(&mut self, today: NaiveDate) -> bool {
        self.operations.rotate_if_stale(today)
    }

    pub fn operations_today(&self, today: NaiveDate) -> &[Operation] {
        self.operations.today(today)
    }

    pub fn daily_delta(&self, today: NaiveDate) -> i64 {
        self.operations.daily_delta(today)
    }

    pub fn find_operation(&self, timestamp: DateTime<Utc>) -> Option<&Operation> {
        self.operations.find(timestamp)
    }

    /// Remove all operations sharing `timestamp` and return the remaining log.
    pub fn remove_operations(&mut self, timestamp: DateTime<Utc>) -> LedgerResult<&OperationLog> {
        self.operations.remove_at(timestamp)?;
        Ok(&self.operations)
    }

    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    /// Forget the daily bonus claim so it can be claimed again.
    pub fn reset_bonus_cache(&mut self) {
        self.bonus = BonusCache::default();
    }
}

fn ensure_receivable(balance: i64, amount: i64, ceiling: BalanceCeiling) -> LedgerResult<()> {
    match balance.checked_add(amount) {
        Some(total) if total <= ceiling.get() => Ok(()),
        _ => Err(LedgerError::BalanceCeilingExceeded {
            ceiling: ceiling.get(),
        }),
    }
}

/// Move `amount` from `from` to `to`.
///
/// The receiver's ceiling is checked first, then the sender's funds; both
/// accounts are untouched unless every check passes.
pub fn transfer(
    from: &mut Account,
    to: &mut Account,
    amount: i64,
    reason: impl Into<String>,
    ceiling: BalanceCeiling,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    ensure_amount(amount)?;
    ensure_receivable(to.balance, amount, ceiling)?;

    let mut sender = from.clone();
    let mut receiver = to.clone();
    let reason = reason.into();
    sender.withdraw(amount, reason.clone(), ceiling, now)?;
    receiver.deposit(amount, reason, ceiling, now)?;

    *from = sender;
    *to = receiver;
    Ok(())
}
