//! Operations and the per-account daily log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A single signed balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Credit positive, debit negative.
    pub delta: i64,
    /// Free text, may be empty.
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl Operation {
    pub fn new(delta: i64, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            delta,
            reason: reason.into(),
            timestamp,
        }
    }

    /// Calendar day (UTC) the operation belongs to.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Ordered log of the operations recorded on one calendar day.
///
/// The log never spans two days: a stale log (first entry from another day)
/// is cleared before the next append. Reads on a stale log see nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationLog {
    entries: Vec<Operation>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored entries, stale or not.
    pub fn entries(&self) -> &[Operation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the stored entries belong to `today`.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.entries.first().is_some_and(|op| op.day() == today)
    }

    /// Drop every entry if the log was started on another day.
    ///
    /// Returns `true` when entries were discarded.
    pub fn rotate_if_stale(&mut self, today: NaiveDate) -> bool {
        if self.entries.is_empty() || self.is_current(today) {
            return false;
        }
        self.entries.clear();
        true
    }

    /// Record an operation, rotating the log first if it belongs to another day.
    pub fn append(&mut self, operation: Operation) {
        self.rotate_if_stale(operation.day());
        self.entries.push(operation);
    }

    /// Today's operations in occurrence order; empty when the log is stale.
    pub fn today(&self, today: NaiveDate) -> &[Operation] {
        if self.is_current(today) {
            &self.entries
        } else {
            &[]
        }
    }

    /// Net change recorded today.
    pub fn daily_delta(&self, today: NaiveDate) -> i64 {
        self.today(today)
            .iter()
            .fold(0i64, |acc, op| acc.saturating_add(op.delta))
    }

    /// First operation recorded at exactly `timestamp`.
    pub fn find(&self, timestamp: DateTime<Utc>) -> Option<&Operation> {
        self.entries.iter().find(|op| op.timestamp == timestamp)
    }

    /// Remove every operation recorded at exactly `timestamp`.
    ///
    /// Returns how many were removed.
    pub fn remove_at(&mut self, timestamp: DateTime<Utc>) -> LedgerResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|op| op.timestamp != timestamp);
        let removed = before - self.entries.len();
        if removed == 0 {
            return Err(LedgerError::OperationNotFound(timestamp));
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
