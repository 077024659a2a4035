//! Per-account mutual exclusion.
//!
//! Every read-modify-write of an account happens while holding that account's
//! lock, so two concurrent deposits can no longer overwrite each other.
//! Transfers take both locks in ascending key order. Bulk deletes take the
//! whole registry exclusively, after every in-flight account guard is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};

use guildbank_core::AccountKey;

/// Idle slots are pruned once the registry grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountKey, Arc<AsyncMutex<()>>>>,
    bulk: Arc<RwLock<()>>,
}

/// Guard over one or two account locks.
#[derive(Debug)]
pub struct AccountGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
    _shared: OwnedRwLockReadGuard<()>,
}

/// Exclusive hold on every account at once.
#[derive(Debug)]
pub struct BulkGuard {
    _exclusive: OwnedRwLockWriteGuard<()>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: AccountKey) -> Arc<AsyncMutex<()>> {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slots.len() >= PRUNE_THRESHOLD {
            // Only the registry references an idle slot.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        slots.entry(key).or_default().clone()
    }

    pub async fn lock(&self, key: AccountKey) -> AccountGuard {
        let shared = self.bulk.clone().read_owned().await;
        let first = self.slot(key).lock_owned().await;
        AccountGuard {
            _first: first,
            _second: None,
            _shared: shared,
        }
    }

    /// Lock two accounts without risking a deadlock against another pair.
    pub async fn lock_pair(&self, a: AccountKey, b: AccountKey) -> AccountGuard {
        if a == b {
            return self.lock(a).await;
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let shared = self.bulk.clone().read_owned().await;
        let first = self.slot(low).lock_owned().await;
        let second = self.slot(high).lock_owned().await;
        AccountGuard {
            _first: first,
            _second: Some(second),
            _shared: shared,
        }
    }

    /// Wait for every account guard to drop and block new ones until the
    /// returned guard is released.
    pub async fn lock_all(&self) -> BulkGuard {
        BulkGuard {
            _exclusive: self.bulk.clone().write_owned().await,
        }
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        match self.slots.lock() {
            Ok(slots) => slots.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
