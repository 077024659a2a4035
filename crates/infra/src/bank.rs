//! The bank: ledger operations over the backing store.
//!
//! Each operation loads the account, applies the pure ledger rule from
//! `guildbank-finance`, and writes the record back, all while holding the
//! account's lock:
//!
//! ```text
//! lock(account) → load (default if missing) → apply rule → save → unlock
//! ```
//!
//! Transfers lock both accounts and persist both records in one atomic store
//! write. Rule violations and store failures go back to the caller as
//! `BankError`; nothing is retried.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument};

use guildbank_core::{AccountKey, Clock, GuildId, MemberId, RoleId, SystemClock};
use guildbank_finance::{
    leaderboard, leaderboard_position, plan_top_role, total_credits, transfer, Account,
    BalanceCeiling, BonusClaim, Currency, GlobalSettings, GuildSettings, LedgerResult, Operation,
    OperationLog, RoleChanges, Standing,
};

use crate::error::BankResult;
use crate::locks::AccountLocks;
use crate::store::BankStore;

pub struct Bank<S, C = SystemClock> {
    store: S,
    clock: C,
    locks: AccountLocks,
    settings_lock: AsyncMutex<()>,
    default_ceiling: BalanceCeiling,
}

impl<S: BankStore> Bank<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S, C> Bank<S, C>
where
    S: BankStore,
    C: Clock,
{
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            locks: AccountLocks::new(),
            settings_lock: AsyncMutex::new(()),
            default_ceiling: BalanceCeiling::DEFAULT,
        }
    }

    /// Ceiling used while no global settings record has been stored.
    pub fn with_default_ceiling(mut self, ceiling: BalanceCeiling) -> Self {
        self.default_ceiling = ceiling;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    async fn load_or_default(&self, key: AccountKey) -> BankResult<Account> {
        Ok(self.store.load_account(key).await?.unwrap_or_default())
    }

    /// Locked read-modify-write of one account. The record is saved only if
    /// `apply` succeeds.
    async fn mutate<T, F>(&self, key: AccountKey, apply: F) -> BankResult<T>
    where
        F: FnOnce(&mut Account, BalanceCeiling, DateTime<Utc>) -> LedgerResult<T>,
    {
        let _guard = self.locks.lock(key).await;
        let ceiling = self.max_balance().await?;
        let mut account = self.load_or_default(key).await?;
        let out = apply(&mut account, ceiling, self.clock.now())?;
        self.store.save_account(key, &account).await?;
        Ok(out)
    }

    /// Locked edit of an account that is already stored. Members without a
    /// record are left alone so they do not show up in rankings.
    async fn update_stored<F>(&self, key: AccountKey, apply: F) -> BankResult<bool>
    where
        F: FnOnce(&mut Account),
    {
        let _guard = self.locks.lock(key).await;
        let Some(mut account) = self.store.load_account(key).await? else {
            return Ok(false);
        };
        apply(&mut account);
        self.store.save_account(key, &account).await?;
        Ok(true)
    }

    pub async fn max_balance(&self) -> BankResult<BalanceCeiling> {
        Ok(self
            .store
            .load_global_settings()
            .await?
            .map(|g| g.max_balance)
            .unwrap_or(self.default_ceiling))
    }

    /// Change the ceiling for every guild. Existing balances are left as they are.
    #[instrument(skip(self))]
    pub async fn set_max_balance(&self, value: i64) -> BankResult<BalanceCeiling> {
        let ceiling = BalanceCeiling::new(value)?;
        let _guard = self.settings_lock.lock().await;
        self.store
            .save_global_settings(&GlobalSettings {
                max_balance: ceiling,
            })
            .await?;
        info!(max_balance = ceiling.get(), "balance ceiling updated");
        Ok(ceiling)
    }

    /// Current record; a member without one gets an empty account.
    pub async fn account(&self, key: AccountKey) -> BankResult<Account> {
        self.load_or_default(key).await
    }

    pub async fn balance(&self, key: AccountKey) -> BankResult<i64> {
        Ok(self.load_or_default(key).await?.balance())
    }

    pub async fn has_at_least(&self, key: AccountKey, amount: i64) -> BankResult<bool> {
        Ok(self.load_or_default(key).await?.has_at_least(amount))
    }

    #[instrument(skip(self, reason), fields(account = %key))]
    pub async fn set_balance(&self, key: AccountKey, value: i64, reason: &str) -> BankResult<i64> {
        let balance = self
            .mutate(key, |account, ceiling, now| {
                account.set_balance(value, reason, ceiling, now)
            })
            .await?;
        info!(balance, "balance set");
        Ok(balance)
    }

    #[instrument(skip(self, reason), fields(account = %key))]
    pub async fn deposit(&self, key: AccountKey, amount: i64, reason: &str) -> BankResult<i64> {
        let balance = self
            .mutate(key, |account, ceiling, now| {
                account.deposit(amount, reason, ceiling, now)
            })
            .await?;
        info!(balance, "deposit recorded");
        Ok(balance)
    }

    #[instrument(skip(self, reason), fields(account = %key))]
    pub async fn withdraw(&self, key: AccountKey, amount: i64, reason: &str) -> BankResult<i64> {
        let balance = self
            .mutate(key, |account, ceiling, now| {
                account.withdraw(amount, reason, ceiling, now)
            })
            .await?;
        info!(balance, "withdrawal recorded");
        Ok(balance)
    }

    /// Move credits between two accounts atomically.
    ///
    /// Returns both accounts after the transfer, sender first.
    #[instrument(skip(self, reason), fields(from = %from, to = %to))]
    pub async fn transfer(
        &self,
        from: AccountKey,
        to: AccountKey,
        amount: i64,
        reason: &str,
    ) -> BankResult<(Account, Account)> {
        let _guard = self.locks.lock_pair(from, to).await;
        let ceiling = self.max_balance().await?;
        let now = self.clock.now();

        if from == to {
            let mut account = self.load_or_default(from).await?;
            account.transfer_to_self(amount, reason, ceiling, now)?;
            self.store.save_account(from, &account).await?;
            info!(amount, "self transfer recorded");
            return Ok((account.clone(), account));
        }

        let mut sender = self.load_or_default(from).await?;
        let mut receiver = self.load_or_default(to).await?;
        transfer(&mut sender, &mut receiver, amount, reason, ceiling, now)?;

        self.store
            .save_accounts(&[(from, sender.clone()), (to, receiver.clone())])
            .await?;
        info!(amount, "transfer recorded");
        Ok((sender, receiver))
    }

    pub async fn operations_today(&self, key: AccountKey) -> BankResult<Vec<Operation>> {
        let today = self.clock.today();
        Ok(self
            .load_or_default(key)
            .await?
            .operations_today(today)
            .to_vec())
    }

    pub async fn daily_delta(&self, key: AccountKey) -> BankResult<i64> {
        let today = self.clock.today();
        Ok(self.load_or_default(key).await?.daily_delta(today))
    }

    pub async fn find_operation(
        &self,
        key: AccountKey,
        timestamp: DateTime<Utc>,
    ) -> BankResult<Option<Operation>> {
        Ok(self
            .load_or_default(key)
            .await?
            .find_operation(timestamp)
            .cloned())
    }

    /// Remove every operation recorded at `timestamp`; returns the remaining log.
    #[instrument(skip(self), fields(account = %key))]
    pub async fn remove_operation(
        &self,
        key: AccountKey,
        timestamp: DateTime<Utc>,
    ) -> BankResult<OperationLog> {
        self.mutate(key, |account, _, _| {
            account.remove_operations(timestamp).cloned()
        })
        .await
    }

    /// Drop the stored log if it belongs to a previous day.
    pub async fn rotate_operations(&self, key: AccountKey) -> BankResult<bool> {
        let _guard = self.locks.lock(key).await;
        let mut account = self.load_or_default(key).await?;
        if !account.rotate_operations(self.clock.today()) {
            return Ok(false);
        }
        self.store.save_account(key, &account).await?;
        Ok(true)
    }

    /// Clear the member's log. Returns whether the member has a record.
    #[instrument(skip(self), fields(account = %key))]
    pub async fn wipe_operations(&self, key: AccountKey) -> BankResult<bool> {
        self.update_stored(key, Account::clear_operations).await
    }

    /// Delete the member's record in this guild. Returns whether one existed.
    #[instrument(skip(self), fields(account = %key))]
    pub async fn wipe_account(&self, key: AccountKey) -> BankResult<bool> {
        let _guard = self.locks.lock(key).await;
        let existed = self.store.delete_account(key).await?;
        info!(existed, "account wiped");
        Ok(existed)
    }

    #[instrument(skip(self))]
    pub async fn wipe_guild(&self, guild_id: GuildId) -> BankResult<usize> {
        let _all = self.locks.lock_all().await;
        let deleted = self.store.delete_guild(guild_id).await?;
        info!(deleted, "guild accounts wiped");
        Ok(deleted)
    }

    /// Delete the member's accounts in every guild.
    #[instrument(skip(self))]
    pub async fn forget_member(&self, member_id: MemberId) -> BankResult<usize> {
        let _all = self.locks.lock_all().await;
        let deleted = self.store.delete_member(member_id).await?;
        info!(deleted, "member data deleted");
        Ok(deleted)
    }

    /// Forget the last bonus claim. Returns whether the member has a record.
    #[instrument(skip(self), fields(account = %key))]
    pub async fn reset_bonus_cache(&self, key: AccountKey) -> BankResult<bool> {
        self.update_stored(key, Account::reset_bonus_cache).await
    }

    /// Richest members first; `limit` of `None` or `Some(0)` returns everyone.
    pub async fn leaderboard(
        &self,
        guild_id: GuildId,
        limit: Option<usize>,
    ) -> BankResult<Vec<Standing>> {
        let accounts = self.store.list_accounts(guild_id).await?;
        Ok(leaderboard(accounts, limit))
    }

    /// 1-based rank; a member without an account is placed last.
    pub async fn leaderboard_position(&self, key: AccountKey) -> BankResult<usize> {
        let ranking = self.leaderboard(key.guild_id, None).await?;
        Ok(leaderboard_position(&ranking, key.member_id))
    }

    pub async fn guild_total_credits(&self, guild_id: GuildId) -> BankResult<i64> {
        let accounts = self.store.list_accounts(guild_id).await?;
        Ok(total_credits(accounts.iter().map(|(_, a)| a)))
    }

    pub async fn guild_settings(&self, guild_id: GuildId) -> BankResult<GuildSettings> {
        Ok(self
            .store
            .load_guild_settings(guild_id)
            .await?
            .unwrap_or_default())
    }

    async fn update_settings<F>(&self, guild_id: GuildId, apply: F) -> BankResult<GuildSettings>
    where
        F: FnOnce(&mut GuildSettings) -> LedgerResult<()>,
    {
        let _guard = self.settings_lock.lock().await;
        let mut settings = self.guild_settings(guild_id).await?;
        apply(&mut settings)?;
        self.store.save_guild_settings(guild_id, &settings).await?;
        Ok(settings)
    }

    pub async fn currency(&self, guild_id: GuildId) -> BankResult<Currency> {
        Ok(self.guild_settings(guild_id).await?.currency)
    }

    #[instrument(skip(self))]
    pub async fn set_currency(
        &self,
        guild_id: GuildId,
        currency: Currency,
    ) -> BankResult<Currency> {
        let settings = self
            .update_settings(guild_id, |s| {
                s.currency = currency;
                Ok(())
            })
            .await?;
        info!("currency updated");
        Ok(settings.currency)
    }

    #[instrument(skip(self))]
    pub async fn set_daily_bonus(
        &self,
        guild_id: GuildId,
        amount: i64,
    ) -> BankResult<GuildSettings> {
        self.update_settings(guild_id, |s| s.set_daily_bonus(amount)).await
    }

    #[instrument(skip(self))]
    pub async fn set_booster_bonus(
        &self,
        guild_id: GuildId,
        amount: i64,
    ) -> BankResult<GuildSettings> {
        self.update_settings(guild_id, |s| {
            s.set_booster_bonus(amount);
            Ok(())
        })
        .await
    }

    /// `None` disables the top-account role.
    #[instrument(skip(self))]
    pub async fn set_top_account_role(
        &self,
        guild_id: GuildId,
        role: Option<RoleId>,
    ) -> BankResult<GuildSettings> {
        self.update_settings(guild_id, |s| {
            s.top_account_role = role;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(account = %key))]
    pub async fn claim_daily_bonus(
        &self,
        key: AccountKey,
        is_booster: bool,
    ) -> BankResult<BonusClaim> {
        let settings = self.guild_settings(key.guild_id).await?;
        let claim = self
            .mutate(key, |account, ceiling, now| {
                account.claim_daily_bonus(&settings, is_booster, ceiling, now)
            })
            .await?;
        info!(
            amount = claim.total(),
            balance = claim.new_balance,
            "daily bonus claimed"
        );
        Ok(claim)
    }

    /// Role edits that make the guild's richest member the sole holder of the
    /// configured top-account role. `None` when no role is configured.
    pub async fn top_role_plan(
        &self,
        guild_id: GuildId,
        current_holders: &[MemberId],
    ) -> BankResult<Option<(RoleId, RoleChanges)>> {
        let Some(role) = self.guild_settings(guild_id).await?.top_account_role else {
            return Ok(None);
        };
        let ranking = self.leaderboard(guild_id, Some(1)).await?;
        let leader = ranking.first().map(|s| s.member_id);
        Ok(Some((role, plan_top_role(current_holders, leader))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use guildbank_core::ManualClock;
    use guildbank_finance::LedgerError;

    use crate::error::BankError;
    use crate::store::{InMemoryBankStore, StoreError};

    type TestBank = Bank<Arc<InMemoryBankStore>, Arc<ManualClock>>;

    const GUILD: GuildId = GuildId::new(900);

    fn key(member: u64) -> AccountKey {
        AccountKey::new(GUILD, MemberId::new(member))
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap()
    }

    fn setup() -> (TestBank, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let bank = Bank::with_clock(Arc::new(InMemoryBankStore::new()), clock.clone());
        (bank, clock)
    }

    /// In-memory store that hands control back to the scheduler after every
    /// account read, so another task can run between load and save.
    struct YieldingStore(InMemoryBankStore);

    #[async_trait]
    impl BankStore for YieldingStore {
        async fn load_account(&self, key: AccountKey) -> Result<Option<Account>, StoreError> {
            let account = self.0.load_account(key).await;
            tokio::task::yield_now().await;
            account
        }

        async fn save_account(&self, key: AccountKey, account: &Account) -> Result<(), StoreError> {
            self.0.save_account(key, account).await
        }

        async fn save_accounts(
            &self,
            accounts: &[(AccountKey, Account)],
        ) -> Result<(), StoreError> {
            self.0.save_accounts(accounts).await
        }

        async fn delete_account(&self, key: AccountKey) -> Result<bool, StoreError> {
            self.0.delete_account(key).await
        }

        async fn list_accounts(
            &self,
            guild_id: GuildId,
        ) -> Result<Vec<(MemberId, Account)>, StoreError> {
            self.0.list_accounts(guild_id).await
        }

        async fn delete_guild(&self, guild_id: GuildId) -> Result<usize, StoreError> {
            self.0.delete_guild(guild_id).await
        }

        async fn delete_member(&self, member_id: MemberId) -> Result<usize, StoreError> {
            self.0.delete_member(member_id).await
        }

        async fn load_guild_settings(
            &self,
            guild_id: GuildId,
        ) -> Result<Option<GuildSettings>, StoreError> {
            self.0.load_guild_settings(guild_id).await
        }

        async fn save_guild_settings(
            &self,
            guild_id: GuildId,
            settings: &GuildSettings,
        ) -> Result<(), StoreError> {
            self.0.save_guild_settings(guild_id, settings).await
        }

        async fn load_global_settings(&self) -> Result<Option<GlobalSettings>, StoreError> {
            self.0.load_global_settings().await
        }

        async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), StoreError> {
            self.0.save_global_settings(settings).await
        }
    }

    fn yielding_bank() -> Arc<Bank<YieldingStore>> {
        Arc::new(Bank::new(YieldingStore(InMemoryBankStore::new())))
    }

    fn ledger_err<T: std::fmt::Debug>(result: BankResult<T>) -> LedgerError {
        match result {
            Err(BankError::Ledger(e)) => e,
            other => panic!("expected a ledger error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_member_has_an_empty_account() {
        let (bank, _) = setup();
        assert_eq!(bank.balance(key(1)).await.unwrap(), 0);
        assert!(bank.operations_today(key(1)).await.unwrap().is_empty());
        assert!(!bank.has_at_least(key(1), 1).await.unwrap());
        assert!(bank.store().load_account(key(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_transfer_over_ceiling_changes_nothing() {
        let (bank, _) = setup();
        bank.set_max_balance(1000).await.unwrap();
        bank.set_balance(key(1), 950, "seed").await.unwrap();
        bank.set_balance(key(2), 950, "seed").await.unwrap();

        let err = ledger_err(bank.transfer(key(1), key(2), 100, "gift").await);
        assert_eq!(err, LedgerError::BalanceCeilingExceeded { ceiling: 1000 });
        assert_eq!(bank.balance(key(1)).await.unwrap(), 950);
        assert_eq!(bank.balance(key(2)).await.unwrap(), 950);
    }

    #[tokio::test]
    async fn transfer_returns_both_accounts() {
        let (bank, _) = setup();
        bank.deposit(key(1), 500, "salary").await.unwrap();

        let (from, to) = bank.transfer(key(1), key(2), 200, "gift").await.unwrap();
        assert_eq!(from.balance(), 300);
        assert_eq!(to.balance(), 200);
        assert_eq!(bank.daily_delta(key(2)).await.unwrap(), 200);
        assert_eq!(bank.daily_delta(key(1)).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn transfer_to_self_keeps_the_balance() {
        let (bank, _) = setup();
        bank.deposit(key(1), 80, "").await.unwrap();
        let (from, to) = bank.transfer(key(1), key(1), 30, "loop").await.unwrap();
        assert_eq!(from, to);
        assert_eq!(from.balance(), 80);
        assert_eq!(bank.operations_today(key(1)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rejected_calls_leave_the_balance_alone() {
        let (bank, _) = setup();
        let err = ledger_err(bank.withdraw(key(1), 10, "").await);
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: 10,
                available: 0
            }
        );

        bank.deposit(key(1), 40, "").await.unwrap();
        let err = ledger_err(bank.set_balance(key(1), -5, "").await);
        assert_eq!(err, LedgerError::NegativeBalance { requested: -5 });
        assert_eq!(bank.balance(key(1)).await.unwrap(), 40);

        let err = ledger_err(bank.deposit(key(1), -1, "").await);
        assert_eq!(err, LedgerError::InvalidAmount(-1));
    }

    #[tokio::test]
    async fn ceiling_must_be_positive_and_defaults_apply() {
        let (bank, _) = setup();
        assert_eq!(bank.max_balance().await.unwrap(), BalanceCeiling::DEFAULT);
        assert_eq!(
            ledger_err(bank.set_max_balance(0).await),
            LedgerError::InvalidCeiling(0)
        );

        let bank = bank.with_default_ceiling(BalanceCeiling::new(50).unwrap());
        assert_eq!(bank.max_balance().await.unwrap().get(), 50);
        assert_eq!(
            ledger_err(bank.deposit(key(3), 51, "").await),
            LedgerError::BalanceCeilingExceeded { ceiling: 50 }
        );
    }

    #[tokio::test]
    async fn yesterdays_log_is_replaced_by_todays_first_operation() {
        let (bank, clock) = setup();
        bank.deposit(key(1), 20, "old").await.unwrap();

        clock.advance(Duration::days(1));
        assert!(bank.operations_today(key(1)).await.unwrap().is_empty());
        assert_eq!(bank.daily_delta(key(1)).await.unwrap(), 0);

        bank.deposit(key(1), 5, "test").await.unwrap();
        let ops = bank.operations_today(key(1)).await.unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].reason, "test");
        assert_eq!(bank.account(key(1)).await.unwrap().operations().len(), 1);
    }

    #[tokio::test]
    async fn explicit_rotation_persists() {
        let (bank, clock) = setup();
        bank.deposit(key(1), 20, "old").await.unwrap();
        assert!(!bank.rotate_operations(key(1)).await.unwrap());

        clock.advance(Duration::days(2));
        assert!(bank.rotate_operations(key(1)).await.unwrap());
        assert!(bank.account(key(1)).await.unwrap().operations().is_empty());
        assert_eq!(bank.balance(key(1)).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn removing_operations_by_timestamp() {
        let (bank, clock) = setup();
        bank.deposit(key(1), 1, "a").await.unwrap();
        let first = clock.now();
        clock.advance(Duration::seconds(30));
        bank.deposit(key(1), 2, "b").await.unwrap();

        assert_eq!(
            bank.find_operation(key(1), first).await.unwrap().map(|op| op.delta),
            Some(1)
        );
        let remaining = bank.remove_operation(key(1), first).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            ledger_err(bank.remove_operation(key(1), first).await),
            LedgerError::OperationNotFound(first)
        );

        bank.wipe_operations(key(1)).await.unwrap();
        assert!(bank.operations_today(key(1)).await.unwrap().is_empty());
        assert_eq!(bank.balance(key(1)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn leaderboard_and_totals() {
        let (bank, _) = setup();
        bank.deposit(key(3), 50, "").await.unwrap();
        bank.deposit(key(1), 70, "").await.unwrap();
        bank.deposit(key(2), 50, "").await.unwrap();
        bank.deposit(AccountKey::new(GuildId::new(1), MemberId::new(1)), 999, "")
            .await
            .unwrap();

        let top = bank.leaderboard(GUILD, Some(2)).await.unwrap();
        let ids: Vec<u64> = top.iter().map(|s| s.member_id.get()).collect();
        assert_eq!(ids, vec![1, 2]);

        assert_eq!(bank.leaderboard_position(key(3)).await.unwrap(), 3);
        assert_eq!(bank.leaderboard_position(key(42)).await.unwrap(), 3);
        assert_eq!(bank.guild_total_credits(GUILD).await.unwrap(), 170);
    }

    #[tokio::test]
    async fn wipes_remove_records() {
        let (bank, _) = setup();
        let elsewhere = AccountKey::new(GuildId::new(7), MemberId::new(1));
        bank.deposit(key(1), 10, "").await.unwrap();
        bank.deposit(key(2), 10, "").await.unwrap();
        bank.deposit(elsewhere, 10, "").await.unwrap();

        assert_eq!(bank.forget_member(MemberId::new(1)).await.unwrap(), 2);
        assert_eq!(bank.balance(elsewhere).await.unwrap(), 0);
        assert!(bank.wipe_account(key(2)).await.unwrap());
        assert!(!bank.wipe_account(key(2)).await.unwrap());

        bank.deposit(key(5), 10, "").await.unwrap();
        assert_eq!(bank.wipe_guild(GUILD).await.unwrap(), 1);
        assert!(bank.leaderboard(GUILD, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn guild_settings_round_trip() {
        let (bank, _) = setup();
        assert_eq!(bank.currency(GUILD).await.unwrap(), Currency::default());

        let coins = Currency::symbol("¤").unwrap();
        assert_eq!(bank.set_currency(GUILD, coins.clone()).await.unwrap(), coins);
        assert_eq!(bank.currency(GUILD).await.unwrap(), coins);

        assert!(matches!(
            ledger_err(bank.set_daily_bonus(GUILD, -10).await),
            LedgerError::InvalidSetting(_)
        ));
        let settings = bank.set_booster_bonus(GUILD, -3).await.unwrap();
        assert_eq!(settings.booster_bonus, 0);
        assert_eq!(settings.currency, coins);
    }

    #[tokio::test]
    async fn daily_bonus_once_per_day_with_reset() {
        let (bank, clock) = setup();
        bank.set_booster_bonus(GUILD, 25).await.unwrap();

        let claim = bank.claim_daily_bonus(key(1), true).await.unwrap();
        assert_eq!(claim.total(), 125);

        assert_eq!(
            ledger_err(bank.claim_daily_bonus(key(1), true).await),
            LedgerError::BonusAlreadyClaimed(clock.today())
        );
        assert_eq!(bank.balance(key(1)).await.unwrap(), 125);

        bank.reset_bonus_cache(key(1)).await.unwrap();
        assert_eq!(bank.claim_daily_bonus(key(1), false).await.unwrap().new_balance, 225);

        clock.advance(Duration::days(1));
        bank.set_daily_bonus(GUILD, 0).await.unwrap();
        assert_eq!(
            ledger_err(bank.claim_daily_bonus(key(1), false).await),
            LedgerError::BonusDisabled
        );
    }

    #[tokio::test]
    async fn top_role_follows_the_leader() {
        let (bank, _) = setup();
        assert_eq!(bank.top_role_plan(GUILD, &[]).await.unwrap(), None);

        let role = RoleId::new(31);
        bank.set_top_account_role(GUILD, Some(role)).await.unwrap();
        bank.deposit(key(1), 10, "").await.unwrap();
        bank.deposit(key(2), 20, "").await.unwrap();

        let (planned_role, changes) = bank
            .top_role_plan(GUILD, &[MemberId::new(1)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(planned_role, role);
        assert_eq!(changes.revoke, vec![MemberId::new(1)]);
        assert_eq!(changes.grant, Some(MemberId::new(2)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deposits_are_not_lost() {
        let bank = Arc::new(Bank::new(InMemoryBankStore::new()));
        let target = key(1);

        let mut tasks = Vec::new();
        for _ in 0..64 {
            let bank = bank.clone();
            tasks.push(tokio::spawn(async move {
                bank.deposit(target, 3, "tick").await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(bank.balance(target).await.unwrap(), 192);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn crossing_transfers_conserve_the_total() {
        let bank = Arc::new(Bank::new(InMemoryBankStore::new()));
        bank.deposit(key(1), 1_000, "").await.unwrap();
        bank.deposit(key(2), 1_000, "").await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..40 {
            let bank = bank.clone();
            let (from, to) = if i % 2 == 0 { (key(1), key(2)) } else { (key(2), key(1)) };
            tasks.push(tokio::spawn(async move {
                bank.transfer(from, to, 7, "swap").await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let total = bank.balance(key(1)).await.unwrap() + bank.balance(key(2)).await.unwrap();
        assert_eq!(total, 2_000);
        assert_eq!(bank.guild_total_credits(GUILD).await.unwrap(), 2_000);
    }

    #[tokio::test]
    async fn guild_wipe_waits_for_an_in_flight_deposit() {
        let bank = yielding_bank();
        bank.set_balance(key(1), 500, "seed").await.unwrap();

        let deposit = {
            let bank = bank.clone();
            tokio::spawn(async move { bank.deposit(key(1), 1, "late").await })
        };
        tokio::task::yield_now().await;

        assert_eq!(bank.wipe_guild(GUILD).await.unwrap(), 1);
        assert_eq!(deposit.await.unwrap().unwrap(), 501);
        assert_eq!(bank.balance(key(1)).await.unwrap(), 0);
        assert!(bank.store().load_account(key(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn forgetting_a_member_waits_for_an_in_flight_transfer() {
        let bank = yielding_bank();
        bank.set_balance(key(1), 300, "seed").await.unwrap();

        let gift = {
            let bank = bank.clone();
            tokio::spawn(async move { bank.transfer(key(1), key(2), 100, "gift").await })
        };
        tokio::task::yield_now().await;

        assert_eq!(bank.forget_member(MemberId::new(2)).await.unwrap(), 1);
        gift.await.unwrap().unwrap();
        assert_eq!(bank.balance(key(1)).await.unwrap(), 200);
        assert!(bank.store().load_account(key(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn housekeeping_does_not_create_accounts() {
        let (bank, _) = setup();
        bank.deposit(key(1), 10, "").await.unwrap();

        assert!(!bank.wipe_operations(key(2)).await.unwrap());
        assert!(!bank.reset_bonus_cache(key(3)).await.unwrap());
        assert!(bank.store().load_account(key(2)).await.unwrap().is_none());
        assert!(bank.store().load_account(key(3)).await.unwrap().is_none());
        assert_eq!(bank.leaderboard(GUILD, None).await.unwrap().len(), 1);
        assert_eq!(bank.leaderboard_position(key(2)).await.unwrap(), 1);

        assert!(bank.wipe_operations(key(1)).await.unwrap());
        assert!(bank.reset_bonus_cache(key(1)).await.unwrap());
        assert_eq!(bank.balance(key(1)).await.unwrap(), 10);
    }
}
