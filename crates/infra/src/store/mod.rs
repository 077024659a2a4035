//! Backing key-value store for accounts and settings.
//!
//! Accounts are addressed by `(guild, member)`, guild settings by guild, and
//! the process-wide settings by a single record.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use guildbank_core::{AccountKey, GuildId, MemberId};
use guildbank_finance::{Account, GlobalSettings, GuildSettings};

pub use in_memory::InMemoryBankStore;
pub use postgres::PostgresBankStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error during {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("corrupt record {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Persistence port used by the bank.
///
/// Implementations do no validation of their own; the ledger rules are
/// enforced before anything reaches the store.
#[async_trait]
pub trait BankStore: Send + Sync {
    /// `None` when the member never had an account in this guild.
    async fn load_account(&self, key: AccountKey) -> Result<Option<Account>, StoreError>;

    async fn save_account(&self, key: AccountKey, account: &Account) -> Result<(), StoreError>;

    /// Persist several accounts atomically: either all records are written or none.
    async fn save_accounts(&self, accounts: &[(AccountKey, Account)]) -> Result<(), StoreError>;

    /// Returns whether a record existed.
    async fn delete_account(&self, key: AccountKey) -> Result<bool, StoreError>;

    /// Every stored account of the guild, ordered by member id.
    async fn list_accounts(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<(MemberId, Account)>, StoreError>;

    /// Returns the number of deleted accounts.
    async fn delete_guild(&self, guild_id: GuildId) -> Result<usize, StoreError>;

    /// Delete the member's accounts in every guild. Returns the number deleted.
    async fn delete_member(&self, member_id: MemberId) -> Result<usize, StoreError>;

    async fn load_guild_settings(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<GuildSettings>, StoreError>;

    async fn save_guild_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError>;

    async fn load_global_settings(&self) -> Result<Option<GlobalSettings>, StoreError>;

    async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> BankStore for Arc<S>
where
    S: BankStore + ?Sized,
{
    async fn load_account(&self, key: AccountKey) -> Result<Option<Account>, StoreError> {
        (**self).load_account(key).await
    }

    async fn save_account(&self, key: AccountKey, account: &Account) -> Result<(), StoreError> {
        (**self).save_account(key, account).await
    }

    async fn save_accounts(&self, accounts: &[(AccountKey, Account)]) -> Result<(), StoreError> {
        (**self).save_accounts(accounts).await
    }

    async fn delete_account(&self, key: AccountKey) -> Result<bool, StoreError> {
        (**self).delete_account(key).await
    }

    async fn list_accounts(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<(MemberId, Account)>, StoreError> {
        (**self).list_accounts(guild_id).await
    }

    async fn delete_guild(&self, guild_id: GuildId) -> Result<usize, StoreError> {
        (**self).delete_guild(guild_id).await
    }

    async fn delete_member(&self, member_id: MemberId) -> Result<usize, StoreError> {
        (**self).delete_member(member_id).await
    }

    async fn load_guild_settings(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<GuildSettings>, StoreError> {
        (**self).load_guild_settings(guild_id).await
    }

    async fn save_guild_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError> {
        (**self).save_guild_settings(guild_id, settings).await
    }

    async fn load_global_settings(&self) -> Result<Option<GlobalSettings>, StoreError> {
        (**self).load_global_settings().await
    }

    async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), StoreError> {
        (**self).save_global_settings(settings).await
    }
}
