use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use guildbank_core::{AccountKey, GuildId, MemberId};
use guildbank_finance::{Account, GlobalSettings, GuildSettings};

use super::{BankStore, StoreError};

/// In-memory store for tests/dev.
///
/// Accounts live in one ordered map so a guild's accounts come out sorted by
/// member id and multi-account writes happen under a single write lock.
#[derive(Debug, Default)]
pub struct InMemoryBankStore {
    accounts: RwLock<BTreeMap<AccountKey, Account>>,
    guilds: RwLock<HashMap<GuildId, GuildSettings>>,
    global: RwLock<Option<GlobalSettings>>,
}

impl InMemoryBankStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn guild_range(guild_id: GuildId) -> std::ops::RangeInclusive<AccountKey> {
    let first = AccountKey::new(guild_id, MemberId::new(u64::MIN));
    let last = AccountKey::new(guild_id, MemberId::new(u64::MAX));
    first..=last
}

#[async_trait]
impl BankStore for InMemoryBankStore {
    async fn load_account(&self, key: AccountKey) -> Result<Option<Account>, StoreError> {
        let map = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&key).cloned())
    }

    async fn save_account(&self, key: AccountKey, account: &Account) -> Result<(), StoreError> {
        let mut map = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key, account.clone());
        Ok(())
    }

    async fn save_accounts(&self, accounts: &[(AccountKey, Account)]) -> Result<(), StoreError> {
        let mut map = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        for (key, account) in accounts {
            map.insert(*key, account.clone());
        }
        Ok(())
    }

    async fn delete_account(&self, key: AccountKey) -> Result<bool, StoreError> {
        let mut map = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(&key).is_some())
    }

    async fn list_accounts(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<(MemberId, Account)>, StoreError> {
        let map = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .range(guild_range(guild_id))
            .map(|(k, v)| (k.member_id, v.clone()))
            .collect())
    }

    async fn delete_guild(&self, guild_id: GuildId) -> Result<usize, StoreError> {
        let mut map = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|k, _| k.guild_id != guild_id);
        Ok(before - map.len())
    }

    async fn delete_member(&self, member_id: MemberId) -> Result<usize, StoreError> {
        let mut map = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|k, _| k.member_id != member_id);
        Ok(before - map.len())
    }

    async fn load_guild_settings(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<GuildSettings>, StoreError> {
        let map = self.guilds.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&guild_id).cloned())
    }

    async fn save_guild_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError> {
        let mut map = self.guilds.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(guild_id, settings.clone());
        Ok(())
    }

    async fn load_global_settings(&self) -> Result<Option<GlobalSettings>, StoreError> {
        let global = self.global.read().map_err(|_| StoreError::Poisoned)?;
        Ok(*global)
    }

    async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), StoreError> {
        let mut global = self.global.write().map_err(|_| StoreError::Poisoned)?;
        *global = Some(*settings);
        Ok(())
    }
}
