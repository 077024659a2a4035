//! Postgres-backed bank store.
//!
//! Each account is one row keyed by `(guild_id, member_id)`. The balance is
//! kept in its own column for ranking and totals; the full record (balance,
//! daily log, bonus cache) is stored as JSONB.
//!
//! ## Error Mapping
//!
//! | Source | StoreError |
//! |--------|------------|
//! | any `sqlx::Error` | `Database { operation, message }` |
//! | JSONB payload that does not deserialize | `Corrupt { key, message }` |
//!
//! Snowflake ids are stored in `BIGINT` columns by reinterpreting the `u64`
//! bits, which round-trips every value.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::instrument;

use guildbank_core::{AccountKey, GuildId, MemberId};
use guildbank_finance::{Account, GlobalSettings, GuildSettings};

use super::{BankStore, StoreError};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS finance_accounts (
        guild_id   BIGINT      NOT NULL,
        member_id  BIGINT      NOT NULL,
        balance    BIGINT      NOT NULL CHECK (balance >= 0),
        record     JSONB       NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (guild_id, member_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS finance_accounts_member_idx
        ON finance_accounts (member_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS finance_guild_settings (
        guild_id BIGINT PRIMARY KEY,
        settings JSONB  NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS finance_global_settings (
        id       SMALLINT PRIMARY KEY CHECK (id = 1),
        settings JSONB    NOT NULL
    )
    "#,
];

const UPSERT_ACCOUNT: &str = r#"
    INSERT INTO finance_accounts (guild_id, member_id, balance, record)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (guild_id, member_id)
    DO UPDATE SET
        balance = EXCLUDED.balance,
        record = EXCLUDED.record,
        updated_at = NOW()
"#;

fn to_db(raw: u64) -> i64 {
    raw as i64
}

fn from_db(raw: i64) -> u64 {
    raw as u64
}

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Database {
        operation,
        message: e.to_string(),
    }
}

fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, value: JsonValue) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Postgres-backed store.
///
/// `PostgresBankStore` is `Send + Sync`; all access goes through the SQLx pool.
/// Multi-account writes run in one transaction.
#[derive(Debug, Clone)]
pub struct PostgresBankStore {
    pool: Arc<PgPool>,
}

impl PostgresBankStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(db_error("connect"))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(db_error("migrate"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl BankStore for PostgresBankStore {
    #[instrument(skip(self), fields(account = %key))]
    async fn load_account(&self, key: AccountKey) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT record FROM finance_accounts WHERE guild_id = $1 AND member_id = $2",
        )
        .bind(to_db(key.guild_id.get()))
        .bind(to_db(key.member_id.get()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_error("load_account"))?;

        match row {
            Some(row) => {
                let record: JsonValue = row.try_get("record").map_err(db_error("load_account"))?;
                Ok(Some(decode(&key.to_string(), record)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, account), fields(account = %key))]
    async fn save_account(&self, key: AccountKey, account: &Account) -> Result<(), StoreError> {
        let record = encode(&key.to_string(), account)?;
        sqlx::query(UPSERT_ACCOUNT)
            .bind(to_db(key.guild_id.get()))
            .bind(to_db(key.member_id.get()))
            .bind(account.balance())
            .bind(record)
            .execute(&*self.pool)
            .await
            .map_err(db_error("save_account"))?;
        Ok(())
    }

    #[instrument(skip(self, accounts), fields(count = accounts.len()))]
    async fn save_accounts(&self, accounts: &[(AccountKey, Account)]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error("save_accounts"))?;
        for (key, account) in accounts {
            let record = encode(&key.to_string(), account)?;
            sqlx::query(UPSERT_ACCOUNT)
                .bind(to_db(key.guild_id.get()))
                .bind(to_db(key.member_id.get()))
                .bind(account.balance())
                .bind(record)
                .execute(&mut *tx)
                .await
                .map_err(db_error("save_accounts"))?;
        }
        tx.commit().await.map_err(db_error("save_accounts"))?;
        Ok(())
    }

    #[instrument(skip(self), fields(account = %key))]
    async fn delete_account(&self, key: AccountKey) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM finance_accounts WHERE guild_id = $1 AND member_id = $2")
                .bind(to_db(key.guild_id.get()))
                .bind(to_db(key.member_id.get()))
                .execute(&*self.pool)
                .await
                .map_err(db_error("delete_account"))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn list_accounts(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<(MemberId, Account)>, StoreError> {
        let rows = sqlx::query(
            "SELECT member_id, record FROM finance_accounts \
             WHERE guild_id = $1 ORDER BY member_id ASC",
        )
        .bind(to_db(guild_id.get()))
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error("list_accounts"))?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            let member_id: i64 = row.try_get("member_id").map_err(db_error("list_accounts"))?;
            let record: JsonValue = row.try_get("record").map_err(db_error("list_accounts"))?;
            let member_id = MemberId::new(from_db(member_id));
            let key = AccountKey::new(guild_id, member_id);
            accounts.push((member_id, decode(&key.to_string(), record)?));
        }
        // `ORDER BY` sorts the signed column; restore unsigned member order.
        accounts.sort_by_key(|(member_id, _)| *member_id);
        Ok(accounts)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn delete_guild(&self, guild_id: GuildId) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM finance_accounts WHERE guild_id = $1")
            .bind(to_db(guild_id.get()))
            .execute(&*self.pool)
            .await
            .map_err(db_error("delete_guild"))?;
        Ok(result.rows_affected() as usize)
    }

    #[instrument(skip(self), fields(member_id = %member_id))]
    async fn delete_member(&self, member_id: MemberId) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM finance_accounts WHERE member_id = $1")
            .bind(to_db(member_id.get()))
            .execute(&*self.pool)
            .await
            .map_err(db_error("delete_member"))?;
        Ok(result.rows_affected() as usize)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn load_guild_settings(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<GuildSettings>, StoreError> {
        let row = sqlx::query("SELECT settings FROM finance_guild_settings WHERE guild_id = $1")
            .bind(to_db(guild_id.get()))
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("load_guild_settings"))?;

        match row {
            Some(row) => {
                let settings: JsonValue =
                    row.try_get("settings").map_err(db_error("load_guild_settings"))?;
                Ok(Some(decode(&format!("guild/{guild_id}"), settings)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, settings), fields(guild_id = %guild_id))]
    async fn save_guild_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError> {
        let payload = encode(&format!("guild/{guild_id}"), settings)?;
        sqlx::query(
            r#"
            INSERT INTO finance_guild_settings (guild_id, settings)
            VALUES ($1, $2)
            ON CONFLICT (guild_id) DO UPDATE SET settings = EXCLUDED.settings
            "#,
        )
        .bind(to_db(guild_id.get()))
        .bind(payload)
        .execute(&*self.pool)
        .await
        .map_err(db_error("save_guild_settings"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_global_settings(&self) -> Result<Option<GlobalSettings>, StoreError> {
        let row = sqlx::query("SELECT settings FROM finance_global_settings WHERE id = 1")
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("load_global_settings"))?;

        match row {
            Some(row) => {
                let settings: JsonValue =
                    row.try_get("settings").map_err(db_error("load_global_settings"))?;
                Ok(Some(decode("global", settings)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, settings))]
    async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), StoreError> {
        let payload = encode("global", settings)?;
        sqlx::query(
            r#"
            INSERT INTO finance_global_settings (id, settings)
            VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET settings = EXCLUDED.settings
            "#,
        )
        .bind(payload)
        .execute(&*self.pool)
        .await
        .map_err(db_error("save_global_settings"))?;
        Ok(())
    }
}
