//! Wiring a ready-to-use bank from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::bank::Bank;
use crate::config::BankConfig;
use crate::store::{BankStore, InMemoryBankStore, PostgresBankStore};

/// Bank over whichever store the configuration selected.
pub type DynBank = Bank<Arc<dyn BankStore>>;

/// Initialize tracing, open the configured store and build the bank.
///
/// With a `database_url` the Postgres store is used and its tables are
/// created if needed; otherwise balances live in memory.
pub async fn connect(config: &BankConfig) -> anyhow::Result<DynBank> {
    guildbank_observability::init(&config.log);

    let store: Arc<dyn BankStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresBankStore::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to create bank tables")?;
            info!("using Postgres bank store");
            Arc::new(store)
        }
        None => {
            warn!("no {} configured, balances are kept in memory", crate::config::DATABASE_URL_VAR);
            Arc::new(InMemoryBankStore::new())
        }
    };

    Ok(Bank::new(store).with_default_ceiling(config.max_balance))
}
