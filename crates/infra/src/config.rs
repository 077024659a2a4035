//! Configuration loading.

use anyhow::Context;

use guildbank_finance::BalanceCeiling;
use guildbank_observability::{LogConfig, LogFormat};

pub const MAX_BALANCE_VAR: &str = "GUILDBANK_MAX_BALANCE";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const LOG_FORMAT_VAR: &str = "GUILDBANK_LOG_FORMAT";

/// Process configuration for the bank.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BankConfig {
    /// Ceiling used until one is stored with `Bank::set_max_balance`.
    pub max_balance: BalanceCeiling,
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub log: LogConfig,
}

impl BankConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps variable names to values.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let max_balance = match read(MAX_BALANCE_VAR) {
            Some(raw) => {
                let value: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{MAX_BALANCE_VAR} must be an integer, got {raw:?}"))?;
                BalanceCeiling::new(value).with_context(|| format!("invalid {MAX_BALANCE_VAR}"))?
            }
            None => BalanceCeiling::DEFAULT,
        };

        let format = match read(LOG_FORMAT_VAR) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            max_balance,
            database_url: read(DATABASE_URL_VAR),
            log: LogConfig {
                format,
                ..LogConfig::default()
            },
        })
    }
}
