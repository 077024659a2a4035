//! Guild and process-wide economy settings.

use serde::{Deserialize, Serialize};

use guildbank_core::RoleId;

use crate::ceiling::BalanceCeiling;
use crate::currency::Currency;
use crate::error::{LedgerError, LedgerResult};

/// Per-guild configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    pub currency: Currency,
    /// Credits granted by the daily bonus. 0 disables it.
    pub daily_bonus: i64,
    /// Extra credits for server boosters on top of the daily bonus. 0 disables it.
    pub booster_bonus: i64,
    /// Role handed to the richest member, if any.
    pub top_account_role: Option<RoleId>,
}

impl GuildSettings {
    pub const DEFAULT_DAILY_BONUS: i64 = 100;
    pub const DEFAULT_BOOSTER_BONUS: i64 = 100;

    pub fn set_daily_bonus(&mut self, amount: i64) -> LedgerResult<()> {
        if amount < 0 {
            return Err(LedgerError::invalid_setting(format!(
                "daily bonus must be positive, or 0 to disable it (got {amount})"
            )));
        }
        self.daily_bonus = amount;
        Ok(())
    }

    /// Non-positive amounts disable the booster bonus.
    pub fn set_booster_bonus(&mut self, amount: i64) {
        self.booster_bonus = amount.max(0);
    }

    pub fn daily_bonus_enabled(&self) -> bool {
        self.daily_bonus > 0
    }
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            daily_bonus: Self::DEFAULT_DAILY_BONUS,
            booster_bonus: Self::DEFAULT_BOOSTER_BONUS,
            top_account_role: None,
        }
    }
}

/// Process-wide record shared by every guild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub max_balance: BalanceCeiling,
}
