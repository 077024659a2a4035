//! Daily bonus claims.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::ceiling::BalanceCeiling;
use crate::error::{LedgerError, LedgerResult};
use crate::settings::GuildSettings;

pub const DAILY_BONUS_REASON: &str = "Daily bonus";
pub const BOOSTED_BONUS_REASON: &str = "Daily bonus + boost";

/// Per-member cache of bonus claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusCache {
    pub last_daily_bonus: Option<NaiveDate>,
}

/// Outcome of a successful claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusClaim {
    pub base: i64,
    pub booster: i64,
    pub new_balance: i64,
}

impl BonusClaim {
    pub fn total(&self) -> i64 {
        self.base + self.booster
    }
}

impl Account {
    /// Credit the guild's daily bonus, once per calendar day.
    ///
    /// Boosters also receive the booster bonus when the guild grants one. The
    /// claim date is only recorded when the deposit succeeds.
    pub fn claim_daily_bonus(
        &mut self,
        settings: &GuildSettings,
        is_booster: bool,
        ceiling: BalanceCeiling,
        now: DateTime<Utc>,
    ) -> LedgerResult<BonusClaim> {
        if !settings.daily_bonus_enabled() {
            return Err(LedgerError::BonusDisabled);
        }
        let today = now.date_naive();
        if self.bonus().last_daily_bonus == Some(today) {
            return Err(LedgerError::BonusAlreadyClaimed(today));
        }

        let booster = if is_booster { settings.booster_bonus } else { 0 };
        let (amount, reason) = if booster > 0 {
            let total = settings
                .daily_bonus
                .checked_add(booster)
                .ok_or(LedgerError::BalanceCeilingExceeded {
                    ceiling: ceiling.get(),
                })?;
            (total, BOOSTED_BONUS_REASON)
        } else {
            (settings.daily_bonus, DAILY_BONUS_REASON)
        };

        let new_balance = self.deposit(amount, reason, ceiling, now)?;
        self.bonus_mut().last_daily_bonus = Some(today);

        Ok(BonusClaim {
            base: settings.daily_bonus,
            booster,
            new_balance,
        })
    }
}
