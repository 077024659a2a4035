//! Guild rankings, derived at read time.

use guildbank_core::MemberId;

use crate::account::Account;

/// One row of a guild leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// 1-based.
    pub rank: usize,
    pub member_id: MemberId,
    pub account: Account,
}

impl Standing {
    pub fn balance(&self) -> i64 {
        self.account.balance()
    }
}

/// Rank accounts by balance, richest first.
///
/// Equal balances are ordered by member id ascending. `limit` of `None` or
/// `Some(0)` keeps every account.
pub fn leaderboard<I>(accounts: I, limit: Option<usize>) -> Vec<Standing>
where
    I: IntoIterator<Item = (MemberId, Account)>,
{
    let mut rows: Vec<(MemberId, Account)> = accounts.into_iter().collect();
    rows.sort_by(|(a_id, a), (b_id, b)| {
        b.balance()
            .cmp(&a.balance())
            .then_with(|| a_id.cmp(b_id))
    });

    if let Some(limit) = limit.filter(|l| *l > 0) {
        rows.truncate(limit);
    }

    rows.into_iter()
        .enumerate()
        .map(|(idx, (member_id, account))| Standing {
            rank: idx + 1,
            member_id,
            account,
        })
        .collect()
}

/// 1-based position of `member` in `ranking`.
///
/// A member absent from the ranking is placed last (`ranking.len()`).
pub fn leaderboard_position(ranking: &[Standing], member: MemberId) -> usize {
    ranking
        .iter()
        .find(|s| s.member_id == member)
        .map(|s| s.rank)
        .unwrap_or(ranking.len())
}

/// Credits in circulation.
pub fn total_credits<'a, I>(accounts: I) -> i64
where
    I: IntoIterator<Item = &'a Account>,
{
    accounts
        .into_iter()
        .fold(0i64, |acc, account| acc.saturating_add(account.balance()))
}
