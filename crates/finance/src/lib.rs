//! Guild economy ledger.
//!
//! Pure domain logic only: no IO, no persistence, no chat framework. Every
//! mutating call receives the balance ceiling and the current instant.

pub mod account;
pub mod bonus;
pub mod ceiling;
pub mod currency;
pub mod duration;
pub mod error;
pub mod leaderboard;
pub mod operation;
pub mod settings;
pub mod top_role;

pub use account::{transfer, Account};
pub use bonus::{BonusCache, BonusClaim};
pub use ceiling::BalanceCeiling;
pub use currency::Currency;
pub use duration::parse_duration;
pub use error::{LedgerError, LedgerResult};
pub use leaderboard::{leaderboard, leaderboard_position, total_credits, Standing};
pub use operation::{Operation, OperationLog};
pub use settings::{GlobalSettings, GuildSettings};
pub use top_role::{plan_top_role, RoleChanges};
