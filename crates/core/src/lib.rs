//! `guildbank-core`: shared building blocks.
//!
//! Identifiers, the injectable clock and the primitive error type. No IO.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DomainError;
pub use id::{AccountKey, EmojiId, GuildId, MemberId, RoleId};
