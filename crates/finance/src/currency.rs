//! Per-guild currency symbol.

use serde::{Deserialize, Serialize};

use guildbank_core::EmojiId;

use crate::error::{LedgerError, LedgerResult};

/// How a guild's credits are displayed: a short text symbol or a custom emoji.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Currency {
    Symbol(String),
    Emoji(EmojiId),
}

impl Currency {
    pub const MAX_SYMBOL_CHARS: usize = 5;
    pub const DEFAULT_SYMBOL: &'static str = "Ꞥ";

    /// Text symbol of 1 to 5 characters.
    pub fn symbol(symbol: impl Into<String>) -> LedgerResult<Self> {
        let symbol = symbol.into();
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::invalid_currency("symbol cannot be empty"));
        }
        let chars = trimmed.chars().count();
        if chars > Self::MAX_SYMBOL_CHARS {
            return Err(LedgerError::invalid_currency(format!(
                "symbol is {chars} characters long (max {})",
                Self::MAX_SYMBOL_CHARS
            )));
        }
        Ok(Self::Symbol(trimmed.to_string()))
    }

    pub fn emoji(id: EmojiId) -> Self {
        Self::Emoji(id)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Symbol(Self::DEFAULT_SYMBOL.to_string())
    }
}
