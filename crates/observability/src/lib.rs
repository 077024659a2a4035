//! Tracing and logging setup shared by every process embedding the bank.

pub mod subscriber;

pub use subscriber::{LogConfig, LogFormat, ParseLogFormatError};

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(config: &LogConfig) {
    subscriber::init(config);
}
