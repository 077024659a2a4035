//! Parsing of short duration strings such as `"1d 2h 30m"`.

use chrono::Duration;

use crate::error::{LedgerError, LedgerResult};

/// Parse `<n>d <n>h <n>m <n>s`.
///
/// Every component is optional but they must appear in that order, each at
/// most once. `j` is accepted as an alias for days. Whitespace between
/// components is optional.
pub fn parse_duration(input: &str) -> LedgerResult<Duration> {
    let invalid = || LedgerError::InvalidDuration(input.to_string());

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut next_slot = 0usize;
    let mut total = Duration::zero();

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(invalid());
        }
        let value: i64 = rest[..digits_end].parse().map_err(|_| invalid())?;

        let mut tail = rest[digits_end..].chars();
        let slot = match tail.next() {
            Some('d' | 'j') => 0,
            Some('h') => 1,
            Some('m') => 2,
            Some('s') => 3,
            _ => return Err(invalid()),
        };
        if slot < next_slot {
            return Err(invalid());
        }
        next_slot = slot + 1;

        let part = match slot {
            0 => Duration::try_days(value),
            1 => Duration::try_hours(value),
            2 => Duration::try_minutes(value),
            _ => Duration::try_seconds(value),
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;

        rest = tail.as_str().trim_start();
    }

    Ok(total)
}
