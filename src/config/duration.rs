//! Duration parsing for command-line flags.

use anyhow::{bail, Context};
use std::time::Duration;

/// Parse `"90"`, `"90s"`, `"30m"`, `"2h"` or `"1d"` into a [`Duration`].
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Empty duration string");
    }

    let (digits, unit_secs) = match s.char_indices().last() {
        Some((idx, 'd')) => (&s[..idx], 86_400),
        Some((idx, 'h')) => (&s[..idx], 3_600),
        Some((idx, 'm')) => (&s[..idx], 60),
        Some((idx, 's')) => (&s[..idx], 1),
        _ => (s, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration value: {s}"))?;
    let secs = value
        .checked_mul(unit_secs)
        .with_context(|| format!("Duration out of range: {s}"))?;
    Ok(Duration::from_secs(secs))
}
