//! Lockout duration calculation.

use chrono::Duration;

use crate::config::LockoutConfig;

/// Lockout duration for a cumulative failed attempt count.
///
/// Exponential backoff anchored at the attempt that reaches the threshold
/// (which produces the base duration) and clamped at `max_lockout`. Total and
/// pure; saturates to the ceiling on arithmetic overflow.
pub fn lockout_duration(config: &LockoutConfig, total_attempts: u64) -> Duration {
    let exponent = total_attempts.saturating_sub(u64::from(config.max_attempts));
    let base = config.base_lockout.num_seconds().max(0) as u64;
    let ceiling = config.max_lockout.num_seconds().max(0) as u64;

    let seconds = u32::try_from(exponent)
        .ok()
        .and_then(|exp| u64::from(config.lockout_multiplier).checked_pow(exp))
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(ceiling)
        .min(ceiling);

    Duration::seconds(seconds as i64)
}
