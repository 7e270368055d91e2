//! Lockout behavior configuration.
//!
//! Plain data with named presets; no runtime merging of partial overrides.
//! Construct one explicitly, or start from a preset and adjust fields.

use chrono::Duration;

/// Configuration for attempt counting and escalating lockouts.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failed attempts tolerated per window before a lockout fires.
    pub max_attempts: u32,
    /// Duration of the first lockout.
    pub base_lockout: Duration,
    /// Growth factor applied to each consecutive lockout.
    pub lockout_multiplier: u32,
    /// Ceiling on any single lockout, bounding worst-case denial of service
    /// against legitimate users sharing an identifier.
    pub max_lockout: Duration,
    /// Sliding window during which failed attempts accumulate.
    pub attempt_window: Duration,
}

impl Default for LockoutConfig {
    /// Lenient preset: 5 attempts, lockouts from 5 seconds doubling up to
    /// 5 minutes, 15 minute window.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_lockout: Duration::seconds(5),
            lockout_multiplier: 2,
            max_lockout: Duration::seconds(300),
            attempt_window: Duration::seconds(900),
        }
    }
}

impl LockoutConfig {
    /// Strict preset for high-value operations such as security code
    /// validation: 3 attempts, lockouts from 10 seconds tripling up to
    /// 30 minutes, 30 minute window.
    pub fn strict() -> Self {
        Self {
            max_attempts: 3,
            base_lockout: Duration::seconds(10),
            lockout_multiplier: 3,
            max_lockout: Duration::seconds(1800),
            attempt_window: Duration::seconds(1800),
        }
    }
}
