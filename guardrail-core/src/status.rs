//! Status types reported by the protection service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blocking state for one `(identifier, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutStatus {
    pub is_blocked: bool,
    /// Attempts left before the next failure triggers a lockout.
    /// `None` while a lockout is active.
    pub remaining_attempts: Option<u32>,
    /// When the active lockout ends. `None` when not blocked.
    pub blocked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    pub(crate) fn open(remaining_attempts: u32) -> Self {
        Self {
            is_blocked: false,
            remaining_attempts: Some(remaining_attempts),
            blocked_until: None,
        }
    }

    pub(crate) fn blocked(until: DateTime<Utc>) -> Self {
        Self {
            is_blocked: true,
            remaining_attempts: None,
            blocked_until: Some(until),
        }
    }

    /// Seconds until the lockout expires, rounded up. `None` when not
    /// blocked; never negative.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.blocked_until.map(|until| {
            let millis = (until - Utc::now()).num_milliseconds();
            if millis <= 0 { 0 } else { (millis + 999) / 1000 }
        })
    }
}

/// Diagnostic view of one key: the blocking state plus the raw counter and
/// window marker values. Read-only; gathering it mutates nothing.
#[derive(Debug, Clone)]
pub struct DetailedStatus {
    pub status: LockoutStatus,
    /// Failed attempts accumulated so far, lockouts included.
    pub current_attempts: u64,
    /// When the current counting window began, if a window is open.
    pub window_started_at: Option<DateTime<Utc>>,
}

/// Value stored under the lockout key while a lockout is active.
///
/// The store evicts it at `until`; a reader that still sees an expired record
/// treats it as inactive and removes it opportunistically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutRecord {
    pub until: DateTime<Utc>,
    /// Cumulative failed attempts at the moment the lockout fired.
    pub attempts: u64,
    pub duration_seconds: u64,
}
