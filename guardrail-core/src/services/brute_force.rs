//! Brute force protection service with escalating lockouts.
//!
//! This module throttles repeated failed attempts against a sensitive
//! operation per `(identifier, action)` pair, backed by any TTL-capable
//! key-value store.
//!
//! # Features
//!
//! - Per-identifier, per-action failed attempt tracking in a sliding window
//! - Automatic lockout once the configured attempt limit is reached
//! - Exponentially escalating lockout durations, clamped at a ceiling
//! - Guarded execution of arbitrary async operations with
//!   record-before-validate semantics
//! - Remaining-attempt hints appended to failed operation errors
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use guardrail_core::{BruteForceProtectionService, LockoutConfig, MemoryStore};
//!
//! # #[derive(Debug, thiserror::Error)]
//! # #[error("invalid security code")]
//! # struct InvalidCode;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service =
//!     BruteForceProtectionService::new(Arc::new(MemoryStore::new()), LockoutConfig::strict());
//!
//! let outcome = service
//!     .protect("company-42", "security_code_validation", || async {
//!         Err::<(), _>(InvalidCode)
//!     })
//!     .await;
//! assert!(outcome.is_err());
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The service is stateless and reentrant; it holds no in-memory copy of any
//! counter and re-reads the store for every decision. Operations on the same
//! key are not serialized here: the store's atomic increment bounds the
//! overshoot under concurrent requests, and a small overshoot before lockout
//! is an accepted trade-off over a global lock.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    backoff,
    config::LockoutConfig,
    error::{Error, ProtectError, StoreError, ValidationError},
    keys::AttemptKeys,
    status::{DetailedStatus, LockoutRecord, LockoutStatus},
    store::AttemptStore,
};

/// Key namespace used unless overridden with
/// [`with_namespace`](BruteForceProtectionService::with_namespace).
const DEFAULT_NAMESPACE: &str = "guardrail";

/// Service for throttling failed attempts against a sensitive operation.
///
/// The public entry point is [`protect`](Self::protect); the lower-level
/// operations are exposed for callers that manage the protected operation
/// themselves.
pub struct BruteForceProtectionService<S: AttemptStore> {
    store: Arc<S>,
    config: LockoutConfig,
    namespace: String,
}

impl<S: AttemptStore> BruteForceProtectionService<S> {
    /// Create a new service over the given store and configuration.
    pub fn new(store: Arc<S>, config: LockoutConfig) -> Self {
        Self {
            store,
            config,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Override the key namespace so several independently configured
    /// services can share one store without overlapping.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Current blocking state for an identifier and action.
    ///
    /// A lockout record whose expiry has passed but which the store has not
    /// evicted yet is removed here; that delete is idempotent and safe to
    /// race. No other state is mutated.
    pub async fn is_blocked(&self, identifier: &str, action: &str) -> Result<LockoutStatus, Error> {
        validate(identifier, action)?;
        let keys = self.keys(action, identifier);
        self.check_blocked(&keys).await
    }

    /// Record a failed attempt and return the resulting state.
    ///
    /// Re-derives the blocking state first: attempts are never recorded
    /// against a key that is already serving a lockout, even when the caller
    /// checked moments ago. When the incremented count reaches the limit the
    /// lockout record and the counter TTL refresh are written in one batched
    /// store round trip.
    pub async fn record_failed_attempt(
        &self,
        identifier: &str,
        action: &str,
    ) -> Result<LockoutStatus, Error> {
        validate(identifier, action)?;
        let keys = self.keys(action, identifier);

        let status = self.check_blocked(&keys).await?;
        if status.is_blocked {
            return Ok(status);
        }

        let count = self.store.incr(&keys.attempts).await?;
        let window_seconds = seconds(self.config.attempt_window);
        if count == 1 {
            // First failure of a fresh window: bound the counter's lifetime
            // and stamp the window start for reporting.
            self.store
                .set_and_expire(
                    &keys.first_attempt,
                    &Utc::now().to_rfc3339(),
                    window_seconds,
                    &keys.attempts,
                    window_seconds,
                )
                .await?;
        }

        if count >= u64::from(self.config.max_attempts) {
            return self.trigger_lockout(&keys, count, identifier, action).await;
        }

        let remaining = (u64::from(self.config.max_attempts) - count) as u32;
        tracing::debug!(
            action = action,
            attempts = count,
            remaining = remaining,
            "Recorded failed attempt"
        );
        Ok(LockoutStatus::open(remaining))
    }

    /// Forgive all recorded failures for an identifier and action.
    ///
    /// Deletes the counter, the lockout record, and the window marker
    /// unconditionally. Never fails on missing keys; the very next check
    /// reports the full attempt allowance.
    pub async fn reset_attempts(&self, identifier: &str, action: &str) -> Result<(), Error> {
        validate(identifier, action)?;
        let keys = self.keys(action, identifier);
        self.store
            .del(&[
                keys.attempts.as_str(),
                keys.lockout.as_str(),
                keys.first_attempt.as_str(),
            ])
            .await?;
        tracing::info!(action = action, "Reset failed attempt state");
        Ok(())
    }

    /// Diagnostic view of one key: blocking state plus the raw counter and
    /// window marker. Mutates nothing; an expired lockout record is reported
    /// as inactive and left for the next blocking check to remove.
    pub async fn get_detailed_status(
        &self,
        identifier: &str,
        action: &str,
    ) -> Result<DetailedStatus, Error> {
        validate(identifier, action)?;
        let keys = self.keys(action, identifier);
        let now = Utc::now();

        let current_attempts = self.current_attempts(&keys).await?;
        let status = match self.read_lockout(&keys).await? {
            Some(record) if record.until > now => LockoutStatus::blocked(record.until),
            _ => LockoutStatus::open(
                u64::from(self.config.max_attempts).saturating_sub(current_attempts) as u32,
            ),
        };

        let window_started_at = self
            .store
            .get(&keys.first_attempt)
            .await?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(DetailedStatus {
            status,
            current_attempts,
            window_started_at,
        })
    }

    /// Run `operation` guarded by attempt tracking.
    ///
    /// The attempt is recorded *before* the operation runs: whether the
    /// operation executes depends only on state that existed before this
    /// request began, so a caller cannot tell a lockout rejection apart from
    /// a failed validation by timing or partial responses.
    ///
    /// - Already blocked: fails with [`ProtectError::Blocked`] without
    ///   invoking `operation`.
    /// - This attempt reaches the limit: same, the operation is not invoked.
    /// - Operation succeeds: the pre-recorded attempt is undone via
    ///   [`reset_attempts`](Self::reset_attempts) and the value is returned.
    /// - Operation fails: the attempt stands, and the error is wrapped in
    ///   [`ProtectError::Operation`] carrying the remaining-attempts hint.
    pub async fn protect<T, E, F, Fut>(
        &self,
        identifier: &str,
        action: &str,
        operation: F,
    ) -> Result<T, ProtectError<E>>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let status = self.is_blocked(identifier, action).await?;
        if status.is_blocked {
            return Err(blocked_error(&status));
        }

        let pre = self.record_failed_attempt(identifier, action).await?;
        if pre.is_blocked {
            return Err(blocked_error(&pre));
        }

        match operation().await {
            Ok(value) => {
                // The pre-recorded attempt turned out to be legitimate.
                self.reset_attempts(identifier, action).await?;
                Ok(value)
            }
            Err(source) => Err(ProtectError::Operation {
                source,
                remaining_attempts: pre.remaining_attempts.filter(|n| *n > 0),
            }),
        }
    }

    fn keys(&self, action: &str, identifier: &str) -> AttemptKeys {
        AttemptKeys::derive(&self.namespace, action, identifier)
    }

    async fn check_blocked(&self, keys: &AttemptKeys) -> Result<LockoutStatus, Error> {
        let now = Utc::now();
        if let Some(record) = self.read_lockout(keys).await? {
            if record.until > now {
                return Ok(LockoutStatus::blocked(record.until));
            }
            // Stale record the store has not evicted yet. Deleting an
            // already-absent key is a no-op, so racing removals are safe.
            self.store.del(&[keys.lockout.as_str()]).await?;
        }

        let attempts = self.current_attempts(keys).await?;
        let remaining = u64::from(self.config.max_attempts).saturating_sub(attempts) as u32;
        Ok(LockoutStatus::open(remaining))
    }

    async fn trigger_lockout(
        &self,
        keys: &AttemptKeys,
        total_attempts: u64,
        identifier: &str,
        action: &str,
    ) -> Result<LockoutStatus, Error> {
        let duration = backoff::lockout_duration(&self.config, total_attempts);
        let duration_seconds = seconds(duration);
        let until = Utc::now() + duration;
        let record = LockoutRecord {
            until,
            attempts: total_attempts,
            duration_seconds,
        };
        let raw = serde_json::to_string(&record).map_err(|e| StoreError::Serialization {
            key: keys.lockout.clone(),
            message: e.to_string(),
        })?;

        // The counter outlives the lockout so that consecutive lockouts keep
        // escalating; its TTL is refreshed to cover the lockout plus a fresh
        // window, in the same batched write that creates the lockout record.
        let counter_ttl = duration_seconds.saturating_add(seconds(self.config.attempt_window));
        self.store
            .set_and_expire(
                &keys.lockout,
                &raw,
                duration_seconds,
                &keys.attempts,
                counter_ttl,
            )
            .await?;

        tracing::warn!(
            action = action,
            identifier = identifier,
            attempts = total_attempts,
            lockout_seconds = duration_seconds,
            "Lockout triggered"
        );
        Ok(LockoutStatus::blocked(until))
    }

    async fn read_lockout(&self, keys: &AttemptKeys) -> Result<Option<LockoutRecord>, Error> {
        let Some(raw) = self.store.get(&keys.lockout).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
            key: keys.lockout.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(record))
    }

    async fn current_attempts(&self, keys: &AttemptKeys) -> Result<u64, Error> {
        match self.store.get(&keys.attempts).await? {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::from(StoreError::Serialization {
                    key: keys.attempts.clone(),
                    message: "counter is not an integer".to_string(),
                })
            }),
            None => Ok(0),
        }
    }
}

fn validate(identifier: &str, action: &str) -> Result<(), Error> {
    if identifier.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier.into());
    }
    if action.trim().is_empty() {
        return Err(ValidationError::EmptyAction.into());
    }
    Ok(())
}

fn seconds(duration: Duration) -> u64 {
    duration.num_seconds().max(0) as u64
}

fn blocked_error<E>(status: &LockoutStatus) -> ProtectError<E>
where
    E: std::error::Error + 'static,
{
    ProtectError::Blocked {
        blocked_until: status.blocked_until.unwrap_or_else(Utc::now),
        retry_after_seconds: status.retry_after_seconds().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("invalid security code")]
    struct InvalidCode;

    fn strict_service() -> (Arc<MemoryStore>, BruteForceProtectionService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = BruteForceProtectionService::new(store.clone(), LockoutConfig::strict());
        (store, service)
    }

    #[tokio::test]
    async fn fresh_key_reports_full_allowance() {
        let (_, service) = strict_service();
        let status = service.is_blocked("co-1", "validate").await.unwrap();
        assert!(!status.is_blocked);
        assert_eq!(status.remaining_attempts, Some(3));
    }

    #[tokio::test]
    async fn remaining_attempts_count_down() {
        let (_, service) = strict_service();
        for n in 1..3u32 {
            let status = service.record_failed_attempt("co-1", "validate").await.unwrap();
            assert!(!status.is_blocked);
            assert_eq!(status.remaining_attempts, Some(3 - n));
        }
    }

    #[tokio::test]
    async fn reaching_the_limit_triggers_a_lockout() {
        let (_, service) = strict_service();
        for _ in 0..2 {
            let status = service.record_failed_attempt("co-1", "validate").await.unwrap();
            assert!(!status.is_blocked);
        }

        let status = service.record_failed_attempt("co-1", "validate").await.unwrap();
        assert!(status.is_blocked);
        assert!(status.blocked_until.is_some());
        assert!(service.is_blocked("co-1", "validate").await.unwrap().is_blocked);
    }

    #[tokio::test]
    async fn attempts_are_not_recorded_while_blocked() {
        let (_, service) = strict_service();
        for _ in 0..3 {
            service.record_failed_attempt("co-1", "validate").await.unwrap();
        }

        let before = service.get_detailed_status("co-1", "validate").await.unwrap();
        let status = service.record_failed_attempt("co-1", "validate").await.unwrap();
        let after = service.get_detailed_status("co-1", "validate").await.unwrap();

        assert!(status.is_blocked);
        assert_eq!(before.current_attempts, after.current_attempts);
    }

    #[tokio::test]
    async fn identifiers_and_actions_are_independent() {
        let (_, service) = strict_service();
        for _ in 0..3 {
            service.record_failed_attempt("co-1", "validate").await.unwrap();
        }

        assert!(service.is_blocked("co-1", "validate").await.unwrap().is_blocked);

        let other_id = service.is_blocked("co-2", "validate").await.unwrap();
        assert!(!other_id.is_blocked);
        assert_eq!(other_id.remaining_attempts, Some(3));

        let other_action = service.is_blocked("co-1", "unlock").await.unwrap();
        assert!(!other_action.is_blocked);
        assert_eq!(other_action.remaining_attempts, Some(3));
    }

    #[tokio::test]
    async fn reset_restores_the_full_allowance() {
        let (_, service) = strict_service();
        for _ in 0..3 {
            service.record_failed_attempt("co-1", "validate").await.unwrap();
        }
        assert!(service.is_blocked("co-1", "validate").await.unwrap().is_blocked);

        service.reset_attempts("co-1", "validate").await.unwrap();

        let status = service.is_blocked("co-1", "validate").await.unwrap();
        assert!(!status.is_blocked);
        assert_eq!(status.remaining_attempts, Some(3));
    }

    #[tokio::test]
    async fn reset_of_a_clean_key_is_a_no_op() {
        let (_, service) = strict_service();
        service.reset_attempts("never-seen", "validate").await.unwrap();
    }

    #[tokio::test]
    async fn expired_lockout_is_removed_lazily() {
        let (store, service) = strict_service();
        let keys = AttemptKeys::derive(DEFAULT_NAMESPACE, "validate", "co-1");
        let record = LockoutRecord {
            until: Utc::now() - Duration::seconds(5),
            attempts: 3,
            duration_seconds: 10,
        };
        // Positive store TTL, already-passed expiry: the reader must treat it
        // as inactive and remove it.
        store
            .set(&keys.lockout, &serde_json::to_string(&record).unwrap(), 60)
            .await
            .unwrap();

        let status = service.is_blocked("co-1", "validate").await.unwrap();
        assert!(!status.is_blocked);
        assert_eq!(store.get(&keys.lockout).await.unwrap(), None);
    }

    #[tokio::test]
    async fn consecutive_lockouts_escalate() {
        let (store, service) = strict_service();
        let keys = AttemptKeys::derive(DEFAULT_NAMESPACE, "validate", "co-1");

        let first = service.record_failed_attempt("co-1", "validate").await.unwrap();
        assert!(!first.is_blocked);
        service.record_failed_attempt("co-1", "validate").await.unwrap();
        let locked = service.record_failed_attempt("co-1", "validate").await.unwrap();
        assert!(locked.is_blocked);

        let record: LockoutRecord =
            serde_json::from_str(&store.get(&keys.lockout).await.unwrap().unwrap()).unwrap();
        assert_eq!(record.duration_seconds, 10);

        // Simulate the store evicting the lockout record at its expiry; the
        // counter survives with its extended TTL.
        store.del(&[keys.lockout.as_str()]).await.unwrap();

        let relocked = service.record_failed_attempt("co-1", "validate").await.unwrap();
        assert!(relocked.is_blocked);
        let record: LockoutRecord =
            serde_json::from_str(&store.get(&keys.lockout).await.unwrap().unwrap()).unwrap();
        assert_eq!(record.attempts, 4);
        assert_eq!(record.duration_seconds, 30);

        store.del(&[keys.lockout.as_str()]).await.unwrap();
        let third = service.record_failed_attempt("co-1", "validate").await.unwrap();
        assert!(third.is_blocked);
        let record: LockoutRecord =
            serde_json::from_str(&store.get(&keys.lockout).await.unwrap().unwrap()).unwrap();
        assert_eq!(record.duration_seconds, 90);
    }

    #[tokio::test]
    async fn detailed_status_reports_window_state() {
        let (_, service) = strict_service();
        service.record_failed_attempt("co-1", "validate").await.unwrap();
        service.record_failed_attempt("co-1", "validate").await.unwrap();

        let detailed = service.get_detailed_status("co-1", "validate").await.unwrap();
        assert!(!detailed.status.is_blocked);
        assert_eq!(detailed.current_attempts, 2);
        assert_eq!(detailed.status.remaining_attempts, Some(1));
        let started = detailed.window_started_at.expect("window marker missing");
        assert!(started <= Utc::now());
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected() {
        let (_, service) = strict_service();
        let err = service.is_blocked("", "validate").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyIdentifier)
        ));

        let err = service.record_failed_attempt("  ", "validate").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyIdentifier)
        ));
    }

    #[tokio::test]
    async fn empty_action_is_rejected() {
        let (_, service) = strict_service();
        let err = service.is_blocked("co-1", "").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyAction)));
    }

    #[tokio::test]
    async fn namespaces_isolate_services_sharing_a_store() {
        let store = Arc::new(MemoryStore::new());
        let strict = BruteForceProtectionService::new(store.clone(), LockoutConfig::strict())
            .with_namespace("codes");
        let lenient = BruteForceProtectionService::new(store, LockoutConfig::default())
            .with_namespace("logins");

        for _ in 0..3 {
            strict.record_failed_attempt("co-1", "validate").await.unwrap();
        }
        assert!(strict.is_blocked("co-1", "validate").await.unwrap().is_blocked);

        let status = lenient.is_blocked("co-1", "validate").await.unwrap();
        assert!(!status.is_blocked);
        assert_eq!(status.remaining_attempts, Some(5));
    }

    #[tokio::test]
    async fn protect_invokes_the_operation_only_until_lockout() {
        let (_, service) = strict_service();
        let calls = AtomicU32::new(0);
        let failing = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(InvalidCode) }
        };

        let first = service.protect("co-1", "validate", failing).await.unwrap_err();
        assert_eq!(first.to_string(), "invalid security code; 2 attempts remaining");

        let second = service.protect("co-1", "validate", failing).await.unwrap_err();
        assert_eq!(second.to_string(), "invalid security code; 1 attempt remaining");

        // The third call's own recording reaches the limit; the operation
        // must not run and the caller learns nothing about the validation.
        let third = service.protect("co-1", "validate", failing).await.unwrap_err();
        assert!(matches!(third, ProtectError::Blocked { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let fourth = service.protect("co-1", "validate", failing).await.unwrap_err();
        assert!(matches!(fourth, ProtectError::Blocked { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn protect_success_resets_recorded_attempts() {
        let (_, service) = strict_service();
        for _ in 0..2 {
            let _ = service
                .protect("co-2", "validate", || async { Err::<(), _>(InvalidCode) })
                .await;
        }

        let value = service
            .protect("co-2", "validate", || async { Ok::<_, InvalidCode>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let status = service.is_blocked("co-2", "validate").await.unwrap();
        assert!(!status.is_blocked);
        assert_eq!(status.remaining_attempts, Some(3));
    }

    #[tokio::test]
    async fn blocked_error_carries_retry_seconds() {
        let (_, service) = strict_service();
        for _ in 0..3 {
            service.record_failed_attempt("co-1", "validate").await.unwrap();
        }

        let err = service
            .protect("co-1", "validate", || async { Ok::<_, InvalidCode>(()) })
            .await
            .unwrap_err();
        match err {
            ProtectError::Blocked {
                retry_after_seconds,
                ..
            } => {
                assert!(retry_after_seconds > 0 && retry_after_seconds <= 10);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }
}
