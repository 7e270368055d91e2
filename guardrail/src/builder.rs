//! Builder for constructing [`Guardrail`] instances.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use guardrail::{Guardrail, LockoutConfig, MemoryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let guard = Guardrail::builder()
//!     .with_store(Arc::new(MemoryStore::new()))
//!     .with_config(LockoutConfig::strict())
//!     .with_namespace("security_codes")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use guardrail_core::{
    AttemptStore, BruteForceProtectionService, DetailedStatus, Error, LockoutConfig,
    LockoutStatus, MemoryStore, ProtectError,
};

/// Errors that can occur when building a [`Guardrail`] instance.
#[derive(Debug, thiserror::Error)]
pub enum GuardrailBuilderError {
    /// No attempt store was configured.
    #[error("No attempt store configured")]
    MissingStore,
}

/// One-stop entry point over a [`BruteForceProtectionService`].
///
/// Thin facade that owns the service and forwards its operations; construct
/// it with [`builder`](Self::builder) or, for tests and single-process use,
/// [`in_memory`](Guardrail::in_memory).
pub struct Guardrail<S: AttemptStore> {
    service: BruteForceProtectionService<S>,
}

impl Guardrail<MemoryStore> {
    /// A guardrail over a fresh in-memory store.
    pub fn in_memory(config: LockoutConfig) -> Self {
        Self {
            service: BruteForceProtectionService::new(Arc::new(MemoryStore::new()), config),
        }
    }
}

impl<S: AttemptStore> Guardrail<S> {
    /// Start building a [`Guardrail`].
    pub fn builder() -> GuardrailBuilder<S> {
        GuardrailBuilder::new()
    }

    /// Access the underlying service.
    pub fn service(&self) -> &BruteForceProtectionService<S> {
        &self.service
    }

    /// See [`BruteForceProtectionService::is_blocked`].
    pub async fn is_blocked(&self, identifier: &str, action: &str) -> Result<LockoutStatus, Error> {
        self.service.is_blocked(identifier, action).await
    }

    /// See [`BruteForceProtectionService::record_failed_attempt`].
    pub async fn record_failed_attempt(
        &self,
        identifier: &str,
        action: &str,
    ) -> Result<LockoutStatus, Error> {
        self.service.record_failed_attempt(identifier, action).await
    }

    /// See [`BruteForceProtectionService::reset_attempts`].
    pub async fn reset_attempts(&self, identifier: &str, action: &str) -> Result<(), Error> {
        self.service.reset_attempts(identifier, action).await
    }

    /// See [`BruteForceProtectionService::get_detailed_status`].
    pub async fn get_detailed_status(
        &self,
        identifier: &str,
        action: &str,
    ) -> Result<DetailedStatus, Error> {
        self.service.get_detailed_status(identifier, action).await
    }

    /// See [`BruteForceProtectionService::protect`].
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
        self.service.protect(identifier, action, operation).await
    }
}

/// Builder for [`Guardrail`].
///
/// The store is required; configuration defaults to the lenient preset and a
/// shared default namespace.
pub struct GuardrailBuilder<S: AttemptStore> {
    store: Option<Arc<S>>,
    config: LockoutConfig,
    namespace: Option<String>,
}

impl<S: AttemptStore> GuardrailBuilder<S> {
    pub fn new() -> Self {
        Self {
            store: None,
            config: LockoutConfig::default(),
            namespace: None,
        }
    }

    /// Use the given attempt store.
    pub fn with_store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the lenient default configuration.
    pub fn with_config(mut self, config: LockoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the strict preset for high-value operations.
    pub fn strict(mut self) -> Self {
        self.config = LockoutConfig::strict();
        self
    }

    /// Override the key namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn build(self) -> Result<Guardrail<S>, GuardrailBuilderError> {
        let store = self.store.ok_or(GuardrailBuilderError::MissingStore)?;
        tracing::debug!(
            max_attempts = self.config.max_attempts,
            namespace = self.namespace.as_deref(),
            "Building guardrail"
        );
        let mut service = BruteForceProtectionService::new(store, self.config);
        if let Some(namespace) = self.namespace {
            service = service.with_namespace(namespace);
        }
        Ok(Guardrail { service })
    }
}

impl<S: AttemptStore> Default for GuardrailBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
