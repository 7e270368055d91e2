//! Store key derivation for attempt tracking state.

/// The three store keys backing one `(identifier, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptKeys {
    /// Counter of failed attempts in the current window.
    pub attempts: String,
    /// Serialized [`LockoutRecord`](crate::LockoutRecord), present while a
    /// lockout is active.
    pub lockout: String,
    /// Timestamp of the first failure in the current window.
    pub first_attempt: String,
}

impl AttemptKeys {
    /// Derive the keys for `(namespace, action, identifier)`.
    ///
    /// Layout is `{namespace}:{action}:{identifier}:{suffix}`. Segments are
    /// escaped so that a `:` inside an action or identifier cannot make two
    /// distinct pairs share a key, and unrelated namespaces in the same store
    /// never overlap.
    pub fn derive(namespace: &str, action: &str, identifier: &str) -> Self {
        let prefix = format!(
            "{}:{}:{}",
            escape(namespace),
            escape(action),
            escape(identifier)
        );
        Self {
            attempts: format!("{prefix}:attempts"),
            lockout: format!("{prefix}:lockout"),
            first_attempt: format!("{prefix}:first_attempt"),
        }
    }
}

fn escape(segment: &str) -> String {
    segment.replace('%', "%25").replace(':', "%3A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = AttemptKeys::derive("guardrail", "validate", "co-1");
        let b = AttemptKeys::derive("guardrail", "validate", "co-1");
        assert_eq!(a, b);
        assert_eq!(a.attempts, "guardrail:validate:co-1:attempts");
        assert_eq!(a.lockout, "guardrail:validate:co-1:lockout");
        assert_eq!(a.first_attempt, "guardrail:validate:co-1:first_attempt");
    }

    #[test]
    fn distinct_pairs_never_collide() {
        // Without escaping these two would both map to "ns:a:b:c:attempts".
        let a = AttemptKeys::derive("ns", "a", "b:c");
        let b = AttemptKeys::derive("ns", "a:b", "c");
        assert_ne!(a.attempts, b.attempts);
        assert_ne!(a.lockout, b.lockout);
    }

    #[test]
    fn namespaces_are_isolated() {
        let a = AttemptKeys::derive("one", "validate", "co-1");
        let b = AttemptKeys::derive("two", "validate", "co-1");
        assert_ne!(a.attempts, b.attempts);
    }

    #[test]
    fn escape_round_trips_percent_literals() {
        let a = AttemptKeys::derive("ns", "a%3A", "c");
        let b = AttemptKeys::derive("ns", "a:", "c");
        assert_ne!(a.attempts, b.attempts);
    }
}
