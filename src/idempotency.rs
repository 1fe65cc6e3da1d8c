//! Deterministic idempotency keys for charge deduplication.
//!
//! The key is a SHA-256 over the input fields with length framing, so
//! `("ab", "c")` and `("a", "bc")` never collide and every field (including
//! the optional run id) changes the key.

use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "idem_";

pub fn generate_idempotency_key(
    customer_id: &str,
    meter: &str,
    sequence: u64,
    run_id: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    for field in [customer_id, meter] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update(sequence.to_be_bytes());
    match run_id {
        Some(run) => {
            hasher.update([1u8]);
            hasher.update((run.len() as u64).to_be_bytes());
            hasher.update(run.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    format!("{KEY_PREFIX}{}", hex::encode(&hasher.finalize()[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_key() {
        let a = generate_idempotency_key("cust_123", "tokens", 1, None);
        let b = generate_idempotency_key("cust_123", "tokens", 1, None);
        assert_eq!(a, b);
    }

    #[test]
    fn every_field_affects_key() {
        let base = generate_idempotency_key("cust_123", "tokens", 1, None);
        assert_ne!(base, generate_idempotency_key("cust_456", "tokens", 1, None));
        assert_ne!(
            base,
            generate_idempotency_key("cust_123", "api_calls", 1, None)
        );
        assert_ne!(base, generate_idempotency_key("cust_123", "tokens", 2, None));
        assert_ne!(
            base,
            generate_idempotency_key("cust_123", "tokens", 1, Some("run_abc"))
        );
    }

    #[test]
    fn field_boundaries_do_not_collide() {
        let a = generate_idempotency_key("ab", "c", 1, None);
        let b = generate_idempotency_key("a", "bc", 1, None);
        assert_ne!(a, b);
    }

    #[test]
    fn stable_across_repeated_calls() {
        let keys: std::collections::HashSet<String> = (0..100)
            .map(|_| generate_idempotency_key("stable_test", "tokens", 42, None))
            .collect();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn sequential_sequences_are_unique() {
        let keys: std::collections::HashSet<String> = (0..100)
            .map(|i| generate_idempotency_key("cust_123", "tokens", i, None))
            .collect();
        assert_eq!(keys.len(), 100);
    }

    #[test]
    fn handles_empty_unicode_and_large_inputs() {
        assert!(!generate_idempotency_key("", "", 0, None).is_empty());
        let key = generate_idempotency_key("cust_unicode_中文", "meter_日本語", 1, None);
        assert!(key.starts_with("idem_"));
        let key = generate_idempotency_key("cust_123", "tokens", 999_999_999_999, None);
        assert!(key.starts_with("idem_"));
    }
}
