//! Call-result cache keyed by `(target, selector, argument fingerprint)`.
//!
//! Entries are write-once: the first payload stored for a key is the one
//! served for the key's lifetime. Payloads for a fixed fingerprint are
//! expected to be deterministic, so a repeated write carries the same value
//! anyway. Entries with empty payloads are retained but never served, so a
//! lookup hit always short-circuits to something usable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fingerprint::ArgFingerprint;
use crate::ident::FunctionSelector;

/// Cache key binding a payload to one exact call shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub target: String,
    pub selector: FunctionSelector,
    pub fingerprint: ArgFingerprint,
}

impl CacheKey {
    pub fn new(target: impl Into<String>, selector: FunctionSelector, args: &[u64]) -> Self {
        Self {
            target: target.into(),
            selector,
            fingerprint: ArgFingerprint::compute(args),
        }
    }
}

/// Write-once payload cache.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CallCache {
    entries: BTreeMap<CacheKey, Vec<u64>>,
}

impl CallCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Served payload for the key, if present and non-empty.
    pub fn lookup(&self, key: &CacheKey) -> Option<&[u64]> {
        match self.entries.get(key) {
            Some(payload) if !payload.is_empty() => Some(payload.as_slice()),
            _ => None,
        }
    }

    /// Store a payload. The first write for a key wins; later writes for the
    /// same key are ignored.
    pub fn insert(&mut self, key: CacheKey, payload: Vec<u64>) {
        self.entries.entry(key).or_insert(payload);
    }

    /// Drop every entry for one target. Returns the number removed.
    pub fn purge_target(&mut self, target: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.target != target);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(target: &str, selector: &str, args: &[u64]) -> CacheKey {
        CacheKey::new(target, FunctionSelector::new(selector), args)
    }

    #[test]
    fn lookup_serves_stored_payload_verbatim() {
        let mut cache = CallCache::new();
        cache.insert(key("Vault", "balance", &[1]), vec![42, 7]);
        assert_eq!(cache.lookup(&key("Vault", "balance", &[1])), Some(&[42, 7][..]));
    }

    #[test]
    fn distinct_args_miss() {
        let mut cache = CallCache::new();
        cache.insert(key("Vault", "balance", &[1]), vec![42]);
        assert!(cache.lookup(&key("Vault", "balance", &[2])).is_none());
        assert!(cache.lookup(&key("Vault", "other", &[1])).is_none());
        assert!(cache.lookup(&key("Other", "balance", &[1])).is_none());
    }

    #[test]
    fn first_write_wins() {
        let mut cache = CallCache::new();
        cache.insert(key("Vault", "balance", &[1]), vec![42]);
        cache.insert(key("Vault", "balance", &[1]), vec![99]);
        assert_eq!(cache.lookup(&key("Vault", "balance", &[1])), Some(&[42][..]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_payloads_are_retained_but_never_served() {
        let mut cache = CallCache::new();
        cache.insert(key("Vault", "noop", &[]), vec![]);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&key("Vault", "noop", &[])).is_none());

        // Write-once still holds: the empty entry keeps its key.
        cache.insert(key("Vault", "noop", &[]), vec![1]);
        assert!(cache.lookup(&key("Vault", "noop", &[])).is_none());
    }

    #[test]
    fn purge_removes_only_the_named_target() {
        let mut cache = CallCache::new();
        cache.insert(key("Vault", "a", &[1]), vec![1]);
        cache.insert(key("Vault", "b", &[2]), vec![2]);
        cache.insert(key("Oracle", "a", &[1]), vec![3]);

        assert_eq!(cache.purge_target("Vault"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&key("Oracle", "a", &[1])).is_some());
        assert_eq!(cache.purge_target("Vault"), 0);
    }
}
