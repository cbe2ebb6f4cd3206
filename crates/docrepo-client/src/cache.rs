//! Response cache for repository fetches.
//!
//! Entries are keyed by a [`Fingerprint`] of the request identity and the
//! context it ran under. The cache is never written through: create, update
//! and delete calls leave it alone, and only [`ResponseCache::clear`] empties
//! it. Growth is unbounded until then.

use std::fmt;

use dashmap::DashMap;
use docrepo_types::OperationResult;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::trace;

/// Deterministic cache key of one request under one context
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash the request identity (operation id or route), its parameters with
    /// object keys sorted, the repository name and the enrichers.
    ///
    /// Enricher order does not matter; an empty repository name and `None`
    /// are distinct.
    pub fn compute<'a, I>(
        identity: &str,
        params: &Value,
        repository_name: Option<&str>,
        enrichers: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut enrichers: Vec<&str> = enrichers.into_iter().collect();
        enrichers.sort_unstable();
        enrichers.dedup();

        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update([0u8]);
        hasher.update(canonicalize(params).to_string().as_bytes());
        hasher.update([0u8]);
        match repository_name {
            Some(name) => {
                hasher.update([1u8]);
                hasher.update(name.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        for enricher in enrichers {
            hasher.update([0u8]);
            hasher.update(enricher.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Copy of `value` with every object's keys in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Process-local cache of decoded results, safe to share across tasks
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<Fingerprint, OperationResult>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct fingerprints stored
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Stored result, if any; never touches the network
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<OperationResult> {
        let hit = self.entries.get(fingerprint).map(|entry| entry.value().clone());
        trace!(fingerprint = %fingerprint, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Store `result`, replacing any previous entry
    pub fn put(&self, fingerprint: Fingerprint, result: OperationResult) {
        trace!(fingerprint = %fingerprint, kind = result.kind(), "Cache store");
        self.entries.insert(fingerprint, result);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}
