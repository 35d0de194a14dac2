//! Process-wide cache of reference collections.
//!
//! Lifecycle: empty at start, populated lazily on first lookup per key,
//! cleared only by explicit invalidation. Entries are immutable once stored.

use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::gateway::GatewayError;
use crate::types::{DataType, UnitGroups};

/// Logical name of a cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKey {
    DataTypes,
    Units,
}

impl ReferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKey::DataTypes => "data-types",
            ReferenceKey::Units => "units",
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached reference collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceCollection {
    DataTypes(Vec<DataType>),
    Units(UnitGroups),
}

impl ReferenceCollection {
    /// Find the id of the record whose code matches exactly.
    pub fn id_for_code(&self, code: &str) -> Option<&str> {
        match self {
            ReferenceCollection::DataTypes(types) => types
                .iter()
                .find(|t| t.code == code)
                .map(|t| t.id.as_str()),
            ReferenceCollection::Units(groups) => groups
                .values()
                .flatten()
                .find(|u| u.code == code)
                .map(|u| u.id.as_str()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceCollection::DataTypes(types) => types.len(),
            ReferenceCollection::Units(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Loader calls that succeeded
    pub loads: u64,
}

/// Reference data cache, shared as `Arc<ReferenceCache>`.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: DashMap<ReferenceKey, Arc<ReferenceCollection>>,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached collection for `key`, without fetching.
    pub fn peek(&self, key: ReferenceKey) -> Option<Arc<ReferenceCollection>> {
        self.entries.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached collection for `key`, or load and store it.
    ///
    /// A failed load stores nothing, so the next call retries. If two
    /// loads race for the same key the first stored result wins and both
    /// callers receive it.
    pub async fn get<F, Fut>(
        &self,
        key: ReferenceKey,
        loader: F,
    ) -> Result<Arc<ReferenceCollection>, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ReferenceCollection, GatewayError>>,
    {
        if let Some(hit) = self.peek(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Reference cache hit");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Reference cache miss, loading");

        let loaded = Arc::new(loader().await?);
        self.loads.fetch_add(1, Ordering::Relaxed);

        let stored = self.entries.entry(key).or_insert(loaded);
        Ok(Arc::clone(stored.value()))
    }

    /// Id of the record in the cached `key` collection whose code matches.
    ///
    /// `None` when the collection is not cached or nothing matches.
    pub fn lookup_id_by_code(&self, key: ReferenceKey, code: &str) -> Option<String> {
        self.peek(key)
            .and_then(|collection| collection.id_for_code(code).map(str::to_string))
    }

    /// Drop one entry, or every entry when `key` is `None`.
    ///
    /// Never triggers a refetch.
    pub fn invalidate(&self, key: Option<ReferenceKey>) {
        match key {
            Some(key) => {
                self.entries.remove(&key);
                debug!(key = %key, "Reference cache entry invalidated");
            }
            None => {
                self.entries.clear();
                debug!("Reference cache cleared");
            }
        }
    }

    pub fn contains(&self, key: ReferenceKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }
}
