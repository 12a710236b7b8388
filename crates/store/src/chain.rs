//! Version chains and the chain store
//!
//! ## Design
//!
//! Each resource key owns a `VersionChain`: the append-only sequence of its
//! versions, stored newest-first in a `VecDeque` so current-version reads
//! and history listings are O(1) at the front. Version ids are gapless
//! (1..=N), which also makes random access to a historical version O(1) by
//! offset.
//!
//! `ChainStore` maps keys to chains via `DashMap`. The per-key entry lock is
//! the single serialization point for writers: `append` verifies the
//! optimistic precondition, builds the new version, pushes it, and runs the
//! commit callback (the index delta) all under that lock, so a concurrent
//! reader never observes a chain/index state that was not fully committed.
//! Reads go through lock-free `DashMap` lookups and clone fully-committed
//! versions out.

use chrono::{DateTime, Utc};
use chronicle_core::error::{Result, StoreError};
use chronicle_core::types::{ResourceKey, ResourceVersion, VersionId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::debug;

/// Append-only version history of a single resource, newest first
#[derive(Debug, Clone, Default)]
pub struct VersionChain {
    versions: VecDeque<ResourceVersion>,
}

impl VersionChain {
    /// Add a new version; must continue the gapless sequence
    fn push(&mut self, version: ResourceVersion) {
        debug_assert_eq!(
            version.version_id,
            self.current().map(|v| v.version_id).unwrap_or(0) + 1,
            "version ids must be gapless"
        );
        self.versions.push_front(version);
    }

    /// The current (highest-numbered) version
    pub fn current(&self) -> Option<&ResourceVersion> {
        self.versions.front()
    }

    /// A specific historical version, or `None` if it never existed
    ///
    /// O(1): the gapless sequence makes the offset from the front exact.
    pub fn version(&self, version_id: VersionId) -> Option<&ResourceVersion> {
        let latest = self.current()?.version_id;
        if version_id == 0 || version_id > latest {
            return None;
        }
        self.versions.get((latest - version_id) as usize)
    }

    /// Number of versions in the chain
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// History listing, newest first
    ///
    /// * `count` - maximum versions to return (None = all)
    /// * `since_version` - only versions newer than this (exclusive)
    /// * `since_time` - only versions committed after this (exclusive)
    pub fn history(
        &self,
        count: Option<usize>,
        since_version: Option<VersionId>,
        since_time: Option<DateTime<Utc>>,
    ) -> Vec<ResourceVersion> {
        let iter = self
            .versions
            .iter()
            .filter(|v| since_version.map(|since| v.version_id > since).unwrap_or(true))
            .filter(|v| since_time.map(|since| v.last_updated > since).unwrap_or(true))
            .cloned();
        match count {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }
}

/// All version chains, keyed by resource
///
/// # Thread Safety
///
/// Writers to the same key serialize on the key's `DashMap` entry lock
/// inside [`ChainStore::append`]; writers to different keys never contend
/// beyond `DashMap`'s internal sharding. Readers never block writers and see
/// only committed versions.
#[derive(Debug, Default)]
pub struct ChainStore {
    chains: DashMap<ResourceKey, VersionChain>,
}

impl ChainStore {
    /// Create an empty chain store
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically append a new version to a key's chain
    ///
    /// Under the key's entry lock:
    /// 1. reads the current version id (0 if the key is absent);
    /// 2. if `expected_prior` is given and does not match, fails
    ///    `VersionConflict` without writing anything;
    /// 3. calls `build` with the prior current version and the version id to
    ///    assign; `build` produces the fully-formed new version (body, merged
    ///    metadata, commit timestamp);
    /// 4. pushes the new version and advances "current" to it;
    /// 5. calls `commit` (the index delta) while the key is still locked.
    ///
    /// A failing `build` leaves no trace: absent keys stay absent and the
    /// chain is untouched.
    pub fn append<B, C>(
        &self,
        key: &ResourceKey,
        expected_prior: Option<VersionId>,
        build: B,
        commit: C,
    ) -> Result<ResourceVersion>
    where
        B: FnOnce(Option<&ResourceVersion>, VersionId) -> Result<ResourceVersion>,
        C: FnOnce(Option<&ResourceVersion>, &ResourceVersion),
    {
        match self.chains.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let chain = occupied.get_mut();
                let prior = chain.current().cloned();
                let prior_id = prior.as_ref().map(|v| v.version_id).unwrap_or(0);
                if let Some(expected) = expected_prior {
                    if expected != prior_id {
                        return Err(StoreError::VersionConflict {
                            expected,
                            actual: prior_id,
                        });
                    }
                }
                let version = build(prior.as_ref(), prior_id + 1)?;
                chain.push(version.clone());
                commit(prior.as_ref(), &version);
                debug!(key = %key, version_id = version.version_id, "appended version");
                Ok(version)
            }
            Entry::Vacant(vacant) => {
                if let Some(expected) = expected_prior {
                    if expected != 0 {
                        return Err(StoreError::VersionConflict {
                            expected,
                            actual: 0,
                        });
                    }
                }
                let version = build(None, 1)?;
                let mut chain = VersionChain::default();
                chain.push(version.clone());
                // Keep the entry guard alive so commit runs under the lock
                let _guard = vacant.insert(chain);
                commit(None, &version);
                debug!(key = %key, version_id = 1, "created version chain");
                Ok(version)
            }
        }
    }

    /// The current version of a key, or `None` if the key never existed
    pub fn current(&self, key: &ResourceKey) -> Option<ResourceVersion> {
        self.chains.get(key).and_then(|c| c.current().cloned())
    }

    /// A specific version of a key, or `None` if it never existed
    pub fn version(&self, key: &ResourceKey, version_id: VersionId) -> Option<ResourceVersion> {
        self.chains.get(key).and_then(|c| c.version(version_id).cloned())
    }

    /// True if the key has ever had a version written
    pub fn exists(&self, key: &ResourceKey) -> bool {
        self.chains.contains_key(key)
    }

    /// History of a key, newest first; `None` if the key never existed
    ///
    /// Restartable: every call re-reads the chain, there is no cursor.
    pub fn history(
        &self,
        key: &ResourceKey,
        count: Option<usize>,
        since_version: Option<VersionId>,
        since_time: Option<DateTime<Utc>>,
    ) -> Option<Vec<ResourceVersion>> {
        self.chains
            .get(key)
            .map(|c| c.history(count, since_version, since_time))
    }

    /// Number of keys with at least one version
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True if no key has ever been written
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
