//! ResourceStore: the public facade over chains, allocator, and index
//!
//! ## Design
//!
//! The facade is a thin orchestrator: every mutation funnels into
//! `ChainStore::append`, which is the single per-key serialization point.
//! The version build (merge policy, commit timestamp) runs inside the
//! append's build closure, and the index delta runs inside its commit
//! callback, so version append, current-pointer advance, and index update
//! commit together or not at all.
//!
//! ## Conditional operations
//!
//! Conditional create/update resolve their predicate through the injected
//! `SearchResolver` and then pin the append to the version observed at
//! resolution time. A race between resolution and commit surfaces as a
//! `VersionConflict`; the facade retries the resolve+append cycle exactly
//! once before propagating it.

use crate::clock::SystemClock;
use crate::resolver::IndexResolver;
use chrono::{DateTime, Duration, Utc};
use chronicle_core::error::{Result, StoreError};
use chronicle_core::id::validate_client_id;
use chronicle_core::meta::merge_meta;
use chronicle_core::search::Predicate;
use chronicle_core::traits::{Clock, SearchResolver, TermExtractor};
use chronicle_core::types::{
    ResourceBody, ResourceDraft, ResourceKey, ResourceVersion, VersionContent, VersionId,
};
use chronicle_store::{ChainStore, IdAllocator, IndexMaintainer};
use std::sync::Arc;
use tracing::{debug, warn};

/// How many times an idempotent internal append is re-attempted after
/// losing a race (delete-vs-delete, resolve-vs-commit)
const CONFLICT_RETRIES: usize = 1;

/// Versioned resource store
///
/// Owns id allocation, the append-only version chains, and the secondary
/// term index. Term extraction, predicate resolution, and the clock are
/// injected collaborators.
///
/// # Example
///
/// ```ignore
/// use chronicle_engine::ResourceStore;
///
/// let store = ResourceStore::new(Arc::new(MyExtractor));
/// let v1 = store.create("Patient", body, Some("abc123"))?;
/// let v2 = store.update(&v1.key, updated_body, None)?;
/// assert_eq!(v2.version_id, 2);
/// ```
pub struct ResourceStore {
    chains: ChainStore,
    allocator: IdAllocator,
    indexer: Arc<IndexMaintainer>,
    resolver: Arc<dyn SearchResolver>,
    clock: Arc<dyn Clock>,
}

impl ResourceStore {
    /// Create a store with the default index-backed resolver and system clock
    pub fn new(extractor: Arc<dyn TermExtractor>) -> Self {
        let indexer = Arc::new(IndexMaintainer::new(extractor));
        let resolver = Arc::new(IndexResolver::new(Arc::clone(&indexer)));
        Self {
            chains: ChainStore::new(),
            allocator: IdAllocator::new(),
            indexer,
            resolver,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replace the search resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn SearchResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The term index, for resolvers layered on top of this store
    pub fn index(&self) -> &Arc<IndexMaintainer> {
        &self.indexer
    }

    // ========== Create / Update ==========

    /// Create a resource
    ///
    /// With a client id: the id must contain at least one non-numeric
    /// character (`InvalidId` otherwise). If the key already exists — live
    /// or gone — the create lands as the next version of that chain
    /// (idempotent-create semantics; a recreate never resets the version
    /// sequence). Without a client id, one is allocated.
    pub fn create(
        &self,
        resource_type: &str,
        draft: impl Into<ResourceDraft>,
        client_id: Option<&str>,
    ) -> Result<ResourceVersion> {
        let draft = draft.into();
        ensure_type(resource_type, &draft.body)?;
        let id = match client_id {
            Some(id) => {
                validate_client_id(id)?;
                id.to_string()
            }
            None => self.allocator.allocate(resource_type),
        };
        let key = ResourceKey::new(resource_type, id);
        debug!(key = %key, "create");
        self.append_draft(&key, draft, None)
    }

    /// Update a resource, direct path
    ///
    /// A key that never existed is created (update-as-create), provided its
    /// id would have been acceptable from a client — so updating an unknown
    /// purely numeric id fails `InvalidId` rather than squatting on the
    /// allocator's id space. A gone key is recreated, continuing its
    /// version sequence.
    ///
    /// `expected_prior` is the optimistic precondition: when supplied, the
    /// append fails `VersionConflict` unless it matches the current version
    /// id at commit time.
    pub fn update(
        &self,
        key: &ResourceKey,
        draft: impl Into<ResourceDraft>,
        expected_prior: Option<VersionId>,
    ) -> Result<ResourceVersion> {
        let draft = draft.into();
        ensure_type(&key.resource_type, &draft.body)?;
        if !self.chains.exists(key) {
            validate_client_id(&key.id)?;
        }
        debug!(key = %key, expected_prior, "update");
        self.append_draft(key, draft, expected_prior)
    }

    // ========== Conditional Operations ==========

    /// Update targeted by a predicate instead of an explicit id
    ///
    /// - no match: behaves as `create`, using the body's embedded id if any;
    /// - one match: updates that resource, pinned to the version observed at
    ///   resolution (one retry of the whole cycle on `VersionConflict`);
    /// - more than one match: fails `MultipleMatches`, not retryable.
    pub fn conditional_update(
        &self,
        resource_type: &str,
        draft: impl Into<ResourceDraft>,
        predicate: &Predicate,
    ) -> Result<ResourceVersion> {
        let draft = draft.into();
        ensure_type(resource_type, &draft.body)?;

        let mut attempts = 0;
        loop {
            let matches = self.resolver.resolve(resource_type, predicate)?;
            match matches.len() {
                0 => {
                    let client_id = draft.body.id.clone();
                    debug!(resource_type, predicate = %predicate, "conditional update matched nothing, creating");
                    return self.create(resource_type, draft, client_id.as_deref());
                }
                1 => {
                    let key = matches
                        .into_iter()
                        .next()
                        .ok_or_else(|| StoreError::StorageUnavailable("resolver returned inconsistent match set".to_string()))?;
                    let observed = self.chains.current(&key).map(|v| v.version_id).unwrap_or(0);
                    match self.append_draft(&key, draft.clone(), Some(observed)) {
                        Err(StoreError::VersionConflict { expected, actual })
                            if attempts < CONFLICT_RETRIES =>
                        {
                            warn!(key = %key, expected, actual, "conditional update raced a writer, re-resolving");
                            attempts += 1;
                        }
                        other => return other,
                    }
                }
                n => {
                    warn!(resource_type, predicate = %predicate, matches = n, "ambiguous conditional update");
                    return Err(StoreError::MultipleMatches {
                        resource_type: resource_type.to_string(),
                        matches: n,
                    });
                }
            }
        }
    }

    /// Create only if no current resource matches the predicate
    ///
    /// With at least one match, returns the first match's current version
    /// unchanged — no new version is written. With none, behaves as
    /// `create` (using the body's embedded id if any).
    pub fn conditional_create(
        &self,
        resource_type: &str,
        draft: impl Into<ResourceDraft>,
        predicate: &Predicate,
    ) -> Result<ResourceVersion> {
        let draft = draft.into();
        ensure_type(resource_type, &draft.body)?;

        let matches = self.resolver.resolve(resource_type, predicate)?;
        if let Some(key) = matches.iter().next() {
            debug!(key = %key, "conditional create matched existing resource");
            return self
                .chains
                .current(key)
                .ok_or_else(|| StoreError::not_found(key));
        }
        let client_id = draft.body.id.clone();
        self.create(resource_type, draft, client_id.as_deref())
    }

    // ========== Reads ==========

    /// Read the current version
    ///
    /// Fails `NotFound` if the key never existed, `ResourceGone` if the
    /// current version is a tombstone.
    pub fn read(&self, key: &ResourceKey) -> Result<ResourceVersion> {
        let current = self
            .chains
            .current(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        if current.is_tombstone() {
            return Err(StoreError::ResourceGone(key.clone()));
        }
        Ok(current)
    }

    /// Read a specific historical version, regardless of current/gone status
    pub fn vread(&self, key: &ResourceKey, version_id: VersionId) -> Result<ResourceVersion> {
        self.chains
            .version(key, version_id)
            .ok_or_else(|| StoreError::version_not_found(key, version_id))
    }

    /// History of a key, newest first
    ///
    /// Finite and restartable: each call re-reads storage. Fails `NotFound`
    /// if the key never existed. Tombstone versions are included.
    pub fn history(
        &self,
        key: &ResourceKey,
        count: Option<usize>,
        since_version: Option<VersionId>,
    ) -> Result<Vec<ResourceVersion>> {
        self.chains
            .history(key, count, since_version, None)
            .ok_or_else(|| StoreError::not_found(key))
    }

    /// History of a key restricted to versions committed after `since`
    pub fn history_since(
        &self,
        key: &ResourceKey,
        since: DateTime<Utc>,
    ) -> Result<Vec<ResourceVersion>> {
        self.chains
            .history(key, None, None, Some(since))
            .ok_or_else(|| StoreError::not_found(key))
    }

    // ========== Delete ==========

    /// Delete a resource by appending a tombstone version
    ///
    /// The tombstone consumes a version number and stays in history; the
    /// prior metadata is carried onto it so a later recreate still merges
    /// against it. Deleting an already-gone key is a no-op returning the
    /// existing tombstone. Fails `NotFound` if the key never existed.
    pub fn delete(&self, key: &ResourceKey) -> Result<ResourceVersion> {
        let mut attempts = 0;
        loop {
            let current = self
                .chains
                .current(key)
                .ok_or_else(|| StoreError::not_found(key))?;
            if current.is_tombstone() {
                return Ok(current);
            }

            let result = self.chains.append(
                key,
                Some(current.version_id),
                |prior, next| {
                    let meta = prior.map(|p| p.meta.clone()).unwrap_or_default();
                    Ok(ResourceVersion {
                        key: key.clone(),
                        version_id: next,
                        last_updated: self.stamp(prior),
                        meta,
                        content: VersionContent::Tombstone,
                    })
                },
                |prior, new| self.indexer.reindex(key, prior, new),
            );
            match result {
                Err(StoreError::VersionConflict { .. }) if attempts < CONFLICT_RETRIES => {
                    // Lost a race; re-read — the winner may already have
                    // tombstoned the key, which makes this a no-op
                    attempts += 1;
                }
                other => {
                    if other.is_ok() {
                        debug!(key = %key, "deleted");
                    }
                    return other;
                }
            }
        }
    }

    // ========== Internals ==========

    /// Append one live version: merge policy + commit timestamp inside the
    /// chain's build closure, index delta inside its commit callback
    fn append_draft(
        &self,
        key: &ResourceKey,
        draft: ResourceDraft,
        expected_prior: Option<VersionId>,
    ) -> Result<ResourceVersion> {
        let ResourceDraft { body, meta } = draft;
        self.chains.append(
            key,
            expected_prior,
            |prior, next| {
                Ok(ResourceVersion {
                    key: key.clone(),
                    version_id: next,
                    last_updated: self.stamp(prior),
                    meta: merge_meta(prior.map(|p| &p.meta), &meta),
                    content: VersionContent::Live(body),
                })
            },
            |prior, new| self.indexer.reindex(key, prior, new),
        )
    }

    /// Commit timestamp: clock time, bumped to stay strictly greater than
    /// the prior version's timestamp
    fn stamp(&self, prior: Option<&ResourceVersion>) -> DateTime<Utc> {
        let mut ts = self.clock.now();
        if let Some(prev) = prior {
            if ts <= prev.last_updated {
                ts = prev.last_updated + Duration::milliseconds(1);
            }
        }
        ts
    }
}

/// The body must declare the same type as the operation targets
fn ensure_type(resource_type: &str, body: &ResourceBody) -> Result<()> {
    if body.resource_type != resource_type {
        return Err(StoreError::TypeMismatch {
            expected: resource_type.to_string(),
            actual: body.resource_type.clone(),
        });
    }
    Ok(())
}
