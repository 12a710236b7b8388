//! Secondary term index
//!
//! Maps derived search terms to the resource keys whose *current* version
//! produced them. Two mirrored maps, following the paired-index layout:
//! - by_key: key → the terms currently indexed for it
//! - by_term: (resource type, term) → the keys currently matching it
//!
//! Empty posting sets are pruned on removal so the maps never accumulate
//! dead entries. Tombstoned and absent resources have no rows at all.
//!
//! `IndexMaintainer` wraps the index in an `RwLock` together with the
//! injected term extractor and applies the delta for one version transition.
//! It is only ever invoked from the chain store's commit callback, so the
//! index never drifts from the durable current version.

use chronicle_core::traits::TermExtractor;
use chronicle_core::types::{ResourceKey, ResourceVersion};
use chronicle_core::Term;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// In-memory posting maps for derived terms
#[derive(Debug, Default)]
pub struct TermIndex {
    by_key: FxHashMap<ResourceKey, BTreeSet<Term>>,
    by_term: FxHashMap<(String, Term), FxHashSet<ResourceKey>>,
}

impl TermIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows for a key
    pub fn insert_terms(&mut self, key: &ResourceKey, terms: BTreeSet<Term>) {
        for term in &terms {
            self.by_term
                .entry((key.resource_type.clone(), term.clone()))
                .or_default()
                .insert(key.clone());
        }
        if !terms.is_empty() {
            self.by_key.entry(key.clone()).or_default().extend(terms);
        }
    }

    /// Remove exactly the given rows for a key
    pub fn remove_terms(&mut self, key: &ResourceKey, terms: &BTreeSet<Term>) {
        for term in terms {
            let slot = (key.resource_type.clone(), term.clone());
            if let Some(keys) = self.by_term.get_mut(&slot) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_term.remove(&slot);
                }
            }
        }
        if let Some(indexed) = self.by_key.get_mut(key) {
            for term in terms {
                indexed.remove(term);
            }
            if indexed.is_empty() {
                self.by_key.remove(key);
            }
        }
    }

    /// The terms currently indexed for a key
    pub fn terms_for(&self, key: &ResourceKey) -> BTreeSet<Term> {
        self.by_key.get(key).cloned().unwrap_or_default()
    }

    /// The keys of `resource_type` currently matching a term
    pub fn keys_matching(&self, resource_type: &str, term: &Term) -> FxHashSet<ResourceKey> {
        self.by_term
            .get(&(resource_type.to_string(), term.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of keys with at least one indexed term
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// True if no key has any indexed term
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Keeps the term index in sync with version transitions
///
/// `reindex` runs inside the chain store's per-key commit section, so the
/// version append and the index delta are one atomic unit as far as any
/// other thread can observe.
pub struct IndexMaintainer {
    extractor: Arc<dyn TermExtractor>,
    index: RwLock<TermIndex>,
}

impl IndexMaintainer {
    /// Create a maintainer over an empty index
    pub fn new(extractor: Arc<dyn TermExtractor>) -> Self {
        Self {
            extractor,
            index: RwLock::new(TermIndex::new()),
        }
    }

    /// Apply the index delta for one version transition
    ///
    /// Removes the rows derived from `old_current` (none if it was absent or
    /// a tombstone) and inserts the rows derived from `new_current` (none if
    /// it is a tombstone). Idempotent: replaying the same transition leaves
    /// the same final state.
    pub fn reindex(
        &self,
        key: &ResourceKey,
        old_current: Option<&ResourceVersion>,
        new_current: &ResourceVersion,
    ) {
        let old_terms = old_current
            .and_then(|v| v.body())
            .map(|b| self.extractor.extract(b))
            .unwrap_or_default();
        let new_terms = new_current
            .body()
            .map(|b| self.extractor.extract(b))
            .unwrap_or_default();

        let mut index = self.index.write();
        index.remove_terms(key, &old_terms);
        index.insert_terms(key, new_terms.clone());
        debug!(
            key = %key,
            removed = old_terms.len(),
            inserted = new_terms.len(),
            "reindexed"
        );
    }

    /// The terms currently indexed for a key
    pub fn terms_for(&self, key: &ResourceKey) -> BTreeSet<Term> {
        self.index.read().terms_for(key)
    }

    /// The keys of `resource_type` currently matching a term
    pub fn keys_matching(&self, resource_type: &str, term: &Term) -> FxHashSet<ResourceKey> {
        self.index.read().keys_matching(resource_type, term)
    }

    /// Number of keys with at least one indexed term
    pub fn indexed_keys(&self) -> usize {
        self.index.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::types::{ResourceBody, ResourceMeta, VersionContent};
    use chronicle_core::VersionId;
    use chrono::Utc;

    /// Indexes every top-level string field of the content as (field, value)
    struct FieldExtractor;

    impl TermExtractor for FieldExtractor {
        fn extract(&self, body: &ResourceBody) -> BTreeSet<Term> {
            body.content
                .as_object()
                .map(|map| {
                    map.iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| Term::new(k.clone(), s)))
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    fn live(key: &ResourceKey, version_id: VersionId, content: serde_json::Value) -> ResourceVersion {
        ResourceVersion {
            key: key.clone(),
            version_id,
            last_updated: Utc::now(),
            meta: ResourceMeta::new(),
            content: VersionContent::Live(ResourceBody::new(key.resource_type.clone(), content)),
        }
    }

    fn tombstone(key: &ResourceKey, version_id: VersionId) -> ResourceVersion {
        ResourceVersion {
            key: key.clone(),
            version_id,
            last_updated: Utc::now(),
            meta: ResourceMeta::new(),
            content: VersionContent::Tombstone,
        }
    }

    fn maintainer() -> IndexMaintainer {
        IndexMaintainer::new(Arc::new(FieldExtractor))
    }

    #[test]
    fn test_index_rows_follow_create() {
        let m = maintainer();
        let key = ResourceKey::new("Patient", "a");
        let v1 = live(&key, 1, serde_json::json!({"name": "Smith"}));
        m.reindex(&key, None, &v1);

        assert_eq!(m.terms_for(&key), [Term::new("name", "Smith")].into());
        assert!(m.keys_matching("Patient", &Term::new("name", "Smith")).contains(&key));
    }

    #[test]
    fn test_index_rows_follow_update() {
        let m = maintainer();
        let key = ResourceKey::new("Patient", "a");
        let v1 = live(&key, 1, serde_json::json!({"name": "Smith"}));
        let v2 = live(&key, 2, serde_json::json!({"name": "Jones"}));
        m.reindex(&key, None, &v1);
        m.reindex(&key, Some(&v1), &v2);

        assert!(m.keys_matching("Patient", &Term::new("name", "Smith")).is_empty());
        assert!(m.keys_matching("Patient", &Term::new("name", "Jones")).contains(&key));
        assert_eq!(m.terms_for(&key), [Term::new("name", "Jones")].into());
    }

    #[test]
    fn test_tombstone_clears_rows() {
        let m = maintainer();
        let key = ResourceKey::new("Patient", "a");
        let v1 = live(&key, 1, serde_json::json!({"name": "Smith"}));
        m.reindex(&key, None, &v1);
        m.reindex(&key, Some(&v1), &tombstone(&key, 2));

        assert!(m.terms_for(&key).is_empty());
        assert_eq!(m.indexed_keys(), 0);
    }

    #[test]
    fn test_recreate_after_tombstone_reindexes() {
        let m = maintainer();
        let key = ResourceKey::new("Patient", "a");
        let v1 = live(&key, 1, serde_json::json!({"name": "Smith"}));
        let v2 = tombstone(&key, 2);
        let v3 = live(&key, 3, serde_json::json!({"name": "Back"}));
        m.reindex(&key, None, &v1);
        m.reindex(&key, Some(&v1), &v2);
        m.reindex(&key, Some(&v2), &v3);

        assert!(m.keys_matching("Patient", &Term::new("name", "Back")).contains(&key));
    }

    #[test]
    fn test_reindex_idempotent_under_retry() {
        let m = maintainer();
        let key = ResourceKey::new("Patient", "a");
        let v1 = live(&key, 1, serde_json::json!({"name": "Smith"}));
        let v2 = live(&key, 2, serde_json::json!({"name": "Jones", "city": "Berlin"}));
        m.reindex(&key, None, &v1);
        m.reindex(&key, Some(&v1), &v2);
        m.reindex(&key, Some(&v1), &v2);

        assert_eq!(
            m.terms_for(&key),
            [Term::new("name", "Jones"), Term::new("city", "Berlin")].into()
        );
        assert!(m.keys_matching("Patient", &Term::new("name", "Smith")).is_empty());
    }

    #[test]
    fn test_shared_terms_across_keys() {
        let m = maintainer();
        let a = ResourceKey::new("Patient", "a");
        let b = ResourceKey::new("Patient", "b");
        m.reindex(&a, None, &live(&a, 1, serde_json::json!({"name": "Smith"})));
        m.reindex(&b, None, &live(&b, 1, serde_json::json!({"name": "Smith"})));

        let matches = m.keys_matching("Patient", &Term::new("name", "Smith"));
        assert_eq!(matches.len(), 2);

        // Removing one key leaves the other's row intact
        let v1a = live(&a, 1, serde_json::json!({"name": "Smith"}));
        m.reindex(&a, Some(&v1a), &tombstone(&a, 2));
        let matches = m.keys_matching("Patient", &Term::new("name", "Smith"));
        assert_eq!(matches.len(), 1);
        assert!(matches.contains(&b));
    }

    #[test]
    fn test_types_do_not_collide() {
        let m = maintainer();
        let p = ResourceKey::new("Patient", "a");
        let o = ResourceKey::new("Observation", "a");
        m.reindex(&p, None, &live(&p, 1, serde_json::json!({"name": "Smith"})));
        m.reindex(&o, None, &live(&o, 1, serde_json::json!({"name": "Smith"})));

        assert_eq!(m.keys_matching("Patient", &Term::new("name", "Smith")).len(), 1);
        assert_eq!(m.keys_matching("Observation", &Term::new("name", "Smith")).len(), 1);
    }
}
