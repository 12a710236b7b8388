//! Index-backed search resolver
//!
//! Resolves a conjunction-of-equality-terms predicate by intersecting the
//! term index's posting sets, restricted to one resource type. Because the
//! index only ever holds rows for current, non-tombstoned versions, the
//! result is exactly the set of currently-matching resources at the time of
//! the call.
//!
//! This is the default resolver wired into the facade; callers with a
//! richer predicate language inject their own [`SearchResolver`].

use chronicle_core::error::Result;
use chronicle_core::search::Predicate;
use chronicle_core::traits::SearchResolver;
use chronicle_core::types::ResourceKey;
use chronicle_store::IndexMaintainer;
use std::collections::BTreeSet;
use std::sync::Arc;

/// [`SearchResolver`] over the store's own term index
pub struct IndexResolver {
    index: Arc<IndexMaintainer>,
}

impl IndexResolver {
    /// Create a resolver over the given index
    pub fn new(index: Arc<IndexMaintainer>) -> Self {
        Self { index }
    }
}

impl SearchResolver for IndexResolver {
    fn resolve(&self, resource_type: &str, predicate: &Predicate) -> Result<BTreeSet<ResourceKey>> {
        let mut terms = predicate.terms().iter();

        // An empty predicate matches nothing rather than everything
        let Some(first) = terms.next() else {
            return Ok(BTreeSet::new());
        };

        let mut keys: BTreeSet<ResourceKey> = self
            .index
            .keys_matching(resource_type, first)
            .into_iter()
            .collect();

        for term in terms {
            if keys.is_empty() {
                break;
            }
            let posting = self.index.keys_matching(resource_type, term);
            keys.retain(|key| posting.contains(key));
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::traits::TermExtractor;
    use chronicle_core::types::{
        ResourceBody, ResourceMeta, ResourceVersion, VersionContent, VersionId,
    };
    use chronicle_core::Term;
    use chrono::Utc;

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

    fn setup() -> (Arc<IndexMaintainer>, IndexResolver) {
        let index = Arc::new(IndexMaintainer::new(Arc::new(FieldExtractor)));
        let resolver = IndexResolver::new(Arc::clone(&index));
        (index, resolver)
    }

    #[test]
    fn test_single_term_match() {
        let (index, resolver) = setup();
        let key = ResourceKey::new("Patient", "a");
        index.reindex(&key, None, &live(&key, 1, serde_json::json!({"name": "Smith"})));

        let matches = resolver
            .resolve("Patient", &Predicate::matching("name", "Smith"))
            .unwrap();
        assert_eq!(matches, BTreeSet::from([key]));
    }

    #[test]
    fn test_conjunction_intersects() {
        let (index, resolver) = setup();
        let a = ResourceKey::new("Patient", "a");
        let b = ResourceKey::new("Patient", "b");
        index.reindex(
            &a,
            None,
            &live(&a, 1, serde_json::json!({"name": "Smith", "city": "Berlin"})),
        );
        index.reindex(
            &b,
            None,
            &live(&b, 1, serde_json::json!({"name": "Smith", "city": "Paris"})),
        );

        let matches = resolver
            .resolve(
                "Patient",
                &Predicate::matching("name", "Smith").and("city", "Berlin"),
            )
            .unwrap();
        assert_eq!(matches, BTreeSet::from([a]));
    }

    #[test]
    fn test_type_restriction() {
        let (index, resolver) = setup();
        let p = ResourceKey::new("Patient", "a");
        let o = ResourceKey::new("Observation", "b");
        index.reindex(&p, None, &live(&p, 1, serde_json::json!({"name": "Smith"})));
        index.reindex(&o, None, &live(&o, 1, serde_json::json!({"name": "Smith"})));

        let matches = resolver
            .resolve("Patient", &Predicate::matching("name", "Smith"))
            .unwrap();
        assert_eq!(matches, BTreeSet::from([p]));
    }

    #[test]
    fn test_empty_predicate_matches_nothing() {
        let (index, resolver) = setup();
        let key = ResourceKey::new("Patient", "a");
        index.reindex(&key, None, &live(&key, 1, serde_json::json!({"name": "Smith"})));

        let matches = resolver.resolve("Patient", &Predicate::new()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_no_match() {
        let (_, resolver) = setup();
        let matches = resolver
            .resolve("Patient", &Predicate::matching("name", "Nobody"))
            .unwrap();
        assert!(matches.is_empty());
    }
}
