//! Metadata merge policy
//!
//! Computes the metadata for a new version from the previous current
//! version's metadata and the incoming metadata. The asymmetry is a domain
//! rule: tags and security labels are classification metadata and
//! accumulate, profiles are structural-conformance metadata and the latest
//! submission is authoritative.
//!
//! `merge_meta` is a pure function over immutable snapshots; neither input
//! is mutated.

use crate::types::ResourceMeta;
use std::collections::BTreeSet;

/// Merge previous and incoming metadata into the next version's metadata
///
/// Rules:
/// - tags: union of previous and incoming, deduplicated by (system, code)
/// - security labels: union, deduplicated identically
/// - profiles: incoming replaces previous entirely; the incoming list is
///   itself deduplicated by exact value, first occurrence wins
///
/// With no previous version (fresh create) the unions are no-ops, but
/// profile deduplication still applies.
pub fn merge_meta(previous: Option<&ResourceMeta>, incoming: &ResourceMeta) -> ResourceMeta {
    let mut tags = incoming.tags.clone();
    let mut security_labels = incoming.security_labels.clone();

    if let Some(prev) = previous {
        tags.extend(prev.tags.iter().cloned());
        security_labels.extend(prev.security_labels.iter().cloned());
    }

    ResourceMeta {
        tags,
        security_labels,
        profiles: dedup_profiles(&incoming.profiles),
    }
}

/// Deduplicate a profile list by exact value, keeping first-seen order
fn dedup_profiles(profiles: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    profiles
        .iter()
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coding;

    fn meta(tags: &[(&str, &str)], security: &[(&str, &str)], profiles: &[&str]) -> ResourceMeta {
        ResourceMeta {
            tags: tags.iter().map(|(s, c)| Coding::new(*s, *c)).collect(),
            security_labels: security.iter().map(|(s, c)| Coding::new(*s, *c)).collect(),
            profiles: profiles.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_tags_union() {
        let prev = meta(&[("scheme1", "term1")], &[], &[]);
        let incoming = meta(&[("scheme2", "term2")], &[], &[]);
        let merged = merge_meta(Some(&prev), &incoming);
        assert_eq!(merged.tags.len(), 2);
        assert!(merged.tags.contains(&Coding::new("scheme1", "term1")));
        assert!(merged.tags.contains(&Coding::new("scheme2", "term2")));
    }

    #[test]
    fn test_security_labels_union() {
        let prev = meta(&[], &[("sec_scheme1", "sec_term1")], &[]);
        let incoming = meta(&[], &[("sec_scheme2", "sec_term2")], &[]);
        let merged = merge_meta(Some(&prev), &incoming);
        assert_eq!(merged.security_labels.len(), 2);
    }

    #[test]
    fn test_union_deduplicates() {
        let prev = meta(&[("s", "c")], &[], &[]);
        let incoming = meta(&[("s", "c")], &[], &[]);
        let merged = merge_meta(Some(&prev), &incoming);
        assert_eq!(merged.tags.len(), 1);
    }

    #[test]
    fn test_profiles_replaced_not_merged() {
        let prev = meta(&[], &[], &["http://foo1"]);
        let incoming = meta(&[], &[], &["http://foo2"]);
        let merged = merge_meta(Some(&prev), &incoming);
        assert_eq!(merged.profiles, vec!["http://foo2".to_string()]);
    }

    #[test]
    fn test_incoming_profiles_deduplicated() {
        let incoming = meta(&[], &[], &["http://foo/bar", "http://foo/bar", "http://foo/bar"]);
        let merged = merge_meta(None, &incoming);
        assert_eq!(merged.profiles, vec!["http://foo/bar".to_string()]);
    }

    #[test]
    fn test_profile_dedup_keeps_first_seen_order() {
        let incoming = meta(&[], &[], &["http://b", "http://a", "http://b"]);
        let merged = merge_meta(None, &incoming);
        assert_eq!(
            merged.profiles,
            vec!["http://b".to_string(), "http://a".to_string()]
        );
    }

    #[test]
    fn test_fresh_create_passes_through() {
        let incoming = meta(&[("s", "c")], &[("ss", "sc")], &["http://p"]);
        let merged = merge_meta(None, &incoming);
        assert_eq!(merged, meta(&[("s", "c")], &[("ss", "sc")], &["http://p"]));
    }

    #[test]
    fn test_inputs_not_mutated() {
        let prev = meta(&[("a", "1")], &[], &["http://old"]);
        let incoming = meta(&[("b", "2")], &[], &["http://new", "http://new"]);
        let _ = merge_meta(Some(&prev), &incoming);
        assert_eq!(prev.profiles, vec!["http://old".to_string()]);
        assert_eq!(incoming.profiles.len(), 2);
    }

    #[test]
    fn test_full_update_scenario() {
        // create with tags {A}, profile {P1}; update with tags {B}, profile {P2}
        let v1 = merge_meta(None, &meta(&[("sys", "A")], &[], &["P1"]));
        let v2 = merge_meta(Some(&v1), &meta(&[("sys", "B")], &[], &["P2"]));
        assert_eq!(v2.tags.len(), 2);
        assert!(v2.tags.contains(&Coding::new("sys", "A")));
        assert!(v2.tags.contains(&Coding::new("sys", "B")));
        assert_eq!(v2.profiles, vec!["P2".to_string()]);
    }
}
