//! Collaborator traits consumed by the store
//!
//! The store treats term extraction, predicate resolution, and time as
//! injected capabilities. All three traits are object-safe and `Send + Sync`
//! so implementations can be shared behind `Arc<dyn _>` across threads.

use crate::error::Result;
use crate::search::{Predicate, Term};
use crate::types::{ResourceBody, ResourceKey};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Derives the indexable terms of a resource body
///
/// Must be pure and deterministic: the same body always yields the same
/// term set, with no side effects. Must not fail for any well-formed body;
/// a body with nothing indexable yields the empty set.
pub trait TermExtractor: Send + Sync {
    /// Extract the set of (parameter, value) terms from a body
    fn extract(&self, body: &ResourceBody) -> BTreeSet<Term>;
}

/// Resolves a predicate to the set of currently-matching resource keys
///
/// Only current, non-tombstoned versions participate. The result must be
/// consistent with the term index state at the time of the call.
pub trait SearchResolver: Send + Sync {
    /// Resolve `predicate` against current resources of `resource_type`
    fn resolve(&self, resource_type: &str, predicate: &Predicate) -> Result<BTreeSet<ResourceKey>>;
}

/// Source of commit timestamps
///
/// `now()` must be monotonic non-decreasing across calls from the same
/// process. Strict per-key increase is enforced by the store's append path
/// on top of this.
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}
