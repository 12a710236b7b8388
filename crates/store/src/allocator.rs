//! Server-side id allocation
//!
//! Assigns the next client-visible sequential id for a resource type when a
//! create arrives without one. Counters are per-type atomics, initialized
//! lazily on first use; two concurrent allocations for the same type never
//! return the same id, and an id is never reissued (counters only advance,
//! tombstoned resources keep their number).

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Per-resource-type sequential id allocator
///
/// Allocated ids are decimal strings starting at "1". Client-assigned ids
/// must contain a non-numeric character, so the two id spaces never collide.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counters: DashMap<String, AtomicU64>,
}

impl IdAllocator {
    /// Create a new allocator with no counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for a resource type
    pub fn allocate(&self, resource_type: &str) -> String {
        let counter = self
            .counters
            .entry(resource_type.to_string())
            .or_insert_with(|| AtomicU64::new(0));
        let id = counter.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(resource_type, id, "allocated id");
        id.to_string()
    }

    /// Highest id handed out so far for a resource type (0 if none)
    pub fn last_allocated(&self, resource_type: &str) -> u64 {
        self.counters
            .get(resource_type)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}
