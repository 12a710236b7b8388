//! Error types for the resource store
//!
//! All failures surface synchronously to the caller as typed outcomes; none
//! are swallowed. We use `thiserror` for automatic `Display` and `Error`
//! trait implementations.
//!
//! Retry guidance is part of the contract: `VersionConflict` and
//! `StorageUnavailable` are the only kinds a caller may reasonably retry
//! (see [`StoreError::is_retryable`]). `MultipleMatches` and `TypeMismatch`
//! are caller-input errors and must not be retried without changing the
//! request.

use crate::id::IdError;
use crate::types::{ResourceKey, VersionId};
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for the resource store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Client-supplied id failed validation
    #[error("Invalid id: {0}")]
    InvalidId(#[from] IdError),

    /// Key (or a specific version of it) never existed
    #[error("Resource not found: {key}{}", .version_id.map(|v| format!(" version {v}")).unwrap_or_default())]
    NotFound {
        /// The key that was requested
        key: ResourceKey,
        /// The specific version requested, if any
        version_id: Option<VersionId>,
    },

    /// The resource's current version is a tombstone (direct read only)
    #[error("Resource is gone: {0}")]
    ResourceGone(ResourceKey),

    /// Optimistic precondition failed: the current version id at commit time
    /// did not match the expected prior version
    #[error("Version conflict: expected {expected}, got {actual}")]
    VersionConflict {
        /// Version the caller expected to be current
        expected: VersionId,
        /// Version actually current at commit time
        actual: VersionId,
    },

    /// A conditional predicate resolved to more than one resource
    #[error("Predicate matched {matches} {resource_type} resources; conditional operations require at most one match")]
    MultipleMatches {
        /// Resource type the predicate was restricted to
        resource_type: String,
        /// Number of matches found
        matches: usize,
    },

    /// The target resolved to a different resource type than the body declares
    #[error("Type mismatch: target is {expected}, body declares {actual}")]
    TypeMismatch {
        /// Resource type of the target key
        expected: String,
        /// Resource type declared by the body
        actual: String,
    },

    /// Backing storage I/O failure; retryable with backoff, never
    /// partially applied
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    /// Convenience constructor for a key that never existed
    pub fn not_found(key: &ResourceKey) -> Self {
        StoreError::NotFound {
            key: key.clone(),
            version_id: None,
        }
    }

    /// Convenience constructor for a version that never existed
    pub fn version_not_found(key: &ResourceKey, version_id: VersionId) -> Self {
        StoreError::NotFound {
            key: key.clone(),
            version_id: Some(version_id),
        }
    }

    /// True if the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::StorageUnavailable(_)
        )
    }
}
