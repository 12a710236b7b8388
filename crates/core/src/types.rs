//! Resource identity and version types
//!
//! This module defines the data model of the store:
//! - ResourceKey: (resource type, id) identity of a resource
//! - ResourceMeta: tags, security labels, and profiles attached to a version
//! - ResourceBody: the opaque content blob plus the fields the store must see
//! - VersionContent: `Live(body)` vs `Tombstone`, so deletes are a type-level
//!   fact rather than a nullable body
//! - ResourceVersion: one immutable entry in a resource's history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Version number within a resource's history.
///
/// 1-based and gapless per key: the versions of a resource always form the
/// sequence `1..=N`, and the current version is the one with the highest
/// number.
pub type VersionId = u64;

/// Identity of a resource: resource type plus id
///
/// The id is either client-supplied (must contain at least one non-numeric
/// character, see [`crate::id::validate_client_id`]) or allocated by the
/// store as a decimal sequence number unique per type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Resource type, e.g. "Patient"
    pub resource_type: String,
    /// Resource id within the type
    pub id: String,
}

impl ResourceKey {
    /// Create a new resource key
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// A (system, code) pair used for tags and security labels
///
/// Deduplication identity is the full pair: two codings are the same entry
/// only if both system and code match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coding {
    /// Code system URI or scheme
    pub system: String,
    /// Code within the system
    pub code: String,
}

impl Coding {
    /// Create a new coding
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for Coding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.system, self.code)
    }
}

/// Classification metadata attached to a resource version
///
/// Tags and security labels accumulate across updates (set union), while
/// profiles are authoritative-latest: each update's profile list entirely
/// replaces the previous one. The merge itself lives in [`crate::meta`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Tags, deduplicated by (system, code)
    pub tags: BTreeSet<Coding>,
    /// Security labels, deduplicated by (system, code)
    pub security_labels: BTreeSet<Coding>,
    /// Profile URIs, deduplicated by exact value, incoming order kept
    pub profiles: Vec<String>,
}

impl ResourceMeta {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no tags, security labels, or profiles are present
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.security_labels.is_empty() && self.profiles.is_empty()
    }
}

/// A resource body as submitted by a caller
///
/// The content itself is opaque to the store (schema checking happens in an
/// external collaborator before it gets here). The store only looks at the
/// declared resource type and the optionally embedded id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBody {
    /// Declared resource type; must match the target key's type
    pub resource_type: String,
    /// Id embedded in the body, if the client supplied one
    pub id: Option<String>,
    /// Opaque content blob
    pub content: serde_json::Value,
}

impl ResourceBody {
    /// Create a body with no embedded id
    pub fn new(resource_type: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            content,
        }
    }

    /// Create a body with an embedded client id
    pub fn with_id(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        content: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: Some(id.into()),
            content,
        }
    }
}

/// A caller submission: body plus incoming classification metadata
///
/// The metadata here is what the caller *submitted*; the stored version
/// carries the result of running the merge policy over it (see
/// [`crate::meta::merge_meta`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDraft {
    /// The resource body
    pub body: ResourceBody,
    /// Incoming tags, security labels, and profiles
    pub meta: ResourceMeta,
}

impl ResourceDraft {
    /// Create a draft with empty metadata
    pub fn new(body: ResourceBody) -> Self {
        Self {
            body,
            meta: ResourceMeta::new(),
        }
    }

    /// Create a draft with explicit metadata
    pub fn with_meta(body: ResourceBody, meta: ResourceMeta) -> Self {
        Self { body, meta }
    }

    /// Add a tag
    pub fn tagged(mut self, system: impl Into<String>, code: impl Into<String>) -> Self {
        self.meta.tags.insert(Coding::new(system, code));
        self
    }

    /// Add a security label
    pub fn secured(mut self, system: impl Into<String>, code: impl Into<String>) -> Self {
        self.meta.security_labels.insert(Coding::new(system, code));
        self
    }

    /// Add a profile URI
    pub fn profiled(mut self, uri: impl Into<String>) -> Self {
        self.meta.profiles.push(uri.into());
        self
    }
}

impl From<ResourceBody> for ResourceDraft {
    fn from(body: ResourceBody) -> Self {
        Self::new(body)
    }
}

/// Content of a stored version: live body or deletion marker
///
/// Tombstones participate in version history (a delete consumes a version
/// number) but are excluded from the term index and from default reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VersionContent {
    /// A live resource body
    Live(ResourceBody),
    /// Deletion marker; the resource is "gone" while this is current
    Tombstone,
}

/// One immutable entry in a resource's history
///
/// Written exactly once by the chain store and never mutated afterwards.
/// `version_id` and `last_updated` are assigned at commit time and are both
/// strictly increasing per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceVersion {
    /// Identity of the resource this version belongs to
    pub key: ResourceKey,
    /// Position in the history, 1-based
    pub version_id: VersionId,
    /// Commit timestamp, assigned by the store, monotonic per key
    pub last_updated: DateTime<Utc>,
    /// Merged classification metadata
    pub meta: ResourceMeta,
    /// Live body or tombstone
    pub content: VersionContent,
}

impl ResourceVersion {
    /// True if this version is a deletion marker
    pub fn is_tombstone(&self) -> bool {
        matches!(self.content, VersionContent::Tombstone)
    }

    /// The live body, or `None` for a tombstone
    pub fn body(&self) -> Option<&ResourceBody> {
        match &self.content {
            VersionContent::Live(body) => Some(body),
            VersionContent::Tombstone => None,
        }
    }
}
