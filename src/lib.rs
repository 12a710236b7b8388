//! Chronicle - versioned resource store with immutable history
//!
//! Chronicle stores typed resources as append-only version chains: every
//! create, update, and delete appends an immutable version, the highest
//! version is "current", and a secondary term index over current versions
//! drives conditional (predicate-targeted) operations.
//!
//! # Quick Start
//!
//! ```ignore
//! use chronicle::{Predicate, ResourceBody, ResourceStore};
//! use serde_json::json;
//!
//! let store = ResourceStore::new(Arc::new(MyExtractor));
//!
//! // Create with a client-assigned id (must contain a non-numeric character)
//! let v1 = store.create("Patient", ResourceBody::new("Patient", json!({"name": "Smith"})), Some("abc123"))?;
//!
//! // Update appends version 2; tags accumulate, profiles are replaced
//! let v2 = store.update(&v1.key, ResourceBody::new("Patient", json!({"name": "Smythe"})), None)?;
//!
//! // Conditional update: targets by predicate instead of id
//! store.conditional_update("Patient", body, &Predicate::matching("name", "Smythe"))?;
//! ```
//!
//! # Architecture
//!
//! The facade lives in `chronicle-engine`; `chronicle-store` holds the
//! version chains, id allocator, and term index; `chronicle-core` defines
//! the data model, errors, and the injected collaborator traits
//! (TermExtractor, SearchResolver, Clock).

pub use chronicle_core::{
    merge_meta, validate_client_id, Clock, Coding, IdError, Predicate, ResourceBody,
    ResourceDraft, ResourceKey, ResourceMeta, ResourceVersion, Result, SearchResolver, StoreError,
    Term, TermExtractor, VersionContent, VersionId, MAX_ID_LENGTH,
};
pub use chronicle_engine::{IndexResolver, ResourceStore, SystemClock};
pub use chronicle_store::{ChainStore, IdAllocator, IndexMaintainer, TermIndex, VersionChain};
