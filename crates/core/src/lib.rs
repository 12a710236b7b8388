//! Core types and traits for the chronicle resource store
//!
//! This crate defines the foundational pieces used throughout the system:
//! - ResourceKey, ResourceVersion, VersionContent: the versioned data model
//! - ResourceMeta, Coding: classification metadata and its merge policy
//! - Term, Predicate: search facts and conditional-operation targeting
//! - StoreError: the error hierarchy
//! - Traits: TermExtractor, SearchResolver, Clock (injected collaborators)
//! - Id validation for client-supplied ids

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod meta;
pub mod search;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Result, StoreError};
pub use id::{validate_client_id, IdError, MAX_ID_LENGTH};
pub use meta::merge_meta;
pub use search::{Predicate, Term};
pub use traits::{Clock, SearchResolver, TermExtractor};
pub use types::{
    Coding, ResourceBody, ResourceDraft, ResourceKey, ResourceMeta, ResourceVersion,
    VersionContent, VersionId,
};
