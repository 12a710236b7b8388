//! Mutable state of the chronicle resource store
//!
//! Three pieces, each the sole owner of its data:
//! - `IdAllocator`: per-type sequential id counters
//! - `ChainStore`: append-only version chains and the per-key serialization
//!   point for writers
//! - `TermIndex` / `IndexMaintainer`: secondary index over derived search
//!   terms, kept in sync inside the chain store's commit section

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocator;
pub mod chain;
pub mod index;

pub use allocator::IdAllocator;
pub use chain::{ChainStore, VersionChain};
pub use index::{IndexMaintainer, TermIndex};
