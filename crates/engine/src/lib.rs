//! Resource store engine: the operation facade over chains and index
//!
//! This crate wires the storage layer into the public operation surface:
//! - ResourceStore: create, update, conditional create/update, read, vread,
//!   delete, history
//! - SystemClock: monotonic commit timestamp source
//! - IndexResolver: default predicate resolver over the store's term index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod resolver;
pub mod store;

pub use clock::SystemClock;
pub use resolver::IndexResolver;
pub use store::ResourceStore;
