//! Index engine for strata-index
//!
//! This crate implements the in-memory indexing engine with:
//! - RefSet: identity-deduplicated set of shared records (bucket type)
//! - PrimaryIndex: unique key → record mapping
//! - SecondaryIndex: derived key → set of records, many-to-many
//! - OrderingCache: lazily rebuilt sorted view of all records
//! - IndexMap: orchestrator keeping every index consistent under one RwLock
//!
//! # Concurrency
//!
//! `IndexMap` is `Send + Sync` when its keys and records are. Reads
//! (`get`, `get_all_by`, `range`, `collect*`, `len`) share the lock; writes
//! (`insert`, `update`, `remove`, `add_index`, `clear`) take it exclusively.
//! The lock is not reentrant: callbacks must not call back into the map.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod map;
pub mod ordering;
pub mod primary;
pub mod secondary;
pub mod set;

pub use map::{IndexChange, IndexMap};
pub use ordering::{Comparator, OrderingCache};
pub use primary::{KeyExtractor, PrimaryIndex};
pub use secondary::{RecordIndex, SecondaryIndex};
pub use set::RefSet;
