//! Strata Index - concurrent in-memory record store with secondary indexes
//!
//! Records are stored once, behind `Arc`, and looked up by a unique primary
//! key or through any number of named secondary indexes registered at
//! runtime. A secondary index derives zero or more keys from each record, so
//! both "field equals" and "field contains" lookups are expressed the same way.
//!
//! # Quick Start
//!
//! ```
//! use strata_index::{IndexMap, PrimaryIndex, SecondaryIndex};
//!
//! struct Person { id: i64, city: String, like: Vec<String> }
//!
//! let persons = IndexMap::new(PrimaryIndex::new(|p: &Person| p.id));
//! persons.add_index("city", SecondaryIndex::by_field(|p: &Person| p.city.clone()));
//! persons.add_index("like", SecondaryIndex::by_elements(|p: &Person| p.like.as_slice()));
//!
//! persons.insert(Person { id: 0, city: "SF".into(), like: vec!["Bob".into()] });
//! persons.insert(Person { id: 1, city: "SF".into(), like: vec![] });
//!
//! assert_eq!(persons.get_all_by("city", "SF").len(), 2);
//! assert_eq!(persons.get_all_by("like", "Bob")[0].id, 0);
//! ```
//!
//! # Architecture
//!
//! - `strata-index-core`: key model, errors, configuration
//! - `strata-index-storage`: primary/secondary indexes, ordering cache, `IndexMap`

pub use strata_index_core::*;
pub use strata_index_storage::*;
