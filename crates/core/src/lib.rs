//! Core types for strata-index
//!
//! This crate defines the vocabulary shared by the index engine:
//! - SecondaryKey: hashable, ordered keys derived from records
//! - Error: failures reported by checked operations
//! - IndexMapConfig: per-instance configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod key;

pub use config::{ConfigError, IndexMapConfig};
pub use error::{Error, Result};
pub use key::{KeyList, SecondaryKey};
