//! Error types for strata-index
//!
//! The index map itself reports lookups by absent results and index
//! registration by boolean outcome. The checked companions (`try_*`)
//! and configuration validation report failures through this enum.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::config::ConfigError;
use thiserror::Error;

/// Result type alias for strata-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the index map
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An index with this name is already registered
    #[error("Index already registered: {0}")]
    DuplicateIndex(String),

    /// No index with this name is registered
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    /// The configured maximum number of secondary indexes is reached
    #[error("Index limit reached: at most {limit} secondary indexes")]
    IndexLimitReached {
        /// Configured maximum
        limit: usize,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl Error {
    /// Name of the index involved, if the error concerns a specific index
    pub fn index_name(&self) -> Option<&str> {
        match self {
            Error::DuplicateIndex(name) | Error::UnknownIndex(name) => Some(name),
            _ => None,
        }
    }
}
