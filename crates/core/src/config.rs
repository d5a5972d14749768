//! Index map configuration.
//!
//! This module provides configuration for an `IndexMap` instance.

use serde::{Deserialize, Serialize};

fn default_name() -> String {
    "index_map".to_string()
}

/// Index map configuration parameters.
///
/// # Example
///
/// ```
/// use strata_index_core::IndexMapConfig;
///
/// let config = IndexMapConfig::new()
///     .with_name("persons")
///     .with_initial_capacity(1024)
///     .with_max_indexes(8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMapConfig {
    /// Label attached to tracing events emitted by this instance (default: "index_map").
    #[serde(default = "default_name")]
    pub name: String,

    /// Number of records to pre-size the primary mapping and ordering cache for (default: 0).
    #[serde(default)]
    pub initial_capacity: usize,

    /// Maximum number of secondary indexes that may be registered (default: unbounded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_indexes: Option<usize>,
}

impl Default for IndexMapConfig {
    fn default() -> Self {
        IndexMapConfig {
            name: default_name(),
            initial_capacity: 0,
            max_indexes: None,
        }
    }
}

impl IndexMapConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tracing label (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the initial capacity (builder pattern).
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Bound the number of secondary indexes (builder pattern).
    pub fn with_max_indexes(mut self, max: usize) -> Self {
        self.max_indexes = Some(max);
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.max_indexes == Some(0) {
            return Err(ConfigError::ZeroIndexLimit);
        }
        Ok(())
    }
}

/// Index map configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The tracing label is empty.
    #[error("Index map name must not be empty")]
    EmptyName,

    /// `max_indexes` is zero, which would forbid every index.
    #[error("Index limit must be at least 1 when set")]
    ZeroIndexLimit,
}
