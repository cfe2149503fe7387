//! Static pool layouts.

use super::error::ConfigError;
use super::size_class::HEADER_SIZE;
use serde::{Deserialize, Serialize};

/// Layout of one fixed-block pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Name used in logs and statistics
    pub name: String,

    /// Requested block size in bytes, before alignment rounding
    pub block_size: usize,

    /// Number of blocks in the arena
    pub block_count: usize,
}

impl PoolConfig {
    pub fn new(name: impl Into<String>, block_size: usize, block_count: usize) -> Self {
        Self {
            name: name.into(),
            block_size,
            block_count,
        }
    }
}

/// One size class: a pool sized for `capacity` client bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeClassConfig {
    pub name: String,

    /// Largest request, in client bytes, this class serves
    pub capacity: usize,

    pub blocks: usize,
}

impl SizeClassConfig {
    pub fn new(name: impl Into<String>, capacity: usize, blocks: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            blocks,
        }
    }

    /// Pool layout for this class, including room for the owner header.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(
            self.name.clone(),
            self.capacity.saturating_add(HEADER_SIZE),
            self.blocks,
        )
    }
}

/// Layout of a size-class allocator.
///
/// # Example
///
/// ```rust
/// use fsmpool::memory::AllocatorConfig;
///
/// let config = AllocatorConfig::from_json(
///     r#"{ "classes": [
///         { "name": "small", "capacity": 32, "blocks": 10 },
///         { "name": "large", "capacity": 128, "blocks": 5 }
///     ] }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.classes.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    pub classes: Vec<SizeClassConfig>,
}

impl AllocatorConfig {
    pub fn new(classes: Vec<SizeClassConfig>) -> Self {
        Self { classes }
    }

    /// Add a size class.
    pub fn class(mut self, name: impl Into<String>, capacity: usize, blocks: usize) -> Self {
        self.classes.push(SizeClassConfig::new(name, capacity, blocks));
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
