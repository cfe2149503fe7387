//! Pool configuration errors.

use thiserror::Error;

/// Errors raised while constructing pools and allocators.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Pool '{pool}' must have at least one block")]
    ZeroBlocks { pool: String },

    #[error("Pool '{pool}' arena of {blocks} x {block_size} bytes overflows the address space")]
    ArenaTooLarge {
        pool: String,
        block_size: usize,
        blocks: usize,
    },

    #[error("Size-class allocator needs at least one pool")]
    NoPools,

    #[error("Configuration parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}
