//! Error types for the memory subsystem.

use aether_state::StorageError;

/// Errors produced by vault and ritual operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("gem not found: {id}")]
    GemNotFound { id: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for memory operations.
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
