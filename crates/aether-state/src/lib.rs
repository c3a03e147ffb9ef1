//! Aether-State: gem vault persistence
//!
//! This crate provides the persistence layer for the Aether intent bus. It
//! owns the `GemStore` boundary (CRUD by id plus metadata-filtered scans)
//! and its backends.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: record integrity and batch-safe deletes for the retention ritual.
//!
//! ## Key Components
//!
//! - `GemStore`: backend-agnostic async trait
//! - `MemoryGemStore`: in-memory fake for tests
//! - `SurrealGemStore`: SurrealDB backend (`mem://` or `surrealkv://<path>`)

mod error;
pub mod fakes;
pub mod migrations;
pub mod schema;
pub mod storage_traits;
pub mod surreal_gem_store;

pub use error::{StateError, StorageError};
pub use fakes::MemoryGemStore;
pub use storage_traits::{Gem, GemFilter, GemId, GemStore, StorageResult};
pub use surreal_gem_store::SurrealGemStore;

/// Result type for aether-state setup operations
pub type Result<T> = std::result::Result<T, StateError>;
