//! Memory subsystem: the gem vault and its retention ritual.
//!
//! The [`Vault`] owns gem persistence through an injected
//! [`GemStore`](aether_state::GemStore). [`commit_change`] is a stateless
//! helper that turns transmuted params into a gem. [`RetentionRitual`]
//! releases gems that are both old and rarely used, on demand or on a
//! schedule.

pub mod error;
pub mod record;
pub mod retention;
pub mod schedule;
pub mod vault;

pub use error::{MemoryError, MemoryResult};
pub use record::commit_change;
pub use retention::{
    CleanseReport, CleanseStatus, RetentionPolicy, RetentionRitual, DEFAULT_MIN_USAGE,
    DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS,
};
pub use schedule::spawn_retention_schedule;
pub use vault::{GemMetadata, Vault};
