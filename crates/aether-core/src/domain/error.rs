//! Domain-level error taxonomy for Aether.

use aether_state::StorageError;

use crate::memory::MemoryError;

/// Reasons an observation or envelope is refused by the gate.
///
/// These never cross the gate boundary as hard failures; callers see them
/// as a [`crate::gate::Verdict`] (passed flag plus reason code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ValidationError {
    #[error("observation carries no intent vector")]
    MissingVector,

    #[error("severe negative sentiment guardrail tripped")]
    Parajika,

    #[error("energy level outside [0.0, 1.0]")]
    OutOfBounds,

    #[error("unexpected protocol version")]
    InvalidProtocol,

    #[error("envelope has no method")]
    MissingMethod,

    #[error("identity token missing or empty")]
    MissingToken,
}

impl ValidationError {
    /// Stable wire code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingVector => "MISSING_VECTOR",
            ValidationError::Parajika => "PARAJIKA",
            ValidationError::OutOfBounds => "OUT_OF_BOUNDS",
            ValidationError::InvalidProtocol => "INVALID_PROTOCOL",
            ValidationError::MissingMethod => "MISSING_METHOD",
            ValidationError::MissingToken => "MISSING_TOKEN",
        }
    }

    /// Parse a wire code back into a rejection.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "MISSING_VECTOR" => Some(ValidationError::MissingVector),
            "PARAJIKA" => Some(ValidationError::Parajika),
            "OUT_OF_BOUNDS" => Some(ValidationError::OutOfBounds),
            "INVALID_PROTOCOL" => Some(ValidationError::InvalidProtocol),
            "MISSING_METHOD" => Some(ValidationError::MissingMethod),
            "MISSING_TOKEN" => Some(ValidationError::MissingToken),
            _ => None,
        }
    }
}

/// A subscriber failed to accept a delivered envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("subscriber disconnected")]
    Disconnected,

    #[error("subscriber rejected message: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Aether domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Aether domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;
