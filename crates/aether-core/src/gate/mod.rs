//! Intent gate.
//!
//! Three stages run in a fixed order against each observation:
//!
//! 1. [`Sentry`] checks structure and safety and may stop the chain.
//! 2. [`Alchemist`] maps a clean observation to [`PhysicsParams`](crate::domain::PhysicsParams).
//! 3. [`Diplomat`] turns a rejection into a user-facing fallback.
//!
//! [`check_envelope`] is a separate predicate for outgoing envelopes.
//! Rejections never escape as errors; callers get a [`Verdict`].

pub mod alchemist;
pub mod diplomat;
pub mod envelope_validator;
pub mod sentry;

use serde::Serialize;

use crate::domain::ValidationError;

pub use alchemist::{palette, Alchemist, DEFAULT_RITUAL_TAG};
pub use diplomat::{Diplomat, DIPLOMACY_ACTION, FALLBACK_MESSAGE, FALLBACK_SHADER};
pub use envelope_validator::{check_envelope, validate_envelope, validate_message};
pub use sentry::{Sentry, PARAJIKA_THRESHOLD};

/// Reason code for a passing verdict.
pub const CLEAN: &str = "CLEAN";

/// Pass/fail decision plus a stable reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub reason: &'static str,
}

impl Verdict {
    pub fn clean() -> Self {
        Self {
            passed: true,
            reason: CLEAN,
        }
    }

    pub fn rejected(error: ValidationError) -> Self {
        Self {
            passed: false,
            reason: error.code(),
        }
    }

    /// The rejection behind this verdict, if any.
    pub fn error(&self) -> Option<ValidationError> {
        if self.passed {
            None
        } else {
            ValidationError::from_code(self.reason)
        }
    }
}

impl From<Result<(), ValidationError>> for Verdict {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Verdict::clean(),
            Err(e) => Verdict::rejected(e),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.passed, self.reason)
    }
}
