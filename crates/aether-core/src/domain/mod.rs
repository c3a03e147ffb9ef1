//! Domain models for Aether.
//!
//! Canonical definitions for the shapes that flow through the core:
//! - `IdentityHeader`: who published an envelope
//! - `Envelope`: the wire wrapper around every payload
//! - `Payload`: typed envelope arguments
//! - `Observation` / `PhysicsParams`: gate input and output

pub mod envelope;
pub mod error;
pub mod identity;
pub mod observation;
pub mod payload;
pub mod physics;
pub mod vibe;

pub use envelope::{method_for, Envelope, EnvelopeParams, METHOD_PREFIX, PROTOCOL_VERSION};
pub use error::{CoreError, DeliveryError, Result, ValidationError};
pub use identity::{IdentityHeader, IdentityStamper, Role, TOKEN_BYTES};
pub use observation::Observation;
pub use payload::{
    FallbackResponse, IntentKind, Payload, RenderIntent, RenderParams, VerifyRequest,
};
pub use physics::{PhysicsParams, ShaderParams};
pub use vibe::{energy_in_bounds, Mood, SatiVibe, VibeState};
