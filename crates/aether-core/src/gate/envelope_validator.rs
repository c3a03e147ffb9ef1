//! Pure predicate for outgoing envelopes.
//!
//! Works on the JSON form so it can check envelopes built by anyone, not
//! just this crate's [`Envelope`](crate::domain::Envelope).

use serde_json::Value;

use crate::domain::{energy_in_bounds, ValidationError, PROTOCOL_VERSION};

use super::Verdict;

/// Checks, in order: protocol version, method, identity token, and any
/// `energy_level` in the arguments (top-level or under `vibe_state`).
pub fn check_envelope(envelope: &Value) -> Result<(), ValidationError> {
    if envelope.get("protocol_version").and_then(Value::as_str) != Some(PROTOCOL_VERSION) {
        return Err(ValidationError::InvalidProtocol);
    }

    match envelope.get("method").and_then(Value::as_str) {
        Some(method) if !method.is_empty() => {}
        _ => return Err(ValidationError::MissingMethod),
    }

    let params = envelope.get("params");
    let token = params
        .and_then(|p| p.get("_identity"))
        .and_then(|id| id.get("token"))
        .and_then(Value::as_str);
    if token.map_or(true, str::is_empty) {
        return Err(ValidationError::MissingToken);
    }

    if let Some(arguments) = params.and_then(|p| p.get("arguments")) {
        for energy in energy_levels(arguments) {
            match energy.as_f64() {
                Some(level) if energy_in_bounds(level) => {}
                _ => return Err(ValidationError::OutOfBounds),
            }
        }
    }

    Ok(())
}

pub fn validate_envelope(envelope: &Value) -> Verdict {
    check_envelope(envelope).into()
}

/// Parse and validate a serialized envelope. Unparseable text fails as
/// `INVALID_PROTOCOL`.
pub fn validate_message(message: &str) -> Verdict {
    match serde_json::from_str::<Value>(message) {
        Ok(value) => validate_envelope(&value),
        Err(_) => Verdict::rejected(ValidationError::InvalidProtocol),
    }
}

fn energy_levels(arguments: &Value) -> impl Iterator<Item = &Value> {
    let nested = arguments
        .get("vibe_state")
        .and_then(|state| state.get("energy_level"));
    let top = arguments.get("energy_level");
    nested.into_iter().chain(top)
}
