//! Structured observability hooks for Aether lifecycle events.
//!
//! Every helper emits one event carrying an `event = "<domain>.<action>"`
//! field so log pipelines can filter on it. For JSON output start the host
//! with `--json`.

use tracing::{info, warn};

/// Emit event: an envelope was fanned out.
///
/// ```ignore
/// emit_published("render_light", 3, 2, 1);
/// // logs: event=bus.published topic=render_light attempted=3 succeeded=2 failed=1
/// ```
pub fn emit_published(topic: &str, attempted: usize, succeeded: usize, failed: usize) {
    info!(
        event = "bus.published",
        topic = %topic,
        attempted = attempted,
        succeeded = succeeded,
        failed = failed,
    );
}

/// Emit event: a payload failed to serialize and was dead-lettered.
pub fn emit_dead_letter(topic: &str, reason: &str) {
    warn!(event = "bus.dead_letter", topic = %topic, reason = %reason);
}

/// Emit event: one subscriber failed to accept a delivery.
pub fn emit_delivery_failed(topic: &str, subscriber: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "bus.delivery_failed",
        topic = %topic,
        subscriber = %subscriber,
        error = %error,
    );
}

/// Emit event: a gem was written to the vault.
pub fn emit_gem_committed(gem_id: &str, ritual_tag: &str) {
    info!(event = "vault.gem_committed", gem_id = %gem_id, ritual_tag = %ritual_tag);
}

/// Emit event: a retention sweep finished.
pub fn emit_ritual_completed(status: &str, scanned: usize, deleted: usize) {
    info!(
        event = "ritual.completed",
        status = %status,
        scanned = scanned,
        deleted = deleted,
    );
}

/// Emit event: the gate refused an observation (PARAJIKA is logged separately
/// at error level by the Sentry).
pub fn emit_gate_rejected(reason: &str) {
    warn!(event = "gate.rejected", reason = %reason);
}
