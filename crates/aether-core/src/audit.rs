//! Injected audit trail.
//!
//! The bus and the retention ritual receive an [`AuditSink`] at construction
//! and record one [`AuditEvent`] per publish, delivery failure, dead letter
//! and sweep. Hosts use [`TracingAuditSink`]; tests use [`MemoryAuditSink`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single audited action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    /// Component that recorded the event (`bus`, `ritual`, ...).
    pub source: String,
    pub action: String,
    pub status: String,
    pub summary: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        source: impl Into<String>,
        action: impl Into<String>,
        status: impl Into<String>,
        summary: serde_json::Value,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source: source.into(),
            action: action.into(),
            status: status.into(),
            summary,
        }
    }
}

/// Destination for audit events. Recording never fails from the caller's
/// point of view.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes each event as one JSON `info!` line under the `aether::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => tracing::info!(target: "aether::audit", audit = %line),
            Err(e) => tracing::warn!(
                target: "aether::audit",
                action = %event.action,
                error = %e,
                "audit event not serializable"
            ),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events recorded for one action, in recording order.
    pub fn by_action(&self, action: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::new("bus", "Publish", "SUCCESS", json!({"n": 1})));
        sink.record(AuditEvent::new("bus", "DeadLetter", "ERROR", json!({})));
        sink.record(AuditEvent::new("bus", "Publish", "SUCCESS", json!({"n": 2})));

        assert_eq!(sink.len(), 3);
        let publishes = sink.by_action("Publish");
        assert_eq!(publishes.len(), 2);
        assert_eq!(publishes[1].summary["n"], 2);
    }

    #[test]
    fn event_ids_are_unique() {
        let a = AuditEvent::new("ritual", "Cleanse", "stable", json!({}));
        let b = AuditEvent::new("ritual", "Cleanse", "stable", json!({}));
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn tracing_sink_does_not_panic() {
        TracingAuditSink.record(AuditEvent::new("bus", "Publish", "SUCCESS", json!(null)));
    }
}
