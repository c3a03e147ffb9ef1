//! Envelope bus: validated publish with sequential fan-out.
//!
//! `publish` wraps a payload in an [`Envelope`], serializes it once, and hands
//! the same text to every subscriber in registration order, awaiting each
//! delivery before starting the next. A failing subscriber is logged and
//! counted but stays subscribed; callers unsubscribe explicitly when they
//! detect a disconnect. Payloads that fail to serialize go to the
//! [`DeadLetterQueue`] and reach no subscriber.
//!
//! The subscriber list is snapshotted at the start of each publish, so
//! `subscribe`/`unsubscribe` may run concurrently with an in-flight publish.
//! A subscriber removed after the snapshot is skipped.

pub mod dead_letter;

use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::audit::{AuditEvent, AuditSink};
use crate::domain::{DeliveryError, Envelope, IdentityHeader};
use crate::metrics::BusMetrics;
use crate::obs;

pub use dead_letter::{DeadLetterEntry, DeadLetterQueue};

const AUDIT_SOURCE: &str = "bus";

/// Handle returned by [`EnvelopeBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receives serialized envelopes.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    async fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

type DeliverFn = dyn Fn(String) -> BoxFuture<'static, Result<(), DeliveryError>> + Send + Sync;

/// Adapts an async closure into a [`Subscriber`].
pub struct FnSubscriber {
    name: String,
    deliver: Box<DeliverFn>,
}

impl FnSubscriber {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            deliver: Box::new(move |message| f(message).boxed()),
        }
    }
}

impl Debug for FnSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSubscriber")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Subscriber for FnSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        (self.deliver)(message.to_string()).await
    }
}

/// One failed delivery inside a publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub subscription: u64,
    pub subscriber: String,
    pub error: String,
}

/// Per-publish delivery report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub topic: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DeliveryFailure>,
}

impl PublishReport {
    fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }
}

/// Outcome of [`EnvelopeBus::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    /// Serialized and fanned out; individual deliveries may still have failed.
    Delivered(PublishReport),
    /// Serialization failed; no subscriber was invoked.
    DeadLettered { reason: String },
}

impl PublishResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishResult::Delivered(_))
    }

    pub fn report(&self) -> Option<&PublishReport> {
        match self {
            PublishResult::Delivered(report) => Some(report),
            PublishResult::DeadLettered { .. } => None,
        }
    }
}

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    subscriber: Arc<dyn Subscriber>,
}

/// Topic-agnostic envelope fan-out.
pub struct EnvelopeBus {
    subscribers: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
    dead_letters: DeadLetterQueue,
    metrics: BusMetrics,
    audit: Arc<dyn AuditSink>,
}

impl EnvelopeBus {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            dead_letters: DeadLetterQueue::new(),
            metrics: BusMetrics::new(),
            audit,
        }
    }

    /// Register a subscriber. The same subscriber may be registered twice and
    /// will then receive each envelope twice.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(subscription = %id, subscriber = %subscriber.name(), "subscribed");
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Registration { id, subscriber });
        id
    }

    /// Register an async closure as a subscriber.
    pub fn subscribe_fn<F, Fut>(&self, name: impl Into<String>, f: F) -> SubscriptionId
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber::new(name, f)))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|r| r.id != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!(subscription = %id, "unsubscribed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn dead_letters(&self) -> &DeadLetterQueue {
        &self.dead_letters
    }

    pub fn metrics(&self) -> &BusMetrics {
        &self.metrics
    }

    /// Wrap, serialize, and deliver `payload` to every current subscriber.
    pub async fn publish<P>(
        &self,
        topic: &str,
        payload: &P,
        identity: &IdentityHeader,
    ) -> PublishResult
    where
        P: Serialize + Debug + ?Sized,
    {
        let envelope = Envelope::new(topic, payload, identity.clone());
        let message = match serde_json::to_string(&envelope) {
            Ok(message) => message,
            Err(e) => return self.dead_letter(topic, format!("{payload:?}"), &e),
        };
        self.metrics.inc_published();

        let snapshot = self.snapshot();
        let mut report = PublishReport::new(topic);

        for registration in snapshot {
            if !self.is_registered(registration.id) {
                debug!(subscription = %registration.id, "skipping subscriber removed mid-publish");
                continue;
            }
            report.attempted += 1;
            match registration.subscriber.deliver(&message).await {
                Ok(()) => {
                    report.succeeded += 1;
                    self.metrics.inc_delivered();
                }
                Err(e) => {
                    report.failed += 1;
                    self.metrics.inc_delivery_failures();
                    let name = registration.subscriber.name().to_string();
                    obs::emit_delivery_failed(topic, &name, &e);
                    self.audit.record(AuditEvent::new(
                        AUDIT_SOURCE,
                        "Publish",
                        "SubscriberFailed",
                        json!({
                            "topic": topic,
                            "subscription": registration.id.0,
                            "subscriber": name,
                            "error": e.to_string(),
                        }),
                    ));
                    report.failures.push(DeliveryFailure {
                        subscription: registration.id.0,
                        subscriber: name,
                        error: e.to_string(),
                    });
                }
            }
        }

        obs::emit_published(topic, report.attempted, report.succeeded, report.failed);
        let summary = serde_json::to_value(&report).unwrap_or_else(|_| json!({ "topic": topic }));
        self.audit
            .record(AuditEvent::new(AUDIT_SOURCE, "Publish", "Success", summary));
        PublishResult::Delivered(report)
    }

    fn dead_letter(
        &self,
        topic: &str,
        payload: String,
        error: &serde_json::Error,
    ) -> PublishResult {
        let reason = format!("serialization error: {error}");
        self.dead_letters.push(payload, reason.clone());
        self.metrics.inc_dead_lettered();
        obs::emit_dead_letter(topic, &reason);
        self.audit.record(AuditEvent::new(
            AUDIT_SOURCE,
            "DeadLetter",
            "Error",
            json!({ "topic": topic, "reason": reason }),
        ));
        PublishResult::DeadLettered { reason }
    }

    fn snapshot(&self) -> Vec<Registration> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn is_registered(&self, id: SubscriptionId) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .any(|r| r.id == id)
    }
}

impl Debug for EnvelopeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeBus")
            .field("subscribers", &self.subscriber_count())
            .field("dead_letters", &self.dead_letters.len())
            .finish_non_exhaustive()
    }
}
