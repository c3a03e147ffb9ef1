//! Observation producers and the single gate worker that consumes them.
//!
//! Producers (sensor simulators, voice front-ends) push [`Observation`]s into
//! a bounded channel; one worker drains it and runs each observation through
//! the [`IntentPipeline`] in arrival order. The bounded channel is the only
//! backpressure: a fast producer waits in `send` once the worker falls
//! behind.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::Observation;
use crate::pipeline::{IntentPipeline, PipelineOutcome};

/// Source of observations. `None` means the source is exhausted.
#[async_trait]
pub trait ObservationProducer: Send {
    fn name(&self) -> &str;

    async fn next(&mut self) -> Option<Observation>;
}

/// Producer backed by any iterator.
pub struct IterProducer<I> {
    name: String,
    items: I,
}

impl<I> IterProducer<I>
where
    I: Iterator<Item = Observation> + Send,
{
    pub fn new(name: impl Into<String>, items: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            name: name.into(),
            items: items.into_iter(),
        }
    }
}

#[async_trait]
impl<I> ObservationProducer for IterProducer<I>
where
    I: Iterator<Item = Observation> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(&mut self) -> Option<Observation> {
        self.items.next()
    }
}

/// Forward everything `producer` yields into `tx`. Stops when the producer
/// is exhausted or the receiver is gone, and yields the number forwarded.
pub fn spawn_producer<P>(mut producer: P, tx: mpsc::Sender<Observation>) -> JoinHandle<usize>
where
    P: ObservationProducer + 'static,
{
    tokio::spawn(async move {
        let mut forwarded = 0usize;
        while let Some(observation) = producer.next().await {
            if tx.send(observation).await.is_err() {
                debug!(producer = %producer.name(), "gate channel closed");
                break;
            }
            forwarded += 1;
        }
        info!(producer = %producer.name(), forwarded, "producer finished");
        forwarded
    })
}

/// Counts kept by the gate worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateWorkerStats {
    pub received: u64,
    pub committed: u64,
    pub negotiated: u64,
    pub halted: u64,
    pub errors: u64,
}

/// Drain `rx` through the pipeline, publishing clean results on `topic`.
/// Finishes with its stats once every sender is dropped.
pub fn spawn_gate_worker(
    pipeline: Arc<IntentPipeline>,
    topic: String,
    mut rx: mpsc::Receiver<Observation>,
) -> JoinHandle<GateWorkerStats> {
    tokio::spawn(async move {
        let mut stats = GateWorkerStats::default();
        while let Some(observation) = rx.recv().await {
            stats.received += 1;
            match pipeline.process(&observation, &topic).await {
                Ok(PipelineOutcome::Committed { .. }) => stats.committed += 1,
                Ok(PipelineOutcome::Negotiated { .. }) => stats.negotiated += 1,
                Ok(PipelineOutcome::Halted { .. }) => stats.halted += 1,
                Err(e) => {
                    stats.errors += 1;
                    error!(error = %e, "pipeline failed");
                }
            }
        }
        info!(
            received = stats.received,
            committed = stats.committed,
            negotiated = stats.negotiated,
            halted = stats.halted,
            errors = stats.errors,
            "gate worker drained"
        );
        stats
    })
}
