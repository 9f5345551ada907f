//! Bounded fan-out of one resource kind to the handler.
//!
//! Items are spawned in sub-batches of at most `concurrency_ceiling` tasks.
//! Each sub-batch is fully drained before the next one starts, so the number
//! of in-flight handler calls for a kind never exceeds the ceiling.

use crate::aggregator::ReplyAggregator;
use crate::handler::{Dispatchable, ResourceHandler, WorkItem};
use crate::task::{Outcome, ReturnCode};
use futures::FutureExt;
use ncagent_types::{GoalStateBatch, OperationType, ResourceType};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Default cap on concurrently running handler calls per kind.
pub const DEFAULT_CONCURRENCY_CEILING: usize = 10_000;

/// Default per-call handler timeout.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub concurrency_ceiling: usize,
    /// `None` waits for a handler indefinitely.
    pub handler_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_ceiling: DEFAULT_CONCURRENCY_CEILING,
            handler_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
        }
    }
}

impl SchedulerConfig {
    pub fn with_concurrency_ceiling(mut self, ceiling: usize) -> Self {
        self.concurrency_ceiling = ceiling;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }
}

/// Result of dispatching one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub kind: ResourceType,
    /// Last non-zero code in dispatch order, or SUCCESS.
    pub code: ReturnCode,
    pub dispatched: usize,
    pub failed: usize,
    pub dataplane_time: Duration,
    pub network_config_time: Duration,
}

impl DispatchSummary {
    fn new(kind: ResourceType) -> Self {
        DispatchSummary {
            kind,
            code: ReturnCode::SUCCESS,
            dispatched: 0,
            failed: 0,
            dataplane_time: Duration::ZERO,
            network_config_time: Duration::ZERO,
        }
    }

    fn fold(&mut self, outcome: &Outcome) {
        self.dispatched += 1;
        self.dataplane_time += outcome.dataplane_time;
        self.network_config_time += outcome.network_config_time;
        if !outcome.code.is_success() {
            self.failed += 1;
            self.code = outcome.code;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Dispatching,
    Draining,
    Done,
}

pub struct DispatchScheduler<H> {
    handler: Arc<H>,
    config: SchedulerConfig,
}

impl<H: ResourceHandler + 'static> DispatchScheduler<H> {
    pub fn new(handler: Arc<H>, config: SchedulerConfig) -> Self {
        DispatchScheduler { handler, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    /// Runs every resource of kind `C` through the handler and records one
    /// status per resource into `aggregator`.
    pub async fn dispatch<C: Dispatchable>(
        &self,
        batch: &Arc<GoalStateBatch>,
        aggregator: &Arc<ReplyAggregator>,
    ) -> DispatchSummary {
        let kind = C::KIND;
        let mut summary = DispatchSummary::new(kind);
        let collection = batch.collection::<C>();
        if collection.is_empty() {
            return summary;
        }

        let ceiling = self.config.concurrency_ceiling.max(1);
        let mut items = collection.iter();
        let mut remaining = collection.len();
        let mut phase = Phase::Idle;
        let mut sub_batch = 0usize;

        while remaining > 0 {
            transition(kind, &mut phase, Phase::Dispatching, remaining);

            let mut join_set = JoinSet::new();
            let mut pending: Vec<(String, OperationType)> = Vec::with_capacity(remaining.min(ceiling));

            for (id, state) in items.by_ref().take(ceiling) {
                let item = C::work_item(state.clone());
                pending.push((id.to_string(), item.operation()));
                join_set.spawn(run_item(
                    Arc::clone(&self.handler),
                    Arc::clone(batch),
                    Arc::clone(aggregator),
                    id.to_string(),
                    item,
                    pending.len() - 1,
                    self.config.handler_timeout,
                ));
            }

            if pending.is_empty() {
                break;
            }
            remaining = remaining.saturating_sub(pending.len());

            transition(kind, &mut phase, Phase::Draining, pending.len());

            let mut outcomes: Vec<Option<Outcome>> = vec![None; pending.len()];
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((slot, outcome)) => outcomes[slot] = Some(outcome),
                    Err(e) => error!(%kind, sub_batch, "Dispatch task did not complete: {}", e),
                }
            }

            // A task that never returned also never recorded its status.
            for (slot, outcome) in outcomes.into_iter().enumerate() {
                let outcome = match outcome {
                    Some(outcome) => outcome,
                    None => {
                        let (id, operation) = &pending[slot];
                        let outcome = Outcome::from_code(ReturnCode::FAULT);
                        aggregator.record(id, kind, *operation, &outcome, Duration::ZERO);
                        outcome
                    }
                };
                summary.fold(&outcome);
            }

            sub_batch += 1;
        }

        transition(kind, &mut phase, Phase::Done, summary.dispatched);
        debug!(
            %kind,
            dispatched = summary.dispatched,
            failed = summary.failed,
            sub_batches = sub_batch,
            code = %summary.code,
            "Dispatch finished"
        );
        summary
    }
}

fn transition(kind: ResourceType, phase: &mut Phase, next: Phase, items: usize) {
    debug!(%kind, from = ?*phase, to = ?next, items, "Dispatch state change");
    *phase = next;
}

async fn run_item<H: ResourceHandler + 'static>(
    handler: Arc<H>,
    batch: Arc<GoalStateBatch>,
    aggregator: Arc<ReplyAggregator>,
    id: String,
    item: WorkItem,
    slot: usize,
    timeout: Option<Duration>,
) -> (usize, Outcome) {
    let started = Instant::now();
    let kind = item.kind();
    let operation = item.operation();

    let call = AssertUnwindSafe(item.invoke(handler.as_ref(), &id, &batch)).catch_unwind();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%kind, %id, %operation, ?limit, "Handler timed out");
                Ok(Outcome::from_code(ReturnCode::TIMED_OUT))
            }
        },
        None => call.await,
    };

    let outcome = result.unwrap_or_else(|_| {
        error!(%kind, %id, %operation, "Handler panicked");
        Outcome::from_code(ReturnCode::FAULT)
    });

    aggregator.record(&id, kind, operation, &outcome, started.elapsed());
    (slot, outcome)
}
