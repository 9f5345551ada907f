//! Reconciliation engine entry point.

use crate::aggregator::ReplyAggregator;
use crate::handler::{Dispatchable, ResourceHandler};
use crate::scheduler::{DispatchScheduler, DispatchSummary, SchedulerConfig};
use crate::task::ReturnCode;
use ncagent_types::{
    DhcpConfiguration, GoalStateBatch, GoalStateOperationReply, NeighborConfiguration,
    PortConfiguration, RouterConfiguration, SubnetConfiguration, VpcConfiguration,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Totals from the most recent `update_goal_state` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub kinds: Vec<DispatchSummary>,
    pub resources: usize,
    pub failed: usize,
    pub dataplane_time: Duration,
    pub network_config_time: Duration,
    pub total_time: Duration,
}

impl EngineStats {
    fn add(&mut self, summary: DispatchSummary) {
        self.resources += summary.dispatched;
        self.failed += summary.failed;
        self.dataplane_time += summary.dataplane_time;
        self.network_config_time += summary.network_config_time;
        self.kinds.push(summary);
    }
}

/// Applies goal-state batches through a [`ResourceHandler`].
///
/// Kinds run one after another in a fixed order: VPC and subnet reference
/// entries first, then routers, ports, neighbors and DHCP entries. Security
/// group and gateway entries are reference data only and produce no status.
///
/// The VPC and subnet passes run for both the listed and the keyed shape, so
/// the same batch gives the same reply either way. A VPC entry with any
/// operation other than INFO therefore makes the overall code non-zero
/// (`NOT_SUPPORTED`), where the listed-only subnet pass of older agents
/// reported nothing for it.
pub struct ReconciliationEngine<H> {
    scheduler: DispatchScheduler<H>,
    last_stats: Mutex<EngineStats>,
}

impl<H: ResourceHandler + 'static> ReconciliationEngine<H> {
    pub fn new(handler: Arc<H>, config: SchedulerConfig) -> Self {
        ReconciliationEngine {
            scheduler: DispatchScheduler::new(handler, config),
            last_stats: Mutex::new(EngineStats::default()),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    pub fn handler(&self) -> &Arc<H> {
        self.scheduler.handler()
    }

    pub fn last_stats(&self) -> EngineStats {
        self.last_stats.lock().clone()
    }

    /// Reconciles one batch, appending one status per handled resource to
    /// `reply`.
    ///
    /// Returns the last non-zero kind-level code, or SUCCESS. Per-resource
    /// detail is only in the reply.
    pub async fn update_goal_state(
        &self,
        batch: Arc<GoalStateBatch>,
        reply: &mut GoalStateOperationReply,
    ) -> ReturnCode {
        let started = Instant::now();
        reply.format_version = batch.format_version();
        let aggregator = Arc::new(ReplyAggregator::new(std::mem::take(reply)));

        info!(
            shape = ?batch.shape(),
            format_version = batch.format_version(),
            resources = batch.resource_count(),
            "Applying goal state"
        );

        let mut stats = EngineStats::default();
        let mut overall = ReturnCode::SUCCESS;

        overall = self.run::<VpcConfiguration>(&batch, &aggregator, &mut stats, overall).await;
        overall = self.run::<SubnetConfiguration>(&batch, &aggregator, &mut stats, overall).await;
        overall = self.run::<RouterConfiguration>(&batch, &aggregator, &mut stats, overall).await;
        overall = self.run::<PortConfiguration>(&batch, &aggregator, &mut stats, overall).await;
        overall = self.run::<NeighborConfiguration>(&batch, &aggregator, &mut stats, overall).await;
        overall = self.run::<DhcpConfiguration>(&batch, &aggregator, &mut stats, overall).await;

        // Every task has been joined, so this is the only reference left.
        *reply = match Arc::try_unwrap(aggregator) {
            Ok(aggregator) => aggregator.into_reply(),
            Err(shared) => shared.snapshot(),
        };

        let elapsed = started.elapsed();
        reply.message_total_operation_time = elapsed;
        stats.total_time = elapsed;

        if overall.is_success() {
            info!(
                statuses = reply.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "Goal state applied"
            );
        } else if overall.is_in_progress() {
            info!(
                statuses = reply.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "Goal state applied, programming pending"
            );
        } else {
            error!(
                statuses = reply.len(),
                failed = stats.failed,
                code = %overall,
                "Goal state applied with failures"
            );
        }

        *self.last_stats.lock() = stats;
        overall
    }

    async fn run<C: Dispatchable>(
        &self,
        batch: &Arc<GoalStateBatch>,
        aggregator: &Arc<ReplyAggregator>,
        stats: &mut EngineStats,
        overall: ReturnCode,
    ) -> ReturnCode {
        let summary = self.scheduler.dispatch::<C>(batch, aggregator).await;
        let code = summary.code;
        stats.add(summary);

        if code.is_success() {
            overall
        } else {
            code
        }
    }
}
