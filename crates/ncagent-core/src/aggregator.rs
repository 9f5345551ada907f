//! Concurrency-safe sink for per-resource status records.

use crate::task::{Outcome, ReturnCode};
use ncagent_types::{
    GoalStateOperationReply, OperationStatus, OperationType, ResourceOperationStatus, ResourceType,
};
use parking_lot::Mutex;
use std::time::Duration;

/// Owns the reply while a batch is in flight.
///
/// Worker tasks call [`ReplyAggregator::record`] concurrently; the lock is
/// held only for the append.
#[derive(Debug, Default)]
pub struct ReplyAggregator {
    reply: Mutex<GoalStateOperationReply>,
}

impl ReplyAggregator {
    pub fn new(reply: GoalStateOperationReply) -> Self {
        ReplyAggregator {
            reply: Mutex::new(reply),
        }
    }

    /// Maps a handler return code to the caller-visible status.
    ///
    /// `IN_PROGRESS` is only PENDING for a port CREATE; for anything else it
    /// is a failure like every other unrecognised code.
    pub fn classify(kind: ResourceType, operation: OperationType, code: ReturnCode) -> OperationStatus {
        if code.is_success() {
            OperationStatus::Success
        } else if code.is_in_progress()
            && kind == ResourceType::Port
            && operation == OperationType::Create
        {
            OperationStatus::Pending
        } else if code.is_invalid_argument() {
            OperationStatus::InvalidArg
        } else {
            OperationStatus::Failure
        }
    }

    /// Appends exactly one status record and returns its classification.
    pub fn record(
        &self,
        resource_id: &str,
        kind: ResourceType,
        operation: OperationType,
        outcome: &Outcome,
        total_time: Duration,
    ) -> OperationStatus {
        let status = Self::classify(kind, operation, outcome.code);
        let entry = ResourceOperationStatus {
            resource_id: resource_id.to_string(),
            resource_type: kind,
            operation_type: operation,
            operation_status: status,
            dataplane_programming_time: outcome.dataplane_time,
            network_configuration_time: outcome.network_config_time,
            state_elapse_time: total_time,
        };

        self.reply.lock().operation_statuses.push(entry);
        status
    }

    pub fn len(&self) -> usize {
        self.reply.lock().operation_statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the reply as it stands.
    pub fn snapshot(&self) -> GoalStateOperationReply {
        self.reply.lock().clone()
    }

    pub fn into_reply(self) -> GoalStateOperationReply {
        self.reply.into_inner()
    }
}
