//! Goal-state operation reply.

use crate::resources::{OperationType, ResourceType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caller-visible classification of one resource's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Success,
    /// Accepted by the dataplane, completion is asynchronous.
    Pending,
    InvalidArg,
    Failure,
}

impl OperationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationStatus::Success)
    }
}

/// One reply line item. Durations go over the wire as microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOperationStatus {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub operation_type: OperationType,
    pub operation_status: OperationStatus,
    #[serde(with = "micros")]
    pub dataplane_programming_time: Duration,
    #[serde(with = "micros")]
    pub network_configuration_time: Duration,
    #[serde(with = "micros")]
    pub state_elapse_time: Duration,
}

/// The reply to one goal-state message; always list-shaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalStateOperationReply {
    pub format_version: u32,
    pub operation_statuses: Vec<ResourceOperationStatus>,
    #[serde(with = "micros")]
    pub message_total_operation_time: Duration,
}

impl GoalStateOperationReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operation_statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operation_statuses.is_empty()
    }

    /// All status records for a resource ID, across kinds.
    pub fn statuses_for<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> impl Iterator<Item = &'a ResourceOperationStatus> + 'a {
        self.operation_statuses
            .iter()
            .filter(move |s| s.resource_id == resource_id)
    }

    pub fn count_status(&self, status: OperationStatus) -> usize {
        self.operation_statuses
            .iter()
            .filter(|s| s.operation_status == status)
            .count()
    }

    pub fn count_kind(&self, kind: ResourceType) -> usize {
        self.operation_statuses
            .iter()
            .filter(|s| s.resource_type == kind)
            .count()
    }
}

mod micros {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_micros()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn status(id: &str, kind: ResourceType, result: OperationStatus) -> ResourceOperationStatus {
        ResourceOperationStatus {
            resource_id: id.to_string(),
            resource_type: kind,
            operation_type: OperationType::Create,
            operation_status: result,
            dataplane_programming_time: Duration::from_micros(1500),
            network_configuration_time: Duration::from_millis(2),
            state_elapse_time: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_durations_serialize_as_micros() {
        let value = serde_json::to_value(status("p1", ResourceType::Port, OperationStatus::Pending))
            .unwrap();

        assert_eq!(
            value,
            json!({
                "resource_id": "p1",
                "resource_type": "PORT",
                "operation_type": "CREATE",
                "operation_status": "PENDING",
                "dataplane_programming_time": 1500,
                "network_configuration_time": 2000,
                "state_elapse_time": 4000,
            })
        );
    }

    #[test]
    fn test_reply_queries() {
        let reply = GoalStateOperationReply {
            operation_statuses: vec![
                status("p1", ResourceType::Port, OperationStatus::Success),
                status("p2", ResourceType::Port, OperationStatus::Failure),
                status("r1", ResourceType::Router, OperationStatus::Success),
            ],
            ..Default::default()
        };

        assert_eq!(reply.len(), 3);
        assert_eq!(reply.count_status(OperationStatus::Success), 2);
        assert_eq!(reply.count_kind(ResourceType::Port), 2);
        assert_eq!(reply.statuses_for("p2").count(), 1);
        assert_eq!(reply.statuses_for("missing").count(), 0);
    }

    #[test]
    fn test_reply_json_roundtrip_keeps_total_time() {
        let reply = GoalStateOperationReply {
            message_total_operation_time: Duration::from_micros(42),
            ..Default::default()
        };
        let text = serde_json::to_string(&reply).unwrap();
        assert!(text.contains("\"message_total_operation_time\":42"));
        let back: GoalStateOperationReply = serde_json::from_str(&text).unwrap();
        assert_eq!(back, reply);
    }
}
