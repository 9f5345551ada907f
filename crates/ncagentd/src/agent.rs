//! Goal-state intake and reply emission around the reconciliation engine.

use crate::config::{AgentConfig, DataplaneMode};
use crate::dry_run::DryRunBackend;
use crate::error::Result;
use ncagent_core::{GoalStateProgrammer, ReconciliationEngine, ReturnCode};
use ncagent_types::{GoalStateBatch, GoalStateOperationReply};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

pub type DryRunProgrammer = GoalStateProgrammer<DryRunBackend, DryRunBackend>;

/// Path that selects stdin for goal-state input.
pub const STDIN_PATH: &str = "-";

pub struct Agent {
    engine: ReconciliationEngine<DryRunProgrammer>,
}

impl Agent {
    pub fn from_config(config: &AgentConfig) -> Self {
        let programmer = match config.dataplane.mode {
            DataplaneMode::DryRun => {
                let backend = DryRunBackend::new(&config.dataplane.bridge, config.dataplane.dhcp_enabled);
                GoalStateProgrammer::new(backend.clone(), backend)
            }
        };

        info!(
            mode = ?config.dataplane.mode,
            bridge = %config.dataplane.bridge,
            concurrency_ceiling = config.engine.concurrency_ceiling,
            handler_timeout = ?config.handler_timeout(),
            "Agent configured"
        );

        Agent {
            engine: ReconciliationEngine::new(Arc::new(programmer), config.scheduler_config()),
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine<DryRunProgrammer> {
        &self.engine
    }

    /// Applies one goal state and returns the overall code and the reply.
    pub async fn apply(&self, batch: GoalStateBatch) -> (ReturnCode, GoalStateOperationReply) {
        let mut reply = GoalStateOperationReply::new();
        let code = self.engine.update_goal_state(Arc::new(batch), &mut reply).await;
        (code, reply)
    }
}

/// Decodes a goal state in either wire shape.
pub fn parse_goal_state(text: &str) -> Result<GoalStateBatch> {
    Ok(GoalStateBatch::from_json(text)?)
}

/// Reads a goal state from `path`, or from stdin when `path` is `-`.
pub fn read_goal_state(path: &Path) -> Result<GoalStateBatch> {
    let text = if path.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(path)?
    };
    parse_goal_state(&text)
}

/// Writes the reply as pretty JSON to `out`, or to stdout.
pub fn write_reply(reply: &GoalStateOperationReply, out: Option<&Path>) -> Result<()> {
    let mut text = serde_json::to_string_pretty(reply)?;
    text.push('\n');

    match out {
        Some(path) => fs::write(path, text)?,
        None => io::stdout().lock().write_all(text.as_bytes())?,
    }
    Ok(())
}

/// Process exit status for an overall reconciliation code.
pub fn exit_code_for(code: ReturnCode) -> ExitCode {
    if code.is_success() {
        ExitCode::SUCCESS
    } else if code.is_in_progress() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncagent_types::{BatchShape, OperationStatus};
    use pretty_assertions::assert_eq;

    const GOAL_STATE: &str = r#"{
        "format_version": 1,
        "subnet_states": [
            {"operation_type": "INFO",
             "configuration": {"id": "s1", "vpc_id": "v1", "tunnel_id": 20, "cidr": "10.0.0.0/24", "revision_number": 1}}
        ],
        "port_states": [
            {"operation_type": "CREATE",
             "configuration": {"id": "p1", "vpc_id": "v1", "mac_address": "fa:16:3e:00:00:01", "revision_number": 1,
                               "fixed_ips": [{"subnet_id": "s1", "ip_address": "10.0.0.5"}]}},
            {"operation_type": "CREATE",
             "configuration": {"id": "p2", "vpc_id": "v1", "mac_address": "fa:16:3e:00:00:02", "revision_number": 1,
                               "fixed_ips": [{"subnet_id": "missing", "ip_address": "10.0.0.6"}]}}
        ]
    }"#;

    #[tokio::test]
    async fn test_apply_dry_run() {
        let agent = Agent::from_config(&AgentConfig::default());
        let batch = parse_goal_state(GOAL_STATE).unwrap();
        assert_eq!(batch.shape(), BatchShape::Listed);

        let (code, reply) = agent.apply(batch).await;

        assert_eq!(code, ReturnCode::FAILURE);
        assert_eq!(reply.len(), 3);
        let status = |id: &str| reply.statuses_for(id).next().unwrap().operation_status;
        assert_eq!(status("s1"), OperationStatus::Success);
        assert_eq!(status("p1"), OperationStatus::Success);
        assert_eq!(status("p2"), OperationStatus::Failure);
    }

    #[test]
    fn test_read_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("goal_state.json");
        let output = dir.path().join("reply.json");
        fs::write(&input, GOAL_STATE).unwrap();

        let batch = read_goal_state(&input).unwrap();
        assert_eq!(batch.resource_count(), 3);

        let reply = GoalStateOperationReply::new();
        write_reply(&reply, Some(&output)).unwrap();
        let written: GoalStateOperationReply =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, reply);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_goal_state("{\"port_states\": 5}").is_err());
        assert!(parse_goal_state("not json").is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(ReturnCode::SUCCESS), ExitCode::SUCCESS);
        assert_eq!(exit_code_for(ReturnCode::IN_PROGRESS), ExitCode::from(2));
        assert_eq!(exit_code_for(ReturnCode::INVALID_ARGUMENT), ExitCode::FAILURE);
    }
}
