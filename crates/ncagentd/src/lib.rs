//! ncagentd - per-host network control-plane agent
//!
//! Reads a goal-state message, reconciles it through the
//! [`ncagent_core::ReconciliationEngine`] and emits the operation reply.

pub mod agent;
pub mod config;
pub mod dry_run;
pub mod error;
pub mod logging;

pub use agent::{exit_code_for, parse_goal_state, read_goal_state, write_reply, Agent, DryRunProgrammer};
pub use config::{AgentConfig, DataplaneConfig, DataplaneMode, EngineConfig, LoggingConfig, DEFAULT_CONFIG_PATH};
pub use dry_run::DryRunBackend;
pub use error::{AgentError, Result};
pub use logging::init_logging;
