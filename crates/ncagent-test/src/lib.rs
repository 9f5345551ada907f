//! Integration test infrastructure for the ncagent reconciliation engine
//!
//! Provides:
//! - Goal-state builders and per-kind fixtures
//! - A recording dataplane/DHCP backend with scripted failures
//! - A counting resource handler for scheduler tests
//! - Reply verification helpers

pub mod backends;
pub mod fixtures;
mod verification;

pub use backends::{BackendCall, CountingHandler, RecordingBackend};
pub use fixtures::GoalStateBuilder;
pub use verification::*;
