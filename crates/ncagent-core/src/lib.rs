//! Goal-state reconciliation engine for the ncagent host agent.
//!
//! A goal state is reconciled kind by kind:
//!
//! ```text
//! GoalStateBatch ─► ReconciliationEngine ─► DispatchScheduler (per kind, bounded)
//!                                                  │
//!                                                  ▼
//!                                  ResourceHandler::update_*_state ─► Resolver
//!                                                  │
//!                                                  ▼
//!                                           ReplyAggregator ─► GoalStateOperationReply
//! ```
//!
//! [`GoalStateProgrammer`] is the production handler; it validates each
//! resource and drives a [`DataplaneBackend`] and a [`DhcpBackend`].

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod handler;
pub mod programmer;
pub mod resolver;
pub mod scheduler;
pub mod task;

pub use aggregator::ReplyAggregator;
pub use engine::{EngineStats, ReconciliationEngine};
pub use error::{BackendError, ProgrammingError, ProgrammingResult, ResolveError};
pub use handler::{Dispatchable, ResourceHandler, WorkItem};
pub use programmer::{
    port_interface_name, DataplaneBackend, DhcpBackend, DhcpEntry, GoalStateProgrammer,
    HostDvrRequest, NeighborRequest, PortRequest, PortUpdateAction, ProgrammingTimes,
    RouterRequest, RouterSubnet,
};
pub use resolver::{Resolver, SubnetInfo};
pub use scheduler::{
    DispatchScheduler, DispatchSummary, SchedulerConfig, DEFAULT_CONCURRENCY_CEILING,
    DEFAULT_HANDLER_TIMEOUT,
};
pub use task::{Outcome, ReturnCode};
