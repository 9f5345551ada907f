//! Common types for the ncagent per-host network control-plane agent.
//!
//! This crate provides the value types shared by the reconciliation engine,
//! the agent process and the test harness:
//!
//! - [`MacAddress`], [`Cidr`], [`TunnelId`]: validated network primitives
//! - [`GoalStateBatch`]: one goal-state message, in either wire shape
//! - [`Collection`]: the uniform `(id, state)` view over one resource kind
//! - [`GoalStateOperationReply`]: the per-resource status reply
//!
//! Resource payloads keep addresses as raw strings. Validation happens at the
//! handler boundary so that a malformed address is reported as an invalid
//! argument for that one resource instead of rejecting the whole message.

mod goal_state;
mod ip;
mod mac;
mod reply;
mod resources;
mod tunnel;

pub use goal_state::{BatchShape, Collection, CollectionIter, GoalState, GoalStateBatch, GoalStateV2};
pub use ip::{parse_ipv4, Cidr};
pub use mac::MacAddress;
pub use reply::{GoalStateOperationReply, OperationStatus, ResourceOperationStatus};
pub use resources::{
    DhcpConfiguration, DhcpState, FixedIp, GatewayConfiguration, GatewayDestination, GatewayState,
    GatewayType, HostDvrMac, HostInfo, NeighborConfiguration, NeighborState, NeighborType,
    NetworkType, OperationType, PortConfiguration, PortState, ResourceConfig, ResourceState,
    ResourceType, RouterConfiguration, RouterState, RoutingRule, SecurityGroupConfiguration,
    SecurityGroupRule, SecurityGroupState, SubnetConfiguration, SubnetGateway, SubnetRoutingTable,
    SubnetState, VpcConfiguration, VpcState,
};
pub use tunnel::TunnelId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid CIDR format: {0}")]
    InvalidCidr(String),

    #[error("invalid tunnel id: {0} (must be 1-16777215)")]
    InvalidTunnelId(u32),
}
