//! Outbound capability interfaces of the local dataplane and DHCP server.
//!
//! Requests carry validated values only. Backends add the time they spend
//! into the caller's [`ProgrammingTimes`] whether or not the call succeeds.

use crate::error::BackendError;
use async_trait::async_trait;
use ncagent_types::{
    Cidr, GatewayConfiguration, MacAddress, NeighborType, NetworkType, RoutingRule, TunnelId,
};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::{Duration, Instant};

/// Time spent in the backend for one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgrammingTimes {
    /// Switch/flow-table programming.
    pub dataplane: Duration,
    /// Host network configuration (interfaces, namespaces, routes).
    pub network_config: Duration,
}

impl ProgrammingTimes {
    pub fn add_dataplane_since(&mut self, started: Instant) {
        self.dataplane += started.elapsed();
    }

    pub fn add_network_config_since(&mut self, started: Instant) {
        self.network_config += started.elapsed();
    }
}

/// A port to plug into the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    pub port_id: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub network_type: NetworkType,
    pub tunnel_id: TunnelId,
    /// Host-side interface, `tap` plus a prefix of the port ID.
    pub interface_name: String,
    pub mac: MacAddress,
    pub ip: Ipv4Addr,
    /// Port address with the subnet's prefix length, e.g. `10.0.0.5/24`.
    pub cidr: Cidr,
    pub overlay_gateway: Option<GatewayConfiguration>,
}

/// A remote endpoint reachable through a tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRequest {
    pub neighbor_id: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub network_type: NetworkType,
    pub tunnel_id: TunnelId,
    pub neighbor_type: NeighborType,
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
    /// Address of the host the neighbor lives on.
    pub host_ip: Ipv4Addr,
    pub overlay_gateway: Option<GatewayConfiguration>,
}

/// Distributed-router MAC rewrite for a neighbor on another host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDvrRequest {
    pub neighbor_id: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub network_type: NetworkType,
    pub tunnel_id: TunnelId,
    pub host_dvr_mac: MacAddress,
    pub gateway_mac: MacAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSubnet {
    pub vpc_id: String,
    pub network_type: NetworkType,
    pub tunnel_id: TunnelId,
    pub cidr: Cidr,
    pub gateway_ip: Ipv4Addr,
    pub gateway_mac: MacAddress,
    pub routing_rules: Vec<RoutingRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterRequest {
    pub router_id: String,
    pub host_dvr_mac: MacAddress,
    /// Keyed by subnet ID.
    pub subnets: BTreeMap<String, RouterSubnet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpEntry {
    pub id: String,
    pub mac: MacAddress,
    pub ipv4: Ipv4Addr,
    pub ipv6: Option<Ipv6Addr>,
    pub hostname: String,
}

/// Programs ports, neighbors and routers into the local virtual switch.
#[async_trait]
pub trait DataplaneBackend: Send + Sync {
    async fn configure_port(&self, request: &PortRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError>;

    async fn delete_port(&self, request: &PortRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError>;

    async fn create_update_neighbor(
        &self,
        request: &NeighborRequest,
        times: &mut ProgrammingTimes,
    ) -> Result<(), BackendError>;

    async fn delete_neighbor(&self, request: &NeighborRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError>;

    async fn create_neighbor_host_dvr(
        &self,
        request: &HostDvrRequest,
        times: &mut ProgrammingTimes,
    ) -> Result<(), BackendError>;

    async fn create_router(&self, request: &RouterRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError>;

    async fn delete_router(&self, router_id: &str, times: &mut ProgrammingTimes) -> Result<(), BackendError>;
}

/// Maintains the local DHCP server's lease table.
#[async_trait]
pub trait DhcpBackend: Send + Sync {
    async fn add_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError>;

    async fn update_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError>;

    async fn delete_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError>;
}
