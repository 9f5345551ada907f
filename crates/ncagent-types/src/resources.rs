//! Resource state records and their per-kind configuration payloads.
//!
//! Every payload derives `Default` and uses `#[serde(default)]`: in the
//! keyed-map batch shape the resource ID is the map key, so the payload may
//! omit it, and controllers routinely leave out fields that do not apply.

use crate::goal_state::{Collection, GoalStateBatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The action a resource state record asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    #[default]
    Create,
    Update,
    Get,
    Delete,
    /// Reference-only entry consulted by other resources in the same batch.
    Info,
    Finalize,
    NeighborCreateUpdate,
    NeighborDelete,
}

impl OperationType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "CREATE",
            OperationType::Update => "UPDATE",
            OperationType::Get => "GET",
            OperationType::Delete => "DELETE",
            OperationType::Info => "INFO",
            OperationType::Finalize => "FINALIZE",
            OperationType::NeighborCreateUpdate => "NEIGHBOR_CREATE_UPDATE",
            OperationType::NeighborDelete => "NEIGHBOR_DELETE",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource kinds a goal state can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Vpc,
    Subnet,
    Port,
    Neighbor,
    SecurityGroup,
    Dhcp,
    Router,
    Gateway,
}

impl ResourceType {
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Vpc,
        ResourceType::Subnet,
        ResourceType::Port,
        ResourceType::Neighbor,
        ResourceType::SecurityGroup,
        ResourceType::Dhcp,
        ResourceType::Router,
        ResourceType::Gateway,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Vpc => "VPC",
            ResourceType::Subnet => "SUBNET",
            ResourceType::Port => "PORT",
            ResourceType::Neighbor => "NEIGHBOR",
            ResourceType::SecurityGroup => "SECURITY_GROUP",
            ResourceType::Dhcp => "DHCP",
            ResourceType::Router => "ROUTER",
            ResourceType::Gateway => "GATEWAY",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    #[default]
    Vxlan,
    Vlan,
    Gre,
    Geneve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NeighborType {
    #[default]
    L2,
    L3,
    HostDvr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayType {
    #[default]
    Overlay,
    Nat,
    Transit,
}

/// One resource's desired state: an operation plus its payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceState<C> {
    #[serde(alias = "operation")]
    pub operation_type: OperationType,
    #[serde(alias = "config")]
    pub configuration: C,
}

impl<C> ResourceState<C> {
    pub fn new(operation_type: OperationType, configuration: C) -> Self {
        ResourceState {
            operation_type,
            configuration,
        }
    }
}

/// Behaviour shared by every configuration payload.
pub trait ResourceConfig: Clone + Send + Sync + 'static {
    const KIND: ResourceType;

    fn id(&self) -> &str;

    fn revision_number(&self) -> u32;

    /// Borrows this kind's collection out of a batch.
    fn collection(batch: &GoalStateBatch) -> Collection<'_, Self>;
}

macro_rules! resource_config {
    ($config:ty, $kind:ident, $accessor:ident) => {
        impl ResourceConfig for $config {
            const KIND: ResourceType = ResourceType::$kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn revision_number(&self) -> u32 {
                self.revision_number
            }

            fn collection(batch: &GoalStateBatch) -> Collection<'_, Self> {
                batch.$accessor()
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VpcConfiguration {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub cidr: String,
    pub tunnel_id: u32,
    pub revision_number: u32,
    pub gateway_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetGateway {
    pub ip_address: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetConfiguration {
    pub id: String,
    pub project_id: String,
    pub vpc_id: String,
    pub name: String,
    pub cidr: String,
    pub tunnel_id: u32,
    pub network_type: NetworkType,
    pub revision_number: u32,
    pub gateway: Option<SubnetGateway>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedIp {
    pub subnet_id: String,
    pub ip_address: String,
}

/// Address of the compute host a port is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    pub ip_address: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfiguration {
    pub id: String,
    pub project_id: String,
    pub vpc_id: String,
    pub name: String,
    pub mac_address: String,
    pub admin_state_up: bool,
    pub device_id: String,
    pub device_owner: String,
    pub revision_number: u32,
    pub network_type: NetworkType,
    pub fixed_ips: Vec<FixedIp>,
    pub host_info: Option<HostInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostDvrMac {
    pub subnet_id: String,
    pub host_dvr_mac_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborConfiguration {
    pub id: String,
    pub project_id: String,
    pub vpc_id: String,
    pub name: String,
    pub mac_address: String,
    pub host_ip_address: String,
    pub neighbor_type: NeighborType,
    pub revision_number: u32,
    pub fixed_ips: Vec<FixedIp>,
    pub host_dvr_mac_addresses: Vec<HostDvrMac>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRule {
    pub id: String,
    pub destination: String,
    pub next_hop_ip: String,
    pub priority: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetRoutingTable {
    pub subnet_id: String,
    pub routing_rules: Vec<RoutingRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfiguration {
    pub id: String,
    pub host_dvr_mac_address: String,
    pub revision_number: u32,
    pub subnet_routing_tables: Vec<SubnetRoutingTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupRule {
    pub id: String,
    pub direction: String,
    pub ethertype: String,
    pub protocol: String,
    pub port_range_min: u16,
    pub port_range_max: u16,
    pub remote_ip_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupConfiguration {
    pub id: String,
    pub project_id: String,
    pub vpc_id: String,
    pub name: String,
    pub revision_number: u32,
    pub rules: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DhcpConfiguration {
    pub id: String,
    pub mac_address: String,
    pub ipv4_address: String,
    pub ipv6_address: String,
    pub port_host_name: String,
    pub revision_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayDestination {
    pub ip_address: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfiguration {
    pub id: String,
    pub gateway_type: GatewayType,
    pub revision_number: u32,
    pub destinations: Vec<GatewayDestination>,
    pub overlay_port: u16,
}

resource_config!(VpcConfiguration, Vpc, vpcs);
resource_config!(SubnetConfiguration, Subnet, subnets);
resource_config!(PortConfiguration, Port, ports);
resource_config!(NeighborConfiguration, Neighbor, neighbors);
resource_config!(RouterConfiguration, Router, routers);
resource_config!(SecurityGroupConfiguration, SecurityGroup, security_groups);
resource_config!(DhcpConfiguration, Dhcp, dhcps);
resource_config!(GatewayConfiguration, Gateway, gateways);

pub type VpcState = ResourceState<VpcConfiguration>;
pub type SubnetState = ResourceState<SubnetConfiguration>;
pub type PortState = ResourceState<PortConfiguration>;
pub type NeighborState = ResourceState<NeighborConfiguration>;
pub type RouterState = ResourceState<RouterConfiguration>;
pub type SecurityGroupState = ResourceState<SecurityGroupConfiguration>;
pub type DhcpState = ResourceState<DhcpConfiguration>;
pub type GatewayState = ResourceState<GatewayConfiguration>;
