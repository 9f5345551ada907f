//! Test fixtures for goal-state reconciliation
//!
//! Provides a goal-state builder and reusable resource configurations

use ncagent_types::{
    DhcpConfiguration, FixedIp, GatewayConfiguration, GatewayDestination, GatewayType, GoalState,
    GoalStateBatch, HostDvrMac, HostInfo, NeighborConfiguration, NeighborType, OperationType,
    PortConfiguration, ResourceState, RouterConfiguration, RoutingRule, SecurityGroupConfiguration,
    SubnetConfiguration, SubnetGateway, SubnetRoutingTable, VpcConfiguration,
};
use std::sync::Arc;

/// Deterministic port-style MAC address, `fa:16:3e:00:00:NN`.
pub fn mac(n: u8) -> String {
    format!("fa:16:3e:00:00:{:02x}", n)
}

/// Builds goal states in the listed shape, convertible to the keyed shape.
#[derive(Debug, Clone, Default)]
pub struct GoalStateBuilder {
    state: GoalState,
}

impl GoalStateBuilder {
    pub fn new() -> Self {
        Self {
            state: GoalState {
                format_version: 1,
                ..Default::default()
            },
        }
    }

    pub fn format_version(mut self, version: u32) -> Self {
        self.state.format_version = version;
        self
    }

    pub fn vpc(mut self, operation: OperationType, config: VpcConfiguration) -> Self {
        self.state.vpc_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn subnet(mut self, operation: OperationType, config: SubnetConfiguration) -> Self {
        self.state.subnet_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn port(mut self, operation: OperationType, config: PortConfiguration) -> Self {
        self.state.port_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn neighbor(mut self, operation: OperationType, config: NeighborConfiguration) -> Self {
        self.state.neighbor_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn router(mut self, operation: OperationType, config: RouterConfiguration) -> Self {
        self.state.router_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn dhcp(mut self, operation: OperationType, config: DhcpConfiguration) -> Self {
        self.state.dhcp_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn security_group(mut self, operation: OperationType, config: SecurityGroupConfiguration) -> Self {
        self.state.security_group_states.push(ResourceState::new(operation, config));
        self
    }

    pub fn gateway(mut self, operation: OperationType, config: GatewayConfiguration) -> Self {
        self.state.gateway_states.push(ResourceState::new(operation, config));
        self
    }

    /// Listed-shape batch.
    pub fn build(self) -> GoalStateBatch {
        GoalStateBatch::from(self.state)
    }

    /// Keyed-shape batch with the same content.
    pub fn build_keyed(self) -> GoalStateBatch {
        GoalStateBatch::from(self.build().to_keyed())
    }

    pub fn build_shared(self) -> Arc<GoalStateBatch> {
        Arc::new(self.build())
    }
}

/// VPC fixtures
pub mod vpc_fixtures {
    use super::*;

    pub fn vpc(id: &str, tunnel_id: u32) -> VpcConfiguration {
        VpcConfiguration {
            id: id.to_string(),
            project_id: "project-1".to_string(),
            name: format!("{}-name", id),
            cidr: "10.0.0.0/16".to_string(),
            tunnel_id,
            revision_number: 1,
            gateway_ids: Vec::new(),
        }
    }

    pub fn vpc_with_gateways(id: &str, tunnel_id: u32, gateway_ids: &[&str]) -> VpcConfiguration {
        VpcConfiguration {
            gateway_ids: gateway_ids.iter().map(|g| g.to_string()).collect(),
            ..vpc(id, tunnel_id)
        }
    }
}

/// Subnet fixtures
pub mod subnet_fixtures {
    use super::*;

    /// Subnet with no gateway.
    pub fn subnet(id: &str, vpc_id: &str, cidr: &str, tunnel_id: u32) -> SubnetConfiguration {
        SubnetConfiguration {
            id: id.to_string(),
            project_id: "project-1".to_string(),
            vpc_id: vpc_id.to_string(),
            name: format!("{}-name", id),
            cidr: cidr.to_string(),
            tunnel_id,
            revision_number: 1,
            ..Default::default()
        }
    }

    pub fn subnet_with_gateway(
        id: &str,
        vpc_id: &str,
        cidr: &str,
        tunnel_id: u32,
        gateway_ip: &str,
        gateway_mac: &str,
    ) -> SubnetConfiguration {
        SubnetConfiguration {
            gateway: Some(SubnetGateway {
                ip_address: gateway_ip.to_string(),
                mac_address: gateway_mac.to_string(),
            }),
            ..subnet(id, vpc_id, cidr, tunnel_id)
        }
    }
}

/// Port fixtures
pub mod port_fixtures {
    use super::*;

    /// Port bound to a device with one fixed IP.
    pub fn port(id: &str, subnet_id: &str, ip: &str, mac_address: &str) -> PortConfiguration {
        PortConfiguration {
            id: id.to_string(),
            project_id: "project-1".to_string(),
            name: format!("{}-name", id),
            mac_address: mac_address.to_string(),
            admin_state_up: true,
            device_id: format!("{}-device", id),
            device_owner: "compute:nova".to_string(),
            revision_number: 1,
            fixed_ips: vec![FixedIp {
                subnet_id: subnet_id.to_string(),
                ip_address: ip.to_string(),
            }],
            ..Default::default()
        }
    }

    /// Port whose device binding has been cleared.
    pub fn unbound_port(id: &str, subnet_id: &str, ip: &str, mac_address: &str) -> PortConfiguration {
        PortConfiguration {
            device_id: String::new(),
            device_owner: String::new(),
            ..port(id, subnet_id, ip, mac_address)
        }
    }

    pub fn port_on_host(id: &str, subnet_id: &str, ip: &str, mac_address: &str, host_ip: &str) -> PortConfiguration {
        PortConfiguration {
            host_info: Some(HostInfo {
                ip_address: host_ip.to_string(),
                mac_address: mac(0xfe),
            }),
            ..port(id, subnet_id, ip, mac_address)
        }
    }
}

/// Neighbor fixtures
pub mod neighbor_fixtures {
    use super::*;

    pub fn neighbor(
        id: &str,
        neighbor_type: NeighborType,
        subnet_id: &str,
        ip: &str,
        mac_address: &str,
        host_ip: &str,
    ) -> NeighborConfiguration {
        NeighborConfiguration {
            id: id.to_string(),
            project_id: "project-1".to_string(),
            name: format!("{}-name", id),
            mac_address: mac_address.to_string(),
            host_ip_address: host_ip.to_string(),
            neighbor_type,
            revision_number: 1,
            fixed_ips: vec![FixedIp {
                subnet_id: subnet_id.to_string(),
                ip_address: ip.to_string(),
            }],
            ..Default::default()
        }
    }

    pub fn host_dvr_neighbor(
        id: &str,
        subnet_id: &str,
        ip: &str,
        mac_address: &str,
        dvr_macs: &[&str],
    ) -> NeighborConfiguration {
        NeighborConfiguration {
            host_dvr_mac_addresses: dvr_macs
                .iter()
                .map(|dvr_mac| HostDvrMac {
                    subnet_id: subnet_id.to_string(),
                    host_dvr_mac_address: dvr_mac.to_string(),
                })
                .collect(),
            ..neighbor(id, NeighborType::HostDvr, subnet_id, ip, mac_address, "")
        }
    }
}

/// Router fixtures
pub mod router_fixtures {
    use super::*;

    /// Router attached to `subnet_ids`, each with one default route.
    pub fn router(id: &str, host_dvr_mac: &str, subnet_ids: &[&str]) -> RouterConfiguration {
        RouterConfiguration {
            id: id.to_string(),
            host_dvr_mac_address: host_dvr_mac.to_string(),
            revision_number: 1,
            subnet_routing_tables: subnet_ids
                .iter()
                .map(|subnet_id| SubnetRoutingTable {
                    subnet_id: subnet_id.to_string(),
                    routing_rules: vec![RoutingRule {
                        id: format!("{}-default", subnet_id),
                        destination: "0.0.0.0/0".to_string(),
                        next_hop_ip: "10.0.0.1".to_string(),
                        priority: 1,
                    }],
                })
                .collect(),
        }
    }
}

/// DHCP fixtures
pub mod dhcp_fixtures {
    use super::*;

    pub fn dhcp(id: &str, mac_address: &str, ipv4: &str) -> DhcpConfiguration {
        DhcpConfiguration {
            id: id.to_string(),
            mac_address: mac_address.to_string(),
            ipv4_address: ipv4.to_string(),
            ipv6_address: String::new(),
            port_host_name: format!("{}-host", id),
            revision_number: 1,
        }
    }
}

/// Gateway fixtures
pub mod gateway_fixtures {
    use super::*;

    pub fn overlay_gateway(id: &str, destination_ip: &str) -> GatewayConfiguration {
        GatewayConfiguration {
            id: id.to_string(),
            gateway_type: GatewayType::Overlay,
            revision_number: 1,
            destinations: vec![GatewayDestination {
                ip_address: destination_ip.to_string(),
                mac_address: mac(0xaa),
            }],
            overlay_port: 8300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncagent_types::{BatchShape, ResourceType};

    #[test]
    fn test_builder_shapes() {
        let builder = GoalStateBuilder::new()
            .subnet(OperationType::Info, subnet_fixtures::subnet("s1", "v1", "10.0.0.0/24", 20))
            .port(OperationType::Create, port_fixtures::port("p1", "s1", "10.0.0.5", &mac(1)));

        let listed = builder.clone().build();
        let keyed = builder.build_keyed();

        assert_eq!(listed.shape(), BatchShape::Listed);
        assert_eq!(keyed.shape(), BatchShape::Keyed);
        assert_eq!(keyed.count(ResourceType::Port), 1);
        assert!(keyed.ports().get("p1").is_some());
    }

    #[test]
    fn test_mac_helper() {
        assert_eq!(mac(1), "fa:16:3e:00:00:01");
        assert_eq!(mac(0xfe), "fa:16:3e:00:00:fe");
    }
}
