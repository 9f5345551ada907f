use super::backend::{DataplaneBackend, NeighborRequest, PortRequest, ProgrammingTimes};
use super::{parse_ip, parse_mac, require_id, require_revision, GoalStateProgrammer};
use crate::error::{ProgrammingError, ProgrammingResult};
use crate::resolver::Resolver;
use ncagent_types::{NeighborType, OperationType, PortConfiguration, PortState, ResourceType};
use std::net::IpAddr;
use tracing::debug;

const INTERFACE_PREFIX: &str = "tap";
const INTERFACE_ID_CHARS: usize = 11;

/// Host interface name for a port: `tap` plus the first 11 characters of
/// the port ID, which stays within the kernel's 15-character limit.
pub fn port_interface_name(port_id: &str) -> String {
    let mut name = String::from(INTERFACE_PREFIX);
    name.extend(port_id.chars().take(INTERFACE_ID_CHARS));
    name
}

/// How an UPDATE on a port is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortUpdateAction {
    /// Device binding present: program the port.
    Create,
    /// Device binding cleared: unplug the port.
    Delete,
    /// Partial binding; nothing to do yet.
    Ignore,
}

impl PortUpdateAction {
    pub fn for_config(config: &PortConfiguration) -> Self {
        match (config.device_id.is_empty(), config.device_owner.is_empty()) {
            (false, false) => PortUpdateAction::Create,
            (true, true) => PortUpdateAction::Delete,
            _ => PortUpdateAction::Ignore,
        }
    }
}

impl<B: DataplaneBackend, D> GoalStateProgrammer<B, D> {
    pub(super) async fn program_port(
        &self,
        id: &str,
        state: &PortState,
        resolver: Resolver<'_>,
        times: &mut ProgrammingTimes,
    ) -> ProgrammingResult<()> {
        let operation = state.operation_type;
        let config = &state.configuration;

        match operation {
            OperationType::Info => return Ok(()),
            OperationType::Create
            | OperationType::Update
            | OperationType::Delete
            | OperationType::NeighborCreateUpdate => {}
            other => return Err(ProgrammingError::unsupported(ResourceType::Port, other)),
        }

        require_id(id)?;
        require_revision(config.revision_number)?;
        let request = port_request(id, config, resolver)?;

        match operation {
            OperationType::Create => self.dataplane.configure_port(&request, times).await?,
            OperationType::Delete => self.dataplane.delete_port(&request, times).await?,
            OperationType::Update => match PortUpdateAction::for_config(config) {
                PortUpdateAction::Create => self.dataplane.configure_port(&request, times).await?,
                PortUpdateAction::Delete => self.dataplane.delete_port(&request, times).await?,
                PortUpdateAction::Ignore => {
                    debug!(%id, "Port update without a complete device binding, nothing to program");
                }
            },
            // NEIGHBOR_CREATE_UPDATE
            _ => {
                let neighbor = host_neighbor_request(config, &request)?;
                self.dataplane.create_update_neighbor(&neighbor, times).await?;
            }
        }

        Ok(())
    }
}

fn port_request(id: &str, config: &PortConfiguration, resolver: Resolver<'_>) -> ProgrammingResult<PortRequest> {
    let mac = parse_mac("mac_address", &config.mac_address)?;

    let fixed_ip = config
        .fixed_ips
        .first()
        .ok_or_else(|| ProgrammingError::invalid_argument("fixed_ips", "at least one fixed IP is required"))?;
    if fixed_ip.subnet_id.is_empty() {
        return Err(ProgrammingError::invalid_argument(
            "fixed_ips.subnet_id",
            "must not be empty",
        ));
    }
    let ip = parse_ip("fixed_ips.ip_address", &fixed_ip.ip_address)?;

    let subnet = resolver.find_subnet(&fixed_ip.subnet_id)?;
    let cidr = subnet.cidr.host(IpAddr::V4(ip))?;
    let vpc_id = if config.vpc_id.is_empty() {
        subnet.vpc_id
    } else {
        config.vpc_id.clone()
    };
    let overlay_gateway = resolver.find_overlay_gateway(&vpc_id).cloned();

    Ok(PortRequest {
        port_id: id.to_string(),
        interface_name: port_interface_name(id),
        subnet_id: subnet.subnet_id,
        network_type: subnet.network_type,
        tunnel_id: subnet.tunnel_id,
        vpc_id,
        mac,
        ip,
        cidr,
        overlay_gateway,
    })
}

/// Neighbor entry announcing this port at its host's address.
fn host_neighbor_request(config: &PortConfiguration, port: &PortRequest) -> ProgrammingResult<NeighborRequest> {
    let host = config
        .host_info
        .as_ref()
        .ok_or_else(|| ProgrammingError::invalid_argument("host_info", "required for neighbor update"))?;
    let host_ip = parse_ip("host_info.ip_address", &host.ip_address)?;

    Ok(NeighborRequest {
        neighbor_id: port.port_id.clone(),
        vpc_id: port.vpc_id.clone(),
        subnet_id: port.subnet_id.clone(),
        network_type: port.network_type,
        tunnel_id: port.tunnel_id,
        neighbor_type: NeighborType::L2,
        ip: port.ip,
        mac: port.mac,
        host_ip,
        overlay_gateway: port.overlay_gateway.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncagent_types::{FixedIp, GoalState, GoalStateBatch, ResourceState, SubnetConfiguration};
    use pretty_assertions::assert_eq;

    fn config(device_id: &str, device_owner: &str) -> PortConfiguration {
        PortConfiguration {
            id: "p1".to_string(),
            vpc_id: "v1".to_string(),
            mac_address: "fa:16:3e:00:00:01".to_string(),
            device_id: device_id.to_string(),
            device_owner: device_owner.to_string(),
            revision_number: 1,
            fixed_ips: vec![FixedIp {
                subnet_id: "s1".to_string(),
                ip_address: "10.0.0.5".to_string(),
            }],
            ..Default::default()
        }
    }

    fn batch() -> GoalStateBatch {
        GoalStateBatch::from(GoalState {
            subnet_states: vec![ResourceState::new(
                OperationType::Info,
                SubnetConfiguration {
                    id: "s1".to_string(),
                    vpc_id: "v1".to_string(),
                    cidr: "10.0.0.0/24".to_string(),
                    tunnel_id: 20,
                    revision_number: 1,
                    ..Default::default()
                },
            )],
            ..Default::default()
        })
    }

    #[test]
    fn test_interface_name() {
        assert_eq!(port_interface_name("0123456789abcdef"), "tap0123456789a");
        assert_eq!(port_interface_name("p1"), "tapp1");
    }

    #[test]
    fn test_update_action() {
        assert_eq!(PortUpdateAction::for_config(&config("vm1", "compute:nova")), PortUpdateAction::Create);
        assert_eq!(PortUpdateAction::for_config(&config("", "")), PortUpdateAction::Delete);
        assert_eq!(PortUpdateAction::for_config(&config("vm1", "")), PortUpdateAction::Ignore);
    }

    #[test]
    fn test_port_request() {
        let batch = batch();
        let request = port_request("p1", &config("", ""), Resolver::new(&batch)).unwrap();

        assert_eq!(request.interface_name, "tapp1");
        assert_eq!(request.cidr.to_string(), "10.0.0.5/24");
        assert_eq!(request.tunnel_id.get(), 20);
        assert!(request.overlay_gateway.is_none());
    }

    #[test]
    fn test_port_request_rejections() {
        let batch = batch();
        let resolver = Resolver::new(&batch);

        let mut bad_mac = config("", "");
        bad_mac.mac_address = "not-a-mac".to_string();
        assert!(matches!(
            port_request("p1", &bad_mac, resolver),
            Err(ProgrammingError::InvalidArgument { .. })
        ));

        let mut no_ips = config("", "");
        no_ips.fixed_ips.clear();
        assert!(matches!(
            port_request("p1", &no_ips, resolver),
            Err(ProgrammingError::InvalidArgument { .. })
        ));

        let mut missing_subnet = config("", "");
        missing_subnet.fixed_ips[0].subnet_id = "missing".to_string();
        assert!(matches!(
            port_request("p1", &missing_subnet, resolver),
            Err(ProgrammingError::Resolve(_))
        ));
    }

    #[test]
    fn test_host_neighbor_requires_host_info() {
        let batch = batch();
        let port_config = config("", "");
        let port = port_request("p1", &port_config, Resolver::new(&batch)).unwrap();

        assert!(host_neighbor_request(&port_config, &port).is_err());

        let mut with_host = port_config.clone();
        with_host.host_info = Some(ncagent_types::HostInfo {
            ip_address: "192.168.1.10".to_string(),
            mac_address: String::new(),
        });
        let neighbor = host_neighbor_request(&with_host, &port).unwrap();
        assert_eq!(neighbor.host_ip.to_string(), "192.168.1.10");
        assert_eq!(neighbor.ip, port.ip);
    }
}
