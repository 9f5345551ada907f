use super::backend::{DataplaneBackend, HostDvrRequest, NeighborRequest, ProgrammingTimes};
use super::{parse_ip, parse_mac, require_id, require_revision, GoalStateProgrammer};
use crate::error::{ProgrammingError, ProgrammingResult};
use crate::resolver::Resolver;
use ncagent_types::{NeighborConfiguration, NeighborState, NeighborType, OperationType, ResourceType};

/// Backend calls for one neighbor, built before any of them runs.
#[derive(Debug)]
enum NeighborPlan {
    Upsert(Vec<NeighborRequest>),
    HostDvr(Vec<HostDvrRequest>),
    Delete(Vec<NeighborRequest>),
}

impl<B: DataplaneBackend, D> GoalStateProgrammer<B, D> {
    pub(super) async fn program_neighbor(
        &self,
        id: &str,
        state: &NeighborState,
        resolver: Resolver<'_>,
        times: &mut ProgrammingTimes,
    ) -> ProgrammingResult<()> {
        let operation = state.operation_type;
        let delete = match operation {
            OperationType::Info => return Ok(()),
            OperationType::Create | OperationType::Update | OperationType::NeighborCreateUpdate => false,
            OperationType::Delete => true,
            other => return Err(ProgrammingError::unsupported(ResourceType::Neighbor, other)),
        };

        require_id(id)?;
        require_revision(state.configuration.revision_number)?;

        match plan(id, &state.configuration, delete, resolver)? {
            NeighborPlan::Upsert(requests) => {
                for request in &requests {
                    self.dataplane.create_update_neighbor(request, times).await?;
                }
            }
            NeighborPlan::HostDvr(requests) => {
                for request in &requests {
                    self.dataplane.create_neighbor_host_dvr(request, times).await?;
                }
            }
            NeighborPlan::Delete(requests) => {
                for request in &requests {
                    self.dataplane.delete_neighbor(request, times).await?;
                }
            }
        }

        Ok(())
    }
}

fn plan(
    id: &str,
    config: &NeighborConfiguration,
    delete: bool,
    resolver: Resolver<'_>,
) -> ProgrammingResult<NeighborPlan> {
    if !delete && config.neighbor_type == NeighborType::HostDvr {
        return host_dvr_plan(id, config, resolver).map(NeighborPlan::HostDvr);
    }

    let mac = parse_mac("mac_address", &config.mac_address)?;
    let host_ip = parse_ip("host_ip_address", &config.host_ip_address)?;
    if config.fixed_ips.is_empty() {
        return Err(ProgrammingError::invalid_argument(
            "fixed_ips",
            "at least one fixed IP is required",
        ));
    }
    let ips = config
        .fixed_ips
        .iter()
        .map(|fixed_ip| parse_ip("fixed_ips.ip_address", &fixed_ip.ip_address))
        .collect::<ProgrammingResult<Vec<_>>>()?;

    let mut requests = Vec::with_capacity(ips.len());
    for (fixed_ip, ip) in config.fixed_ips.iter().zip(ips) {
        let subnet = resolver.find_subnet(&fixed_ip.subnet_id)?;
        let vpc_id = neighbor_vpc(config, &subnet.vpc_id);
        let overlay_gateway = resolver.find_overlay_gateway(&vpc_id).cloned();
        requests.push(NeighborRequest {
            neighbor_id: id.to_string(),
            vpc_id,
            subnet_id: subnet.subnet_id,
            network_type: subnet.network_type,
            tunnel_id: subnet.tunnel_id,
            neighbor_type: config.neighbor_type,
            ip,
            mac,
            host_ip,
            overlay_gateway,
        });
    }

    Ok(if delete {
        NeighborPlan::Delete(requests)
    } else {
        NeighborPlan::Upsert(requests)
    })
}

/// One MAC rewrite per DVR entry, each resolved through the entry's own
/// subnet. Fixed IPs and the host address play no part.
fn host_dvr_plan(
    id: &str,
    config: &NeighborConfiguration,
    resolver: Resolver<'_>,
) -> ProgrammingResult<Vec<HostDvrRequest>> {
    if config.host_dvr_mac_addresses.is_empty() {
        return Err(ProgrammingError::invalid_argument(
            "host_dvr_mac_addresses",
            "at least one host DVR MAC is required",
        ));
    }
    let dvr_macs = config
        .host_dvr_mac_addresses
        .iter()
        .map(|entry| parse_mac("host_dvr_mac_addresses", &entry.host_dvr_mac_address))
        .collect::<ProgrammingResult<Vec<_>>>()?;

    let mut requests = Vec::with_capacity(dvr_macs.len());
    for (entry, host_dvr_mac) in config.host_dvr_mac_addresses.iter().zip(dvr_macs) {
        let subnet = resolver.find_subnet(&entry.subnet_id)?;
        let gateway = subnet.gateway.as_ref().ok_or_else(|| {
            ProgrammingError::invalid_argument("gateway", format!("subnet '{}' has no gateway", subnet.subnet_id))
        })?;
        let gateway_mac = parse_mac("gateway.mac_address", &gateway.mac_address)?;

        requests.push(HostDvrRequest {
            neighbor_id: id.to_string(),
            vpc_id: neighbor_vpc(config, &subnet.vpc_id),
            subnet_id: subnet.subnet_id,
            network_type: subnet.network_type,
            tunnel_id: subnet.tunnel_id,
            host_dvr_mac,
            gateway_mac,
        });
    }
    Ok(requests)
}

fn neighbor_vpc(config: &NeighborConfiguration, subnet_vpc: &str) -> String {
    if config.vpc_id.is_empty() {
        subnet_vpc.to_string()
    } else {
        config.vpc_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncagent_types::{
        FixedIp, GoalState, GoalStateBatch, HostDvrMac, ResourceState, SubnetConfiguration, SubnetGateway,
        SubnetState,
    };
    use pretty_assertions::assert_eq;

    fn subnet(id: &str, tunnel_id: u32, gateway: Option<SubnetGateway>) -> SubnetState {
        ResourceState::new(
            OperationType::Info,
            SubnetConfiguration {
                id: id.to_string(),
                vpc_id: "v1".to_string(),
                cidr: "10.0.0.0/24".to_string(),
                tunnel_id,
                revision_number: 1,
                gateway,
                ..Default::default()
            },
        )
    }

    fn gateway(mac_address: &str) -> SubnetGateway {
        SubnetGateway {
            ip_address: "10.0.0.1".to_string(),
            mac_address: mac_address.to_string(),
        }
    }

    fn batch(gateway: Option<SubnetGateway>) -> GoalStateBatch {
        GoalStateBatch::from(GoalState {
            subnet_states: vec![subnet("s1", 30, gateway)],
            ..Default::default()
        })
    }

    fn neighbor(neighbor_type: NeighborType) -> NeighborConfiguration {
        NeighborConfiguration {
            id: "n1".to_string(),
            mac_address: "fa:16:3e:00:00:09".to_string(),
            host_ip_address: "192.168.0.9".to_string(),
            neighbor_type,
            revision_number: 1,
            fixed_ips: vec![FixedIp {
                subnet_id: "s1".to_string(),
                ip_address: "10.0.0.9".to_string(),
            }],
            host_dvr_mac_addresses: vec![
                HostDvrMac {
                    subnet_id: "s1".to_string(),
                    host_dvr_mac_address: "fe:16:11:00:00:01".to_string(),
                },
                HostDvrMac {
                    subnet_id: "s1".to_string(),
                    host_dvr_mac_address: "fe:16:11:00:00:02".to_string(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_l3_plans_like_l2() {
        let batch = batch(None);
        match plan("n1", &neighbor(NeighborType::L3), false, Resolver::new(&batch)).unwrap() {
            NeighborPlan::Upsert(requests) => {
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].vpc_id, "v1");
                assert_eq!(requests[0].tunnel_id.get(), 30);
                assert_eq!(requests[0].neighbor_type, NeighborType::L3);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_host_dvr_needs_subnet_gateway() {
        let no_gateway = batch(None);
        assert!(matches!(
            plan("n1", &neighbor(NeighborType::HostDvr), false, Resolver::new(&no_gateway)),
            Err(ProgrammingError::InvalidArgument { .. })
        ));

        let with_gateway = batch(Some(gateway("fa:16:3e:00:00:01")));
        match plan("n1", &neighbor(NeighborType::HostDvr), false, Resolver::new(&with_gateway)).unwrap() {
            NeighborPlan::HostDvr(requests) => {
                assert_eq!(requests.len(), 2);
                assert_eq!(requests[1].host_dvr_mac.to_string(), "fe:16:11:00:00:02");
                assert_eq!(requests[0].gateway_mac.to_string(), "fa:16:3e:00:00:01");
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_delete_plan() {
        let batch = batch(None);
        assert!(matches!(
            plan("n1", &neighbor(NeighborType::HostDvr), true, Resolver::new(&batch)),
            Ok(NeighborPlan::Delete(_))
        ));
    }

    #[test]
    fn test_missing_subnet_is_lookup_failure() {
        let batch = batch(None);
        let mut config = neighbor(NeighborType::L2);
        config.fixed_ips[0].subnet_id = "missing".to_string();

        assert!(matches!(
            plan("n1", &config, false, Resolver::new(&batch)),
            Err(ProgrammingError::Resolve(_))
        ));
    }

    #[test]
    fn test_host_dvr_resolves_each_entry_through_its_own_subnet() {
        let batch = GoalStateBatch::from(GoalState {
            subnet_states: vec![
                subnet("s1", 30, Some(gateway("fa:16:3e:00:00:01"))),
                subnet("s2", 40, Some(gateway("fa:16:3e:00:00:02"))),
            ],
            ..Default::default()
        });
        let mut config = neighbor(NeighborType::HostDvr);
        config.fixed_ips.push(FixedIp {
            subnet_id: "s1".to_string(),
            ip_address: "10.0.0.10".to_string(),
        });
        config.host_dvr_mac_addresses = vec![HostDvrMac {
            subnet_id: "s2".to_string(),
            host_dvr_mac_address: "fe:16:11:00:00:01".to_string(),
        }];

        match plan("n1", &config, false, Resolver::new(&batch)).unwrap() {
            NeighborPlan::HostDvr(requests) => {
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].subnet_id, "s2");
                assert_eq!(requests[0].tunnel_id.get(), 40);
                assert_eq!(requests[0].gateway_mac.to_string(), "fa:16:3e:00:00:02");
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_host_dvr_ignores_fixed_ips_and_host_address() {
        let batch = batch(Some(gateway("fa:16:3e:00:00:01")));
        let mut config = neighbor(NeighborType::HostDvr);
        config.fixed_ips.clear();
        config.host_ip_address = "not-an-ip".to_string();

        assert!(matches!(
            plan("n1", &config, false, Resolver::new(&batch)),
            Ok(NeighborPlan::HostDvr(requests)) if requests.len() == 2
        ));
    }

    #[test]
    fn test_host_dvr_without_entries_is_invalid() {
        let batch = batch(Some(gateway("fa:16:3e:00:00:01")));
        let mut config = neighbor(NeighborType::HostDvr);
        config.host_dvr_mac_addresses.clear();

        assert!(matches!(
            plan("n1", &config, false, Resolver::new(&batch)),
            Err(ProgrammingError::InvalidArgument { ref field, .. }) if field == "host_dvr_mac_addresses"
        ));
    }

    #[test]
    fn test_malformed_ip_wins_over_missing_subnet() {
        let batch = batch(None);
        let mut config = neighbor(NeighborType::L2);
        config.fixed_ips[0].subnet_id = "missing".to_string();
        config.fixed_ips.push(FixedIp {
            subnet_id: "s1".to_string(),
            ip_address: "10.0.0.300".to_string(),
        });

        assert!(matches!(
            plan("n1", &config, false, Resolver::new(&batch)),
            Err(ProgrammingError::InvalidArgument { .. })
        ));
    }
}
