use super::backend::{DataplaneBackend, ProgrammingTimes, RouterRequest, RouterSubnet};
use super::{parse_ip, parse_mac, require_id, require_revision, GoalStateProgrammer};
use crate::error::{ProgrammingError, ProgrammingResult};
use crate::resolver::Resolver;
use ncagent_types::{Cidr, OperationType, ResourceType, RouterConfiguration, RouterState};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

impl<B: DataplaneBackend, D> GoalStateProgrammer<B, D> {
    pub(super) async fn program_router(
        &self,
        id: &str,
        state: &RouterState,
        resolver: Resolver<'_>,
        times: &mut ProgrammingTimes,
    ) -> ProgrammingResult<()> {
        let operation = state.operation_type;
        match operation {
            OperationType::Info => return Ok(()),
            OperationType::Create | OperationType::Update | OperationType::Delete => {}
            other => return Err(ProgrammingError::unsupported(ResourceType::Router, other)),
        }

        require_id(id)?;
        require_revision(state.configuration.revision_number)?;

        if operation == OperationType::Delete {
            self.dataplane.delete_router(id, times).await?;
        } else {
            let request = router_request(id, &state.configuration, resolver)?;
            self.dataplane.create_router(&request, times).await?;
        }

        Ok(())
    }
}

fn router_request(
    id: &str,
    config: &RouterConfiguration,
    resolver: Resolver<'_>,
) -> ProgrammingResult<RouterRequest> {
    let host_dvr_mac = parse_mac("host_dvr_mac_address", &config.host_dvr_mac_address)?;
    let mut subnets = BTreeMap::new();

    for table in &config.subnet_routing_tables {
        if table.subnet_id.is_empty() {
            return Err(ProgrammingError::invalid_argument(
                "subnet_routing_tables.subnet_id",
                "must not be empty",
            ));
        }

        let slot = match subnets.entry(table.subnet_id.clone()) {
            Entry::Occupied(_) => {
                return Err(ProgrammingError::invalid_argument(
                    "subnet_routing_tables",
                    format!("duplicate subnet '{}'", table.subnet_id),
                ))
            }
            Entry::Vacant(slot) => slot,
        };

        let subnet = resolver.find_subnet(&table.subnet_id)?;
        let gateway = subnet.gateway.as_ref().ok_or_else(|| {
            ProgrammingError::invalid_argument("gateway", format!("subnet '{}' has no gateway", table.subnet_id))
        })?;
        let gateway_ip = parse_ip("gateway.ip_address", &gateway.ip_address)?;
        let gateway_mac = parse_mac("gateway.mac_address", &gateway.mac_address)?;

        for rule in &table.routing_rules {
            rule.destination
                .parse::<Cidr>()
                .map_err(|e| ProgrammingError::invalid_argument("routing_rules.destination", e))?;
            parse_ip("routing_rules.next_hop_ip", &rule.next_hop_ip)?;
        }

        slot.insert(RouterSubnet {
            vpc_id: subnet.vpc_id,
            network_type: subnet.network_type,
            tunnel_id: subnet.tunnel_id,
            cidr: subnet.cidr,
            gateway_ip,
            gateway_mac,
            routing_rules: table.routing_rules.clone(),
        });
    }

    Ok(RouterRequest {
        router_id: id.to_string(),
        host_dvr_mac,
        subnets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncagent_types::{
        GoalState, GoalStateBatch, ResourceState, RoutingRule, SubnetConfiguration, SubnetGateway,
        SubnetRoutingTable,
    };
    use pretty_assertions::assert_eq;

    fn subnet(id: &str, gateway_mac: &str) -> ResourceState<SubnetConfiguration> {
        ResourceState::new(
            OperationType::Info,
            SubnetConfiguration {
                id: id.to_string(),
                vpc_id: "v1".to_string(),
                cidr: "10.0.0.0/24".to_string(),
                tunnel_id: 40,
                revision_number: 1,
                gateway: Some(SubnetGateway {
                    ip_address: "10.0.0.1".to_string(),
                    mac_address: gateway_mac.to_string(),
                }),
                ..Default::default()
            },
        )
    }

    fn router(subnet_ids: &[&str]) -> RouterConfiguration {
        RouterConfiguration {
            id: "r1".to_string(),
            host_dvr_mac_address: "fe:16:11:00:00:00".to_string(),
            revision_number: 1,
            subnet_routing_tables: subnet_ids
                .iter()
                .map(|id| SubnetRoutingTable {
                    subnet_id: id.to_string(),
                    routing_rules: vec![RoutingRule {
                        id: "rule1".to_string(),
                        destination: "0.0.0.0/0".to_string(),
                        next_hop_ip: "10.0.0.1".to_string(),
                        priority: 10,
                    }],
                })
                .collect(),
        }
    }

    fn batch() -> GoalStateBatch {
        GoalStateBatch::from(GoalState {
            subnet_states: vec![subnet("s1", "fa:16:3e:00:00:01"), subnet("s2", "bad")],
            ..Default::default()
        })
    }

    #[test]
    fn test_router_request() {
        let batch = batch();
        let request = router_request("r1", &router(&["s1"]), Resolver::new(&batch)).unwrap();

        assert_eq!(request.subnets.len(), 1);
        let entry = &request.subnets["s1"];
        assert_eq!(entry.tunnel_id.get(), 40);
        assert_eq!(entry.gateway_ip.to_string(), "10.0.0.1");
        assert_eq!(entry.routing_rules.len(), 1);
    }

    #[test]
    fn test_duplicate_subnet_is_invalid() {
        let batch = batch();
        assert!(matches!(
            router_request("r1", &router(&["s1", "s1"]), Resolver::new(&batch)),
            Err(ProgrammingError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_bad_gateway_mac_is_invalid() {
        let batch = batch();
        assert!(matches!(
            router_request("r1", &router(&["s2"]), Resolver::new(&batch)),
            Err(ProgrammingError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_unknown_subnet_is_lookup_failure() {
        let batch = batch();
        let err = router_request("r1", &router(&["s9"]), Resolver::new(&batch)).unwrap_err();
        assert_eq!(err.to_code(), crate::task::ReturnCode::FAILURE);
    }

    #[test]
    fn test_bad_routing_rule_is_invalid() {
        let batch = batch();
        let mut config = router(&["s1"]);
        config.subnet_routing_tables[0].routing_rules[0].destination = "0.0.0.0".to_string();

        assert!(matches!(
            router_request("r1", &config, Resolver::new(&batch)),
            Err(ProgrammingError::InvalidArgument { .. })
        ));
    }
}
