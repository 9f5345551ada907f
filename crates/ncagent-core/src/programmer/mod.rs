//! Validating [`ResourceHandler`] on top of the dataplane and DHCP backends.
//!
//! Each resource is validated completely (IDs, revision, addresses, and the
//! subnet references it needs) before the first backend call, so a rejected
//! resource leaves the dataplane untouched.

mod backend;
mod dhcp;
mod neighbor;
mod port;
mod router;

pub use backend::{
    DataplaneBackend, DhcpBackend, DhcpEntry, HostDvrRequest, NeighborRequest, PortRequest,
    ProgrammingTimes, RouterRequest, RouterSubnet,
};
pub use port::{port_interface_name, PortUpdateAction};

use crate::error::{ProgrammingError, ProgrammingResult};
use crate::handler::ResourceHandler;
use crate::resolver::Resolver;
use crate::task::{Outcome, ReturnCode};
use async_trait::async_trait;
use ncagent_types::{
    parse_ipv4, DhcpState, GoalStateBatch, MacAddress, NeighborState, OperationType, PortState,
    ResourceType, RouterState, SubnetState, VpcState,
};
use std::net::Ipv4Addr;
use tracing::{error, info};

/// Handler that programs resources through a [`DataplaneBackend`] and a
/// [`DhcpBackend`].
#[derive(Debug)]
pub struct GoalStateProgrammer<B, D> {
    dataplane: B,
    dhcp: D,
}

impl<B, D> GoalStateProgrammer<B, D> {
    pub fn new(dataplane: B, dhcp: D) -> Self {
        GoalStateProgrammer { dataplane, dhcp }
    }

    pub fn dataplane(&self) -> &B {
        &self.dataplane
    }

    pub fn dhcp(&self) -> &D {
        &self.dhcp
    }
}

#[async_trait]
impl<B, D> ResourceHandler for GoalStateProgrammer<B, D>
where
    B: DataplaneBackend,
    D: DhcpBackend,
{
    async fn update_vpc_state(&self, id: &str, state: &VpcState, _batch: &GoalStateBatch) -> Outcome {
        let operation = state.operation_type;
        let result = match operation {
            OperationType::Info => Ok(()),
            OperationType::Create | OperationType::Update | OperationType::Delete => {
                Err(ProgrammingError::NotImplemented {
                    kind: ResourceType::Vpc,
                    operation,
                })
            }
            other => Err(ProgrammingError::unsupported(ResourceType::Vpc, other)),
        };
        finish(ResourceType::Vpc, id, operation, result, ProgrammingTimes::default())
    }

    async fn update_subnet_state(&self, id: &str, state: &SubnetState, _batch: &GoalStateBatch) -> Outcome {
        let operation = state.operation_type;
        let result = match operation {
            OperationType::Info => Ok(()),
            other => Err(ProgrammingError::unsupported(ResourceType::Subnet, other)),
        };
        finish(ResourceType::Subnet, id, operation, result, ProgrammingTimes::default())
    }

    async fn update_port_state(&self, id: &str, state: &PortState, batch: &GoalStateBatch) -> Outcome {
        let mut times = ProgrammingTimes::default();
        let result = self
            .program_port(id, state, Resolver::new(batch), &mut times)
            .await;
        finish(ResourceType::Port, id, state.operation_type, result, times)
    }

    async fn update_neighbor_state(
        &self,
        id: &str,
        state: &NeighborState,
        batch: &GoalStateBatch,
    ) -> Outcome {
        let mut times = ProgrammingTimes::default();
        let result = self
            .program_neighbor(id, state, Resolver::new(batch), &mut times)
            .await;
        finish(ResourceType::Neighbor, id, state.operation_type, result, times)
    }

    async fn update_router_state(&self, id: &str, state: &RouterState, batch: &GoalStateBatch) -> Outcome {
        let mut times = ProgrammingTimes::default();
        let result = self
            .program_router(id, state, Resolver::new(batch), &mut times)
            .await;
        finish(ResourceType::Router, id, state.operation_type, result, times)
    }

    async fn update_dhcp_state(&self, id: &str, state: &DhcpState, _batch: &GoalStateBatch) -> Outcome {
        let mut times = ProgrammingTimes::default();
        let result = self.program_dhcp(id, state, &mut times).await;
        finish(ResourceType::Dhcp, id, state.operation_type, result, times)
    }
}

fn finish(
    kind: ResourceType,
    id: &str,
    operation: OperationType,
    result: ProgrammingResult<()>,
    times: ProgrammingTimes,
) -> Outcome {
    let code = match result {
        Ok(()) => {
            info!(
                %kind,
                %id,
                %operation,
                dataplane_us = times.dataplane.as_micros() as u64,
                network_config_us = times.network_config.as_micros() as u64,
                "Programming succeeded"
            );
            ReturnCode::SUCCESS
        }
        Err(e) => {
            let code = e.to_code();
            if code.is_in_progress() {
                info!(%kind, %id, %operation, "Programming in progress: {}", e);
            } else {
                error!(%kind, %id, %operation, code = %code, "Programming failed: {}", e);
            }
            code
        }
    };
    Outcome::with_times(code, times.dataplane, times.network_config)
}

fn require_id(id: &str) -> ProgrammingResult<()> {
    if id.is_empty() {
        return Err(ProgrammingError::invalid_argument("id", "must not be empty"));
    }
    Ok(())
}

fn require_revision(revision_number: u32) -> ProgrammingResult<()> {
    if revision_number == 0 {
        return Err(ProgrammingError::invalid_argument(
            "revision_number",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn parse_mac(field: &str, value: &str) -> ProgrammingResult<MacAddress> {
    value
        .parse()
        .map_err(|e| ProgrammingError::invalid_argument(field, e))
}

fn parse_ip(field: &str, value: &str) -> ProgrammingResult<Ipv4Addr> {
    parse_ipv4(value).map_err(|e| ProgrammingError::invalid_argument(field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_validation() {
        assert!(require_id("p1").is_ok());
        assert_eq!(require_id("").unwrap_err().to_code(), ReturnCode::INVALID_ARGUMENT);
        assert!(require_revision(1).is_ok());
        assert!(require_revision(0).is_err());
        assert!(parse_mac("mac_address", "fa:16:3e:00:00:01").is_ok());
        assert!(parse_mac("mac_address", "fa:16:3e").is_err());
        assert!(parse_ip("ip_address", "10.0.0.5").is_ok());
        assert!(parse_ip("ip_address", "10.0.0.500").is_err());
    }

    #[test]
    fn test_finish_carries_times_and_code() {
        let times = ProgrammingTimes {
            dataplane: std::time::Duration::from_micros(7),
            network_config: std::time::Duration::from_micros(3),
        };
        let outcome = finish(
            ResourceType::Port,
            "p1",
            OperationType::Create,
            Err(ProgrammingError::invalid_argument("mac_address", "bad")),
            times,
        );

        assert_eq!(outcome.code, ReturnCode::INVALID_ARGUMENT);
        assert_eq!(outcome.dataplane_time, times.dataplane);
        assert_eq!(outcome.network_config_time, times.network_config);
    }
}
