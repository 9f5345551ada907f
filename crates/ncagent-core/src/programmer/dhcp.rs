use super::backend::{DhcpBackend, DhcpEntry, ProgrammingTimes};
use super::{parse_ip, parse_mac, require_id, require_revision, GoalStateProgrammer};
use crate::error::{ProgrammingError, ProgrammingResult};
use ncagent_types::{DhcpConfiguration, DhcpState, OperationType, ResourceType};
use std::net::Ipv6Addr;

impl<B, D: DhcpBackend> GoalStateProgrammer<B, D> {
    pub(super) async fn program_dhcp(
        &self,
        id: &str,
        state: &DhcpState,
        times: &mut ProgrammingTimes,
    ) -> ProgrammingResult<()> {
        let operation = state.operation_type;
        match operation {
            OperationType::Create | OperationType::Update | OperationType::Delete => {}
            other => return Err(ProgrammingError::unsupported(ResourceType::Dhcp, other)),
        }

        require_id(id)?;
        require_revision(state.configuration.revision_number)?;
        let entry = dhcp_entry(id, &state.configuration)?;

        match operation {
            OperationType::Create => self.dhcp.add_entry(&entry, times).await?,
            OperationType::Update => self.dhcp.update_entry(&entry, times).await?,
            _ => self.dhcp.delete_entry(&entry, times).await?,
        }

        Ok(())
    }
}

fn dhcp_entry(id: &str, config: &DhcpConfiguration) -> ProgrammingResult<DhcpEntry> {
    let ipv6 = if config.ipv6_address.is_empty() {
        None
    } else {
        let addr = config
            .ipv6_address
            .parse::<Ipv6Addr>()
            .map_err(|e| ProgrammingError::invalid_argument("ipv6_address", e))?;
        Some(addr)
    };

    Ok(DhcpEntry {
        id: id.to_string(),
        mac: parse_mac("mac_address", &config.mac_address)?,
        ipv4: parse_ip("ipv4_address", &config.ipv4_address)?,
        ipv6,
        hostname: config.port_host_name.clone(),
    })
}
