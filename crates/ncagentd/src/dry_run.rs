//! Dataplane backend that only logs what it would program.
//!
//! Lets the agent run on hosts without a virtual switch, and is what the
//! agent uses in `dry-run` mode.

use async_trait::async_trait;
use ncagent_core::{
    BackendError, DataplaneBackend, DhcpBackend, DhcpEntry, HostDvrRequest, NeighborRequest,
    PortRequest, ProgrammingTimes, RouterRequest,
};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DryRunBackend {
    bridge: String,
    dhcp_enabled: bool,
}

impl DryRunBackend {
    pub fn new(bridge: impl Into<String>, dhcp_enabled: bool) -> Self {
        Self {
            bridge: bridge.into(),
            dhcp_enabled,
        }
    }

    pub fn bridge(&self) -> &str {
        &self.bridge
    }

    fn dhcp(&self, action: &str, entry: &DhcpEntry, times: &mut ProgrammingTimes) {
        let started = Instant::now();
        if self.dhcp_enabled {
            info!(
                id = %entry.id,
                mac = %entry.mac,
                ipv4 = %entry.ipv4,
                hostname = %entry.hostname,
                "[dry-run] dhcp {} entry",
                action
            );
        } else {
            info!(id = %entry.id, "[dry-run] dhcp disabled, skipping {} entry", action);
        }
        times.add_network_config_since(started);
    }
}

#[async_trait]
impl DataplaneBackend for DryRunBackend {
    async fn configure_port(&self, request: &PortRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(
            port = %request.port_id,
            interface = %request.interface_name,
            bridge = %self.bridge,
            cidr = %request.cidr,
            mac = %request.mac,
            tunnel_id = %request.tunnel_id,
            overlay = request.overlay_gateway.is_some(),
            "[dry-run] configure port"
        );
        times.add_dataplane_since(started);
        Ok(())
    }

    async fn delete_port(&self, request: &PortRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(
            port = %request.port_id,
            interface = %request.interface_name,
            bridge = %self.bridge,
            "[dry-run] delete port"
        );
        times.add_dataplane_since(started);
        Ok(())
    }

    async fn create_update_neighbor(
        &self,
        request: &NeighborRequest,
        times: &mut ProgrammingTimes,
    ) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(
            neighbor = %request.neighbor_id,
            ip = %request.ip,
            mac = %request.mac,
            host = %request.host_ip,
            tunnel_id = %request.tunnel_id,
            "[dry-run] create/update neighbor"
        );
        times.add_dataplane_since(started);
        Ok(())
    }

    async fn delete_neighbor(&self, request: &NeighborRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(neighbor = %request.neighbor_id, ip = %request.ip, "[dry-run] delete neighbor");
        times.add_dataplane_since(started);
        Ok(())
    }

    async fn create_neighbor_host_dvr(
        &self,
        request: &HostDvrRequest,
        times: &mut ProgrammingTimes,
    ) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(
            neighbor = %request.neighbor_id,
            subnet = %request.subnet_id,
            tunnel_id = %request.tunnel_id,
            host_dvr_mac = %request.host_dvr_mac,
            gateway_mac = %request.gateway_mac,
            "[dry-run] create host DVR neighbor"
        );
        times.add_dataplane_since(started);
        Ok(())
    }

    async fn create_router(&self, request: &RouterRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(
            router = %request.router_id,
            host_dvr_mac = %request.host_dvr_mac,
            subnets = request.subnets.len(),
            "[dry-run] create router"
        );
        times.add_dataplane_since(started);
        Ok(())
    }

    async fn delete_router(&self, router_id: &str, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        info!(router = %router_id, "[dry-run] delete router");
        times.add_dataplane_since(started);
        Ok(())
    }
}

#[async_trait]
impl DhcpBackend for DryRunBackend {
    async fn add_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dhcp("add", entry, times);
        Ok(())
    }

    async fn update_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dhcp("update", entry, times);
        Ok(())
    }

    async fn delete_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dhcp("delete", entry, times);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncagent_types::MacAddress;

    #[tokio::test]
    async fn test_dry_run_never_fails() {
        let backend = DryRunBackend::new("br-int", false);
        let mut times = ProgrammingTimes::default();
        let entry = DhcpEntry {
            id: "d1".to_string(),
            mac: MacAddress::new([0xfa, 0x16, 0x3e, 0, 0, 1]),
            ipv4: "10.0.0.5".parse().unwrap(),
            ipv6: None,
            hostname: "vm-1".to_string(),
        };

        assert!(backend.add_entry(&entry, &mut times).await.is_ok());
        assert!(backend.delete_entry(&entry, &mut times).await.is_ok());
        assert!(backend.delete_router("r1", &mut times).await.is_ok());
        assert_eq!(backend.bridge(), "br-int");
    }
}
