//! Read-only cross-reference lookups over one goal-state batch.
//!
//! Subnet, VPC and gateway entries that exist only so other resources can
//! refer to them carry the INFO operation. Lookups only match those entries.

use crate::error::ResolveError;
use ncagent_types::{
    Cidr, Collection, GatewayConfiguration, GatewayType, GoalStateBatch, NetworkType,
    OperationType, ResourceConfig, ResourceState, ResourceType, SubnetConfiguration,
    SubnetGateway, TunnelId, VpcConfiguration,
};

/// Reference data for one subnet, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetInfo {
    pub subnet_id: String,
    pub vpc_id: String,
    pub network_type: NetworkType,
    pub tunnel_id: TunnelId,
    pub cidr: Cidr,
    pub prefix_len: u8,
    /// Left unparsed; only some callers need it.
    pub gateway: Option<SubnetGateway>,
}

/// Lookups against a borrowed batch. Holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    batch: &'a GoalStateBatch,
}

impl<'a> Resolver<'a> {
    pub fn new(batch: &'a GoalStateBatch) -> Self {
        Resolver { batch }
    }

    /// Finds the INFO entry for `subnet_id` and validates its tunnel id and
    /// CIDR.
    pub fn find_subnet(&self, subnet_id: &str) -> Result<SubnetInfo, ResolveError> {
        let (id, config) = self
            .find_info::<SubnetConfiguration>(subnet_id)
            .ok_or_else(|| ResolveError::not_found(ResourceType::Subnet, subnet_id))?;

        let tunnel_id = TunnelId::new(config.tunnel_id)
            .map_err(|e| ResolveError::malformed(ResourceType::Subnet, id, "tunnel_id", e))?;
        let cidr: Cidr = config
            .cidr
            .parse()
            .map_err(|e| ResolveError::malformed(ResourceType::Subnet, id, "cidr", e))?;

        Ok(SubnetInfo {
            subnet_id: id.to_string(),
            vpc_id: config.vpc_id.clone(),
            network_type: config.network_type,
            tunnel_id,
            prefix_len: cidr.prefix_len(),
            cidr,
            gateway: config.gateway.clone(),
        })
    }

    pub fn find_vpc(&self, vpc_id: &str) -> Result<&'a VpcConfiguration, ResolveError> {
        self.find_info::<VpcConfiguration>(vpc_id)
            .map(|(_, config)| config)
            .ok_or_else(|| ResolveError::not_found(ResourceType::Vpc, vpc_id))
    }

    /// The first overlay gateway the VPC references, if any.
    ///
    /// Best effort: a missing VPC, an unknown gateway ID, or only non-overlay
    /// gateways all mean "no overlay support" rather than an error.
    pub fn find_overlay_gateway(&self, vpc_id: &str) -> Option<&'a GatewayConfiguration> {
        let vpc = self.find_vpc(vpc_id).ok()?;

        vpc.gateway_ids
            .iter()
            .filter_map(|gateway_id| self.find_info::<GatewayConfiguration>(gateway_id))
            .map(|(_, gateway)| gateway)
            .find(|gateway| gateway.gateway_type == GatewayType::Overlay)
    }

    fn find_info<C: ResourceConfig>(&self, id: &str) -> Option<(&'a str, &'a C)> {
        let collection: Collection<'a, C> = self.batch.collection();
        let is_info = |state: &ResourceState<C>| state.operation_type == OperationType::Info;

        match collection {
            Collection::Map(states) => states
                .get_key_value(id)
                .filter(|(_, state)| is_info(state))
                .map(|(key, state)| (key.as_str(), &state.configuration)),
            Collection::List(_) => collection
                .iter()
                .find(|(key, state)| *key == id && is_info(state))
                .map(|(key, state)| (key, &state.configuration)),
        }
    }
}
