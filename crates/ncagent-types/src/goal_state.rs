//! Goal-state batches in both wire shapes, and the uniform view over them.
//!
//! Controllers send a goal state either as ordered lists (each payload
//! carries its own `id`) or as maps keyed by resource ID. [`Collection`] is
//! the one place that knows the difference; everything downstream iterates
//! `(id, &state)` pairs.

use crate::resources::*;
use serde::{Deserialize, Serialize};
use std::collections::{hash_map, HashMap};
use std::slice;

/// Ordered-list goal state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalState {
    pub format_version: u32,
    pub vpc_states: Vec<VpcState>,
    pub subnet_states: Vec<SubnetState>,
    pub port_states: Vec<PortState>,
    pub neighbor_states: Vec<NeighborState>,
    pub security_group_states: Vec<SecurityGroupState>,
    pub dhcp_states: Vec<DhcpState>,
    pub router_states: Vec<RouterState>,
    pub gateway_states: Vec<GatewayState>,
}

/// Keyed-map goal state. Keys are resource IDs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalStateV2 {
    pub format_version: u32,
    pub vpc_states: HashMap<String, VpcState>,
    pub subnet_states: HashMap<String, SubnetState>,
    pub port_states: HashMap<String, PortState>,
    pub neighbor_states: HashMap<String, NeighborState>,
    pub security_group_states: HashMap<String, SecurityGroupState>,
    pub dhcp_states: HashMap<String, DhcpState>,
    pub router_states: HashMap<String, RouterState>,
    pub gateway_states: HashMap<String, GatewayState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchShape {
    Listed,
    Keyed,
}

/// One goal-state message in whichever shape it arrived.
///
/// Generic deserialization tries the keyed shape first; any list-valued
/// collection makes that fail and the listed shape is used instead. A
/// message with no collections at all is equally valid as either. Use
/// [`GoalStateBatch::from_json`] for input from controllers: it picks the
/// shape up front, so field errors keep their message and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GoalStateBatch {
    Keyed(GoalStateV2),
    Listed(GoalState),
}

impl Default for GoalStateBatch {
    fn default() -> Self {
        GoalStateBatch::Listed(GoalState::default())
    }
}

impl From<GoalState> for GoalStateBatch {
    fn from(state: GoalState) -> Self {
        GoalStateBatch::Listed(state)
    }
}

impl From<GoalStateV2> for GoalStateBatch {
    fn from(state: GoalStateV2) -> Self {
        GoalStateBatch::Keyed(state)
    }
}

macro_rules! collection_accessors {
    ($($accessor:ident: $config:ty => $field:ident),* $(,)?) => {
        impl GoalStateBatch {
            $(
                pub fn $accessor(&self) -> Collection<'_, $config> {
                    match self {
                        GoalStateBatch::Listed(state) => Collection::List(&state.$field),
                        GoalStateBatch::Keyed(state) => Collection::Map(&state.$field),
                    }
                }
            )*
        }
    };
}

collection_accessors! {
    vpcs: VpcConfiguration => vpc_states,
    subnets: SubnetConfiguration => subnet_states,
    ports: PortConfiguration => port_states,
    neighbors: NeighborConfiguration => neighbor_states,
    security_groups: SecurityGroupConfiguration => security_group_states,
    dhcps: DhcpConfiguration => dhcp_states,
    routers: RouterConfiguration => router_states,
    gateways: GatewayConfiguration => gateway_states,
}

impl GoalStateBatch {
    /// Parses a JSON goal state in either shape.
    ///
    /// Any map-valued `*_states` field marks the keyed shape; otherwise the
    /// document is read as listed.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let keyed = value.as_object().is_some_and(|fields| {
            fields
                .iter()
                .any(|(name, field)| name.ends_with("_states") && field.is_object())
        });

        if keyed {
            serde_json::from_str(text).map(GoalStateBatch::Keyed)
        } else {
            serde_json::from_str(text).map(GoalStateBatch::Listed)
        }
    }

    pub fn shape(&self) -> BatchShape {
        match self {
            GoalStateBatch::Listed(_) => BatchShape::Listed,
            GoalStateBatch::Keyed(_) => BatchShape::Keyed,
        }
    }

    pub fn format_version(&self) -> u32 {
        match self {
            GoalStateBatch::Listed(state) => state.format_version,
            GoalStateBatch::Keyed(state) => state.format_version,
        }
    }

    /// Borrows the collection for the payload type `C`.
    pub fn collection<C: ResourceConfig>(&self) -> Collection<'_, C> {
        C::collection(self)
    }

    /// Number of resources of the given kind.
    pub fn count(&self, kind: ResourceType) -> usize {
        match kind {
            ResourceType::Vpc => self.vpcs().len(),
            ResourceType::Subnet => self.subnets().len(),
            ResourceType::Port => self.ports().len(),
            ResourceType::Neighbor => self.neighbors().len(),
            ResourceType::SecurityGroup => self.security_groups().len(),
            ResourceType::Dhcp => self.dhcps().len(),
            ResourceType::Router => self.routers().len(),
            ResourceType::Gateway => self.gateways().len(),
        }
    }

    /// Total number of resource states across all kinds.
    pub fn resource_count(&self) -> usize {
        ResourceType::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    /// Re-encodes the batch in the keyed-map shape.
    ///
    /// List entries are keyed by their configuration `id`; a later entry
    /// with a duplicate ID replaces the earlier one.
    pub fn to_keyed(&self) -> GoalStateV2 {
        match self {
            GoalStateBatch::Keyed(state) => state.clone(),
            GoalStateBatch::Listed(state) => GoalStateV2 {
                format_version: state.format_version,
                vpc_states: keyed(&state.vpc_states),
                subnet_states: keyed(&state.subnet_states),
                port_states: keyed(&state.port_states),
                neighbor_states: keyed(&state.neighbor_states),
                security_group_states: keyed(&state.security_group_states),
                dhcp_states: keyed(&state.dhcp_states),
                router_states: keyed(&state.router_states),
                gateway_states: keyed(&state.gateway_states),
            },
        }
    }
}

fn keyed<C: ResourceConfig>(states: &[ResourceState<C>]) -> HashMap<String, ResourceState<C>> {
    states
        .iter()
        .map(|state| (state.configuration.id().to_string(), state.clone()))
        .collect()
}

/// A borrowed view over one resource kind of a batch.
///
/// Iteration yields `(id, &state)`. For the list shape the ID comes from the
/// payload; for the map shape it is the key, so a keyed payload may leave
/// its own `id` empty.
#[derive(Debug)]
pub enum Collection<'a, C> {
    List(&'a [ResourceState<C>]),
    Map(&'a HashMap<String, ResourceState<C>>),
}

impl<C> Clone for Collection<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Collection<'_, C> {}

impl<'a, C: ResourceConfig> Collection<'a, C> {
    pub fn len(&self) -> usize {
        match self {
            Collection::List(states) => states.len(),
            Collection::Map(states) => states.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> CollectionIter<'a, C> {
        match *self {
            Collection::List(states) => CollectionIter::List(states.iter()),
            Collection::Map(states) => CollectionIter::Map(states.iter()),
        }
    }

    /// Looks up a resource by ID. Constant time for the map shape, a scan
    /// for the list shape.
    pub fn get(&self, id: &str) -> Option<&'a ResourceState<C>> {
        match *self {
            Collection::List(states) => states.iter().find(|s| s.configuration.id() == id),
            Collection::Map(states) => states.get(id),
        }
    }
}

impl<'a, C: ResourceConfig> IntoIterator for Collection<'a, C> {
    type Item = (&'a str, &'a ResourceState<C>);
    type IntoIter = CollectionIter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub enum CollectionIter<'a, C> {
    List(slice::Iter<'a, ResourceState<C>>),
    Map(hash_map::Iter<'a, String, ResourceState<C>>),
}

impl<'a, C: ResourceConfig> Iterator for CollectionIter<'a, C> {
    type Item = (&'a str, &'a ResourceState<C>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            CollectionIter::List(iter) => iter
                .next()
                .map(|state| (state.configuration.id(), state)),
            CollectionIter::Map(iter) => iter.next().map(|(id, state)| (id.as_str(), state)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            CollectionIter::List(iter) => iter.size_hint(),
            CollectionIter::Map(iter) => iter.size_hint(),
        }
    }
}

impl<C: ResourceConfig> ExactSizeIterator for CollectionIter<'_, C> {}
