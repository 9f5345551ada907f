//! Resource handler interface.

use crate::task::Outcome;
use async_trait::async_trait;
use ncagent_types::{
    DhcpConfiguration, DhcpState, GoalStateBatch, NeighborConfiguration, NeighborState,
    OperationType, PortConfiguration, PortState, ResourceConfig, ResourceState, ResourceType,
    RouterConfiguration, RouterState, SubnetConfiguration, SubnetState, VpcConfiguration,
    VpcState,
};
use std::sync::Arc;

/// Programs one resource of each kind into the local dataplane.
///
/// Every method receives the resource ID (taken from the map key or the
/// payload, depending on the batch shape), the desired state, and the whole
/// batch for cross-reference lookups. Implementations report failures
/// through [`Outcome::code`]; they must not panic, but a panic is contained
/// by the scheduler and recorded as a fault.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn update_vpc_state(&self, id: &str, state: &VpcState, batch: &GoalStateBatch) -> Outcome;

    async fn update_subnet_state(&self, id: &str, state: &SubnetState, batch: &GoalStateBatch) -> Outcome;

    async fn update_port_state(&self, id: &str, state: &PortState, batch: &GoalStateBatch) -> Outcome;

    async fn update_neighbor_state(
        &self,
        id: &str,
        state: &NeighborState,
        batch: &GoalStateBatch,
    ) -> Outcome;

    async fn update_router_state(&self, id: &str, state: &RouterState, batch: &GoalStateBatch) -> Outcome;

    async fn update_dhcp_state(&self, id: &str, state: &DhcpState, batch: &GoalStateBatch) -> Outcome;
}

#[async_trait]
impl<T: ResourceHandler + ?Sized> ResourceHandler for Arc<T> {
    async fn update_vpc_state(&self, id: &str, state: &VpcState, batch: &GoalStateBatch) -> Outcome {
        (**self).update_vpc_state(id, state, batch).await
    }

    async fn update_subnet_state(&self, id: &str, state: &SubnetState, batch: &GoalStateBatch) -> Outcome {
        (**self).update_subnet_state(id, state, batch).await
    }

    async fn update_port_state(&self, id: &str, state: &PortState, batch: &GoalStateBatch) -> Outcome {
        (**self).update_port_state(id, state, batch).await
    }

    async fn update_neighbor_state(
        &self,
        id: &str,
        state: &NeighborState,
        batch: &GoalStateBatch,
    ) -> Outcome {
        (**self).update_neighbor_state(id, state, batch).await
    }

    async fn update_router_state(&self, id: &str, state: &RouterState, batch: &GoalStateBatch) -> Outcome {
        (**self).update_router_state(id, state, batch).await
    }

    async fn update_dhcp_state(&self, id: &str, state: &DhcpState, batch: &GoalStateBatch) -> Outcome {
        (**self).update_dhcp_state(id, state, batch).await
    }
}

/// One unit of scheduled work: a resource state of a handler-backed kind.
#[derive(Debug, Clone)]
pub enum WorkItem {
    Vpc(VpcState),
    Subnet(SubnetState),
    Port(PortState),
    Neighbor(NeighborState),
    Router(RouterState),
    Dhcp(DhcpState),
}

impl WorkItem {
    pub fn kind(&self) -> ResourceType {
        match self {
            WorkItem::Vpc(_) => ResourceType::Vpc,
            WorkItem::Subnet(_) => ResourceType::Subnet,
            WorkItem::Port(_) => ResourceType::Port,
            WorkItem::Neighbor(_) => ResourceType::Neighbor,
            WorkItem::Router(_) => ResourceType::Router,
            WorkItem::Dhcp(_) => ResourceType::Dhcp,
        }
    }

    pub fn operation(&self) -> OperationType {
        match self {
            WorkItem::Vpc(s) => s.operation_type,
            WorkItem::Subnet(s) => s.operation_type,
            WorkItem::Port(s) => s.operation_type,
            WorkItem::Neighbor(s) => s.operation_type,
            WorkItem::Router(s) => s.operation_type,
            WorkItem::Dhcp(s) => s.operation_type,
        }
    }

    /// Calls the handler method for this item's kind.
    pub async fn invoke<H>(&self, handler: &H, id: &str, batch: &GoalStateBatch) -> Outcome
    where
        H: ResourceHandler + ?Sized,
    {
        match self {
            WorkItem::Vpc(state) => handler.update_vpc_state(id, state, batch).await,
            WorkItem::Subnet(state) => handler.update_subnet_state(id, state, batch).await,
            WorkItem::Port(state) => handler.update_port_state(id, state, batch).await,
            WorkItem::Neighbor(state) => handler.update_neighbor_state(id, state, batch).await,
            WorkItem::Router(state) => handler.update_router_state(id, state, batch).await,
            WorkItem::Dhcp(state) => handler.update_dhcp_state(id, state, batch).await,
        }
    }
}

/// Payload kinds that have a handler method.
pub trait Dispatchable: ResourceConfig {
    fn work_item(state: ResourceState<Self>) -> WorkItem;
}

macro_rules! dispatchable {
    ($($config:ty => $variant:ident),* $(,)?) => {
        $(
            impl Dispatchable for $config {
                fn work_item(state: ResourceState<Self>) -> WorkItem {
                    WorkItem::$variant(state)
                }
            }
        )*
    };
}

dispatchable! {
    VpcConfiguration => Vpc,
    SubnetConfiguration => Subnet,
    PortConfiguration => Port,
    NeighborConfiguration => Neighbor,
    RouterConfiguration => Router,
    DhcpConfiguration => Dhcp,
}
