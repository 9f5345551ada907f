//! Instrumented backends and handlers
//!
//! [`RecordingBackend`] stands in for the dataplane and DHCP server and
//! keeps every request it receives. [`CountingHandler`] replaces the whole
//! programmer so scheduler behaviour can be observed directly.

use async_trait::async_trait;
use ncagent_core::{
    BackendError, DataplaneBackend, DhcpBackend, DhcpEntry, HostDvrRequest, NeighborRequest,
    Outcome, PortRequest, ProgrammingTimes, ResourceHandler, ReturnCode, RouterRequest,
};
use ncagent_types::{
    DhcpState, GoalStateBatch, NeighborState, PortState, ResourceType, RouterState, SubnetState,
    VpcState,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// One request received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ConfigurePort(PortRequest),
    DeletePort(PortRequest),
    UpsertNeighbor(NeighborRequest),
    DeleteNeighbor(NeighborRequest),
    HostDvrNeighbor(HostDvrRequest),
    CreateRouter(RouterRequest),
    DeleteRouter(String),
    AddDhcp(DhcpEntry),
    UpdateDhcp(DhcpEntry),
    DeleteDhcp(DhcpEntry),
}

impl BackendCall {
    pub fn resource_id(&self) -> &str {
        match self {
            BackendCall::ConfigurePort(r) | BackendCall::DeletePort(r) => &r.port_id,
            BackendCall::UpsertNeighbor(r) | BackendCall::DeleteNeighbor(r) => &r.neighbor_id,
            BackendCall::HostDvrNeighbor(r) => &r.neighbor_id,
            BackendCall::CreateRouter(r) => &r.router_id,
            BackendCall::DeleteRouter(id) => id,
            BackendCall::AddDhcp(e) | BackendCall::UpdateDhcp(e) | BackendCall::DeleteDhcp(e) => &e.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendCall::ConfigurePort(_) => "configure_port",
            BackendCall::DeletePort(_) => "delete_port",
            BackendCall::UpsertNeighbor(_) => "create_update_neighbor",
            BackendCall::DeleteNeighbor(_) => "delete_neighbor",
            BackendCall::HostDvrNeighbor(_) => "create_neighbor_host_dvr",
            BackendCall::CreateRouter(_) => "create_router",
            BackendCall::DeleteRouter(_) => "delete_router",
            BackendCall::AddDhcp(_) => "add_entry",
            BackendCall::UpdateDhcp(_) => "update_entry",
            BackendCall::DeleteDhcp(_) => "delete_entry",
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<HashMap<String, BackendError>>,
}

/// Dataplane and DHCP backend that records requests.
///
/// Clones share the same recording, so one instance can serve as both
/// backends of a programmer.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Recording>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call for `resource_id` fails with `error` from now on.
    pub fn fail_with(&self, resource_id: impl Into<String>, error: BackendError) {
        self.inner.failures.lock().insert(resource_id.into(), error);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.calls.lock().clone()
    }

    pub fn calls_for(&self, resource_id: &str) -> Vec<BackendCall> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|call| call.resource_id() == resource_id)
            .cloned()
            .collect()
    }

    /// Names of the calls made, in order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.inner.calls.lock().iter().map(BackendCall::name).collect()
    }

    pub fn clear(&self) {
        self.inner.calls.lock().clear();
    }

    fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let scripted = self.inner.failures.lock().get(call.resource_id()).cloned();
        debug!(call = call.name(), id = call.resource_id(), "backend call");
        self.inner.calls.lock().push(call);
        match scripted {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn dataplane(&self, call: BackendCall, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.record(call);
        times.add_dataplane_since(started);
        result
    }

    fn dhcp(&self, call: BackendCall, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.record(call);
        times.add_network_config_since(started);
        result
    }
}

#[async_trait]
impl DataplaneBackend for RecordingBackend {
    async fn configure_port(&self, request: &PortRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dataplane(BackendCall::ConfigurePort(request.clone()), times)
    }

    async fn delete_port(&self, request: &PortRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dataplane(BackendCall::DeletePort(request.clone()), times)
    }

    async fn create_update_neighbor(
        &self,
        request: &NeighborRequest,
        times: &mut ProgrammingTimes,
    ) -> Result<(), BackendError> {
        self.dataplane(BackendCall::UpsertNeighbor(request.clone()), times)
    }

    async fn delete_neighbor(&self, request: &NeighborRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dataplane(BackendCall::DeleteNeighbor(request.clone()), times)
    }

    async fn create_neighbor_host_dvr(
        &self,
        request: &HostDvrRequest,
        times: &mut ProgrammingTimes,
    ) -> Result<(), BackendError> {
        self.dataplane(BackendCall::HostDvrNeighbor(request.clone()), times)
    }

    async fn create_router(&self, request: &RouterRequest, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dataplane(BackendCall::CreateRouter(request.clone()), times)
    }

    async fn delete_router(&self, router_id: &str, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dataplane(BackendCall::DeleteRouter(router_id.to_string()), times)
    }
}

#[async_trait]
impl DhcpBackend for RecordingBackend {
    async fn add_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dhcp(BackendCall::AddDhcp(entry.clone()), times)
    }

    async fn update_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dhcp(BackendCall::UpdateDhcp(entry.clone()), times)
    }

    async fn delete_entry(&self, entry: &DhcpEntry, times: &mut ProgrammingTimes) -> Result<(), BackendError> {
        self.dhcp(BackendCall::DeleteDhcp(entry.clone()), times)
    }
}

/// Decrements the in-flight counter however the call ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resource handler that counts calls and tracks peak concurrency.
///
/// Returns SUCCESS unless a code is scripted for the resource ID. IDs can
/// also be scripted to panic or to never complete.
#[derive(Debug, Default)]
pub struct CountingHandler {
    delay: Duration,
    codes: HashMap<String, ReturnCode>,
    panics: HashSet<String>,
    hangs: HashSet<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<HashMap<String, usize>>,
    order: Mutex<Vec<(ResourceType, String)>>,
}

impl CountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps this long before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_code(mut self, id: impl Into<String>, code: ReturnCode) -> Self {
        self.codes.insert(id.into(), code);
        self
    }

    pub fn panicking_on(mut self, id: impl Into<String>) -> Self {
        self.panics.insert(id.into());
        self
    }

    pub fn hanging_on(mut self, id: impl Into<String>) -> Self {
        self.hangs.insert(id.into());
        self
    }

    /// Highest number of calls observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().get(id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Kinds in the order their first call started.
    pub fn kind_order(&self) -> Vec<ResourceType> {
        let mut kinds: Vec<ResourceType> = Vec::new();
        for (kind, _) in self.order.lock().iter() {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    async fn handle(&self, kind: ResourceType, id: &str) -> Outcome {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak.fetch_max(running, Ordering::SeqCst);

        *self.calls.lock().entry(id.to_string()).or_insert(0) += 1;
        self.order.lock().push((kind, id.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.hangs.contains(id) {
            std::future::pending::<()>().await;
        }
        if self.panics.contains(id) {
            panic!("scripted panic for {}", id);
        }

        let code = self.codes.get(id).copied().unwrap_or(ReturnCode::SUCCESS);
        Outcome::with_times(code, Duration::from_micros(10), Duration::from_micros(5))
    }
}

#[async_trait]
impl ResourceHandler for CountingHandler {
    async fn update_vpc_state(&self, id: &str, _state: &VpcState, _batch: &GoalStateBatch) -> Outcome {
        self.handle(ResourceType::Vpc, id).await
    }

    async fn update_subnet_state(&self, id: &str, _state: &SubnetState, _batch: &GoalStateBatch) -> Outcome {
        self.handle(ResourceType::Subnet, id).await
    }

    async fn update_port_state(&self, id: &str, _state: &PortState, _batch: &GoalStateBatch) -> Outcome {
        self.handle(ResourceType::Port, id).await
    }

    async fn update_neighbor_state(
        &self,
        id: &str,
        _state: &NeighborState,
        _batch: &GoalStateBatch,
    ) -> Outcome {
        self.handle(ResourceType::Neighbor, id).await
    }

    async fn update_router_state(&self, id: &str, _state: &RouterState, _batch: &GoalStateBatch) -> Outcome {
        self.handle(ResourceType::Router, id).await
    }

    async fn update_dhcp_state(&self, id: &str, _state: &DhcpState, _batch: &GoalStateBatch) -> Outcome {
        self.handle(ResourceType::Dhcp, id).await
    }
}
