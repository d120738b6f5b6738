//! Test doubles for the domain ports

use crate::controlplane::backends::MemoryPersistence;
use crate::domain::model::{
    ByonNode, Cloud, CloudType, Cluster, EdgeNode, Hardware, Image, Location, NodeCandidate,
};
use crate::domain::ports::{
    CloudDomainService, ClusterDomainService, EdgeDomainService, PersistenceGateway,
    ResourceManagerGateway, SessionValidator,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn cloud(id: &str, cloud_type: CloudType) -> Cloud {
    Cloud {
        cloud_id: id.into(),
        cloud_type,
        owner: "tester".into(),
        created_at: chrono::Utc::now(),
    }
}

pub(crate) fn cluster(name: &str) -> Cluster {
    Cluster {
        cluster_id: format!("{}-id", name),
        name: name.into(),
        node_candidate_id: None,
        node_sources: vec![],
    }
}

pub(crate) fn edge_node(id: &str) -> EdgeNode {
    EdgeNode {
        id: id.into(),
        name: format!("{}-device", id),
        job_id: "job".into(),
        node_candidate_id: format!("edge-nc-{}", id),
        node_source: format!("ns-{}", id),
    }
}

// =============================================================================
// Sessions
// =============================================================================

pub(crate) struct FakeSessions {
    active: bool,
}

impl FakeSessions {
    pub(crate) fn new(active: bool) -> Self {
        Self { active }
    }
}

#[async_trait]
impl SessionValidator for FakeSessions {
    async fn is_active(&self, _session_id: &str) -> Result<bool> {
        Ok(self.active)
    }
}

// =============================================================================
// Recording Store
// =============================================================================

/// Memory store that records every call and can be told to fail some
pub(crate) struct RecordingStore {
    inner: MemoryPersistence,
    ops: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    purge_ok: AtomicBool,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryPersistence::new(),
            ops: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            purge_ok: AtomicBool::new(true),
        }
    }

    pub(crate) fn inner(&self) -> &MemoryPersistence {
        &self.inner
    }

    /// Make every later call to `op` fail with a persistence error
    pub(crate) fn fail_on(&self, op: &'static str) {
        self.failing.lock().insert(op);
    }

    /// Value returned by later purges
    pub(crate) fn purge_result(&self, ok: bool) {
        self.purge_ok.store(ok, Ordering::SeqCst);
    }

    /// Save operations in call order
    pub(crate) fn saves(&self) -> Vec<&'static str> {
        self.ops
            .lock()
            .iter()
            .copied()
            .filter(|op| op.starts_with("save_"))
            .collect()
    }

    pub(crate) fn purge_calls(&self) -> usize {
        self.ops.lock().iter().filter(|op| **op == "purge_all").count()
    }

    fn enter(&self, op: &'static str) -> Result<()> {
        self.ops.lock().push(op);
        if self.failing.lock().contains(op) {
            return Err(Error::Persistence(format!("{} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for RecordingStore {
    async fn list_clouds(&self) -> Result<Vec<Cloud>> {
        self.enter("list_clouds")?;
        self.inner.list_clouds().await
    }

    async fn get_cloud(&self, cloud_id: &str) -> Result<Option<Cloud>> {
        self.enter("get_cloud")?;
        self.inner.get_cloud(cloud_id).await
    }

    async fn save_cloud(&self, cloud: Cloud) -> Result<()> {
        self.enter("save_cloud")?;
        self.inner.save_cloud(cloud).await
    }

    async fn delete_cloud(&self, cloud_id: &str) -> Result<bool> {
        self.enter("delete_cloud")?;
        self.inner.delete_cloud(cloud_id).await
    }

    async fn list_node_candidates(&self) -> Result<Vec<NodeCandidate>> {
        self.enter("list_node_candidates")?;
        self.inner.list_node_candidates().await
    }

    async fn get_node_candidate(&self, id: &str) -> Result<Option<NodeCandidate>> {
        self.enter("get_node_candidate")?;
        self.inner.get_node_candidate(id).await
    }

    async fn save_node_candidate(&self, candidate: NodeCandidate) -> Result<()> {
        self.enter("save_node_candidate")?;
        self.inner.save_node_candidate(candidate).await
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        self.enter("get_image")?;
        self.inner.get_image(id).await
    }

    async fn save_image(&self, image: Image) -> Result<()> {
        self.enter("save_image")?;
        self.inner.save_image(image).await
    }

    async fn delete_image(&self, id: &str) -> Result<bool> {
        self.enter("delete_image")?;
        self.inner.delete_image(id).await
    }

    async fn get_hardware(&self, id: &str) -> Result<Option<Hardware>> {
        self.enter("get_hardware")?;
        self.inner.get_hardware(id).await
    }

    async fn save_hardware(&self, hardware: Hardware) -> Result<()> {
        self.enter("save_hardware")?;
        self.inner.save_hardware(hardware).await
    }

    async fn delete_hardware(&self, id: &str) -> Result<bool> {
        self.enter("delete_hardware")?;
        self.inner.delete_hardware(id).await
    }

    async fn get_location(&self, id: &str) -> Result<Option<Location>> {
        self.enter("get_location")?;
        self.inner.get_location(id).await
    }

    async fn save_location(&self, location: Location) -> Result<()> {
        self.enter("save_location")?;
        self.inner.save_location(location).await
    }

    async fn delete_location(&self, id: &str) -> Result<bool> {
        self.enter("delete_location")?;
        self.inner.delete_location(id).await
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        self.enter("list_clusters")?;
        self.inner.list_clusters().await
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        self.enter("get_cluster")?;
        self.inner.get_cluster(name).await
    }

    async fn save_cluster(&self, cluster: Cluster) -> Result<()> {
        self.enter("save_cluster")?;
        self.inner.save_cluster(cluster).await
    }

    async fn delete_cluster(&self, name: &str) -> Result<bool> {
        self.enter("delete_cluster")?;
        PersistenceGateway::delete_cluster(&self.inner, name).await
    }

    async fn list_byon_nodes(&self) -> Result<Vec<ByonNode>> {
        self.enter("list_byon_nodes")?;
        self.inner.list_byon_nodes().await
    }

    async fn get_byon_node(&self, id: &str) -> Result<Option<ByonNode>> {
        self.enter("get_byon_node")?;
        self.inner.get_byon_node(id).await
    }

    async fn save_byon_node(&self, node: ByonNode) -> Result<()> {
        self.enter("save_byon_node")?;
        self.inner.save_byon_node(node).await
    }

    async fn list_edge_nodes(&self) -> Result<Vec<EdgeNode>> {
        self.enter("list_edge_nodes")?;
        self.inner.list_edge_nodes().await
    }

    async fn get_edge_node(&self, id: &str) -> Result<Option<EdgeNode>> {
        self.enter("get_edge_node")?;
        self.inner.get_edge_node(id).await
    }

    async fn save_edge_node(&self, node: EdgeNode) -> Result<()> {
        self.enter("save_edge_node")?;
        self.inner.save_edge_node(node).await
    }

    async fn delete_edge_node(&self, id: &str) -> Result<bool> {
        self.enter("delete_edge_node")?;
        PersistenceGateway::delete_edge_node(&self.inner, id).await
    }

    async fn purge_all(&self, session_id: &str) -> Result<bool> {
        self.enter("purge_all")?;
        if !self.purge_ok.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.purge_all(session_id).await
    }
}

// =============================================================================
// Resource Manager
// =============================================================================

/// What the resource manager reports for the scripted pool on one poll
#[derive(Debug, Clone, Default)]
pub(crate) struct PoolView {
    deployed: bool,
    hosts: Vec<String>,
    states: Vec<String>,
}

impl PoolView {
    pub(crate) fn not_deployed() -> Self {
        Self::default()
    }

    pub(crate) fn hosts(hosts: &[&str]) -> Self {
        Self {
            deployed: true,
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            states: vec![],
        }
    }

    pub(crate) fn with_states(mut self, states: &[&str]) -> Self {
        self.states = states.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Resource manager serving one pool through a script of views.
///
/// Each `deployed_pool_names` call advances to the next view; the last view
/// repeats. The pool always shows up in `all_pool_names`.
pub(crate) struct FakeResourceManager {
    pool: String,
    views: Vec<PoolView>,
    cursor: AtomicUsize,
    deployed_calls: AtomicUsize,
    hostname_calls: AtomicUsize,
    state_calls: AtomicUsize,
    removed: Mutex<Vec<(String, bool)>>,
    undeployed: Mutex<Vec<(String, bool)>>,
    mutation_error: Mutex<Option<fn() -> Error>>,
}

impl FakeResourceManager {
    pub(crate) fn scripted(pool: &str, views: Vec<PoolView>) -> Self {
        assert!(!views.is_empty(), "script needs at least one view");
        Self {
            pool: pool.into(),
            views,
            cursor: AtomicUsize::new(0),
            deployed_calls: AtomicUsize::new(0),
            hostname_calls: AtomicUsize::new(0),
            state_calls: AtomicUsize::new(0),
            removed: Mutex::new(Vec::new()),
            undeployed: Mutex::new(Vec::new()),
            mutation_error: Mutex::new(None),
        }
    }

    pub(crate) fn fail_mutations_with(&self, make: fn() -> Error) {
        *self.mutation_error.lock() = Some(make);
    }

    pub(crate) fn deployed_calls(&self) -> usize {
        self.deployed_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn hostname_calls(&self) -> usize {
        self.hostname_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn state_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn removed(&self) -> Vec<(String, bool)> {
        self.removed.lock().clone()
    }

    pub(crate) fn undeployed(&self) -> Vec<(String, bool)> {
        self.undeployed.lock().clone()
    }

    fn current(&self) -> &PoolView {
        let index = self.cursor.load(Ordering::SeqCst).saturating_sub(1);
        &self.views[index.min(self.views.len() - 1)]
    }

    fn mutation(&self) -> Result<()> {
        match *self.mutation_error.lock() {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceManagerGateway for FakeResourceManager {
    async fn deployed_pool_names(&self) -> Result<BTreeSet<String>> {
        self.deployed_calls.fetch_add(1, Ordering::SeqCst);
        self.cursor.fetch_add(1, Ordering::SeqCst);
        let mut names = BTreeSet::new();
        if self.current().deployed {
            names.insert(self.pool.clone());
        }
        Ok(names)
    }

    async fn all_pool_names(&self) -> Result<BTreeSet<String>> {
        Ok(BTreeSet::from([self.pool.clone()]))
    }

    async fn hostnames_of(&self, pool: &str) -> Result<Vec<String>> {
        self.hostname_calls.fetch_add(1, Ordering::SeqCst);
        if pool != self.pool {
            return Ok(vec![]);
        }
        Ok(self.current().hosts.clone())
    }

    async fn states_of(&self, pool: &str) -> Result<Vec<String>> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        if pool != self.pool {
            return Ok(vec![]);
        }
        Ok(self.current().states.clone())
    }

    async fn remove_pool(&self, pool: &str, preempt: bool) -> Result<()> {
        self.mutation()?;
        self.removed.lock().push((pool.to_string(), preempt));
        Ok(())
    }

    async fn undeploy_pool(&self, pool: &str, preempt: bool) -> Result<()> {
        self.mutation()?;
        self.undeployed.lock().push((pool.to_string(), preempt));
        Ok(())
    }
}

// =============================================================================
// Domain Services
// =============================================================================

#[derive(Default)]
pub(crate) struct RecordingClusterService {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingClusterService {
    /// Report `false` for the named clusters
    pub(crate) fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ClusterDomainService for RecordingClusterService {
    async fn delete_cluster(&self, _session_id: &str, cluster_name: &str) -> Result<bool> {
        self.calls.lock().push(cluster_name.to_string());
        Ok(!self.failing.contains(cluster_name))
    }
}

#[derive(Default)]
pub(crate) struct RecordingEdgeService {
    erroring: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingEdgeService {
    /// Return an error for the named edge devices
    pub(crate) fn erroring(ids: &[&str]) -> Self {
        Self {
            erroring: ids.iter().map(|id| id.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl EdgeDomainService for RecordingEdgeService {
    async fn delete_edge_node(&self, _session_id: &str, edge_id: &str) -> Result<bool> {
        self.calls.lock().push(edge_id.to_string());
        if self.erroring.contains(edge_id) {
            return Err(Error::NotConnected(format!("edge device {} unreachable", edge_id)));
        }
        Ok(true)
    }
}

#[derive(Default)]
pub(crate) struct RecordingCloudService {
    discovering: bool,
    unreachable: bool,
    rejecting: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingCloudService {
    /// Report discovery as still running
    pub(crate) fn discovering() -> Self {
        Self {
            discovering: true,
            ..Default::default()
        }
    }

    /// Fail the discovery check itself
    pub(crate) fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    /// Report every bulk removal as failed
    pub(crate) fn rejecting() -> Self {
        Self {
            rejecting: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CloudDomainService for RecordingCloudService {
    async fn is_async_discovery_in_progress(&self, _session_id: &str) -> Result<bool> {
        if self.unreachable {
            return Err(Error::Internal("discovery service unreachable".into()));
        }
        Ok(self.discovering)
    }

    async fn remove_clouds(
        &self,
        _session_id: &str,
        cloud_ids: &[String],
        _preempt: bool,
    ) -> Result<bool> {
        self.calls.lock().push(cloud_ids.to_vec());
        Ok(!self.rejecting)
    }
}
