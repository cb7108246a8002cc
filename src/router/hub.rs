use crate::catalog::DemoCatalog;
use crate::clusterer::{ClusteringEngine, KMeans};
use crate::router::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_CLUSTERING_DELAY, Router};
use crate::session::{CommandError, Envelope, Snapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Longest accepted channel name, in bytes
pub const MAX_CHANNEL_NAME_LEN: usize = 64;

/// Registry of independent demo channels, each with its own router.
pub struct ChannelHub {
    catalog: Arc<DemoCatalog>,
    engine: Arc<dyn ClusteringEngine>,
    clustering_delay: Duration,
    capacity: usize,
    routers: Mutex<HashMap<String, Arc<Router>>>,
}

impl ChannelHub {
    pub fn new(catalog: Arc<DemoCatalog>) -> Self {
        Self {
            catalog,
            engine: Arc::new(KMeans::new()),
            clustering_delay: DEFAULT_CLUSTERING_DELAY,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            routers: Mutex::new(HashMap::new()),
        }
    }

    /// Engine handed to every router created afterwards
    pub fn with_engine(mut self, engine: Arc<dyn ClusteringEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_clustering_delay(mut self, delay: Duration) -> Self {
        self.clustering_delay = delay;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn catalog(&self) -> &Arc<DemoCatalog> {
        &self.catalog
    }

    /// Router for `channel`, created in the waiting state on first use
    pub fn get_or_create(&self, channel: &str) -> Result<Arc<Router>, CommandError> {
        let name = validate_channel_name(channel)?;
        let mut routers = self.lock_routers();

        if let Some(router) = routers.get(name) {
            return Ok(Arc::clone(router));
        }

        info!(channel = name, "channel opened");
        let router = Arc::new(self.build_router(name));
        routers.insert(name.to_string(), Arc::clone(&router));
        Ok(router)
    }

    /// Open or reuse `channel` and subscribe to it in one step, so pruning
    /// can never separate the lookup from the subscription.
    pub fn join(
        &self,
        channel: &str,
    ) -> Result<(Arc<Router>, Snapshot, broadcast::Receiver<Envelope>), CommandError> {
        let name = validate_channel_name(channel)?;
        let mut routers = self.lock_routers();
        let router = match routers.get(name) {
            Some(router) => Arc::clone(router),
            None => {
                info!(channel = name, "channel opened");
                let router = Arc::new(self.build_router(name));
                routers.insert(name.to_string(), Arc::clone(&router));
                router
            }
        };
        let (snapshot, events) = router.subscribe();
        Ok((router, snapshot, events))
    }

    pub fn get(&self, channel: &str) -> Option<Arc<Router>> {
        self.lock_routers().get(channel.trim()).cloned()
    }

    /// Channel names with their current subscriber counts, sorted by name
    pub fn channels(&self) -> Vec<(String, usize)> {
        let mut channels: Vec<(String, usize)> = self
            .lock_routers()
            .iter()
            .map(|(name, router)| (name.clone(), router.subscriber_count()))
            .collect();
        channels.sort();
        channels
    }

    /// Forget channels nobody listens to, nobody else holds, and whose
    /// session is waiting. Returns how many were dropped.
    pub fn prune_idle(&self) -> usize {
        let mut routers = self.lock_routers();
        let before = routers.len();
        routers.retain(|_, router| {
            Arc::strong_count(router) > 1
                || router.subscriber_count() > 0
                || router.snapshot().session.is_running
        });
        let pruned = before - routers.len();
        if pruned > 0 {
            info!(pruned, "idle channels pruned");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.lock_routers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_routers().is_empty()
    }

    fn build_router(&self, name: &str) -> Router {
        Router::builder(name, Arc::clone(&self.catalog))
            .engine(Arc::clone(&self.engine))
            .clustering_delay(self.clustering_delay)
            .capacity(self.capacity)
            .build()
    }

    fn lock_routers(&self) -> MutexGuard<'_, HashMap<String, Arc<Router>>> {
        self.routers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_channel_name(channel: &str) -> Result<&str, CommandError> {
    let name = channel.trim();
    if name.is_empty() {
        return Err(CommandError::InvalidArgument(
            "channel name is empty".to_string(),
        ));
    }
    if name.len() > MAX_CHANNEL_NAME_LEN {
        return Err(CommandError::InvalidArgument(format!(
            "channel name longer than {} bytes",
            MAX_CHANNEL_NAME_LEN
        )));
    }
    Ok(name)
}
