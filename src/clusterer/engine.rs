use crate::clusterer::kmeans::{KMEANS_ITERATIONS, kmeans};
use crate::clusterer::types::{Cluster, ClusterError};
use crate::session::Point;

/// Seam between the router and whatever partitions the canvas
pub trait ClusteringEngine: Send + Sync {
    /// Human-readable algorithm name, shown in explanations
    fn name(&self) -> &str;

    /// Partition `points` into at most `k` non-empty clusters
    fn cluster(&self, points: &[Point], k: usize) -> Result<Vec<Cluster>, ClusterError>;
}

/// Fixed-iteration k-means over Euclidean distance
#[derive(Debug, Clone, Default)]
pub struct KMeans {
    seed: Option<u64>,
}

impl KMeans {
    /// Nondeterministic seeding
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Every run seeds its RNG from `seed`, so identical input gives identical output
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn iterations(&self) -> usize {
        KMEANS_ITERATIONS
    }
}

impl ClusteringEngine for KMeans {
    fn name(&self) -> &str {
        "K-means"
    }

    fn cluster(&self, points: &[Point], k: usize) -> Result<Vec<Cluster>, ClusterError> {
        kmeans(points, k, self.seed)
    }
}
