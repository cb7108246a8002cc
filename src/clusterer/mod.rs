mod centroid;
mod distance;
mod engine;
mod kmeans;
mod palette;
mod types;


pub use centroid::compute_centroid;
pub use distance::euclidean_distance;
pub use engine::{ClusteringEngine, KMeans};
pub use kmeans::{KMEANS_ITERATIONS, annotate_points, kmeans, kmeans_run};
pub use palette::{CLUSTER_PALETTE, cluster_color};
pub use types::{ClusterError, ClusterRun, Cluster, Coord};
