// Public API exports
pub mod catalog;
pub mod clusterer;
pub mod config;
pub mod mirror;
pub mod router;
pub mod server;
pub mod session;

// Re-export main types for convenience
pub use catalog::{CLUSTERING_DEMO_ID, CatalogError, DemoCatalog, DemoDefinition, DemoParams};

pub use clusterer::{Cluster, ClusterError, ClusteringEngine, Coord, KMeans, kmeans};

pub use session::{CommandError, Envelope, Event, Point, PointId, Session, Snapshot, Step};

pub use router::{ChannelHub, Command, Router, RouterBuilder};

pub use mirror::{AudienceView, MirrorError, MirrorView, PresenterView, Role};

pub use config::{ServeArgs, ServerConfig};
