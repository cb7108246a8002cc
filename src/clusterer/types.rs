use crate::session::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position on the demo canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One group of points produced by a clustering pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Index of the seed centroid this cluster grew from (0..k-1)
    pub id: u32,
    pub centroid: Coord,
    /// Value copies of the member points, annotated with `cluster_id` and `color`
    pub points: Vec<Point>,
    pub color: String,
}

/// Full outcome of one k-means run
#[derive(Debug, Clone, Default)]
pub struct ClusterRun {
    /// Non-empty clusters, in ascending id order
    pub clusters: Vec<Cluster>,
    /// Centroids used by the last assignment step, indexed by cluster id.
    /// The returned cluster centroids were recomputed after that assignment.
    pub assignment_centroids: Vec<Coord>,
    pub iterations: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("Point {id} has a non-finite coordinate")]
    NonFiniteCoordinate { id: String },

    #[error("Cluster {id} ended with a non-finite centroid")]
    NonFiniteCentroid { id: u32 },
}
