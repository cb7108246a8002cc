mod error;
mod event;
mod point;
mod step;

#[cfg(test)]
mod tests;

pub use error::CommandError;
pub use event::{Envelope, Event, Snapshot};
pub use point::{Point, PointId};
pub use step::Step;

use crate::catalog::DemoParams;
use crate::clusterer::Cluster;
use serde::{Deserialize, Serialize};

/// Cluster count used when neither the command nor the demo names one
pub const DEFAULT_K: usize = 3;

/// State of one interactive demo on one channel.
///
/// Both the router and every subscriber mirror change this only by folding
/// [`Event`]s through [`Session::apply`], so identical event streams give
/// identical sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub active_script_id: Option<String>,
    pub is_running: bool,
    /// Insertion order
    pub points: Vec<Point>,
    pub clusters: Vec<Cluster>,
    pub step: Step,
    pub explanations: Vec<String>,
    /// Parameters of the active demo, empty while waiting
    #[serde(default)]
    pub default_params: DemoParams,
}

impl Session {
    /// A session in the waiting state
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and return to waiting
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn point(&self, id: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn contains_point(&self, id: &str) -> bool {
        self.point(id).is_some()
    }

    /// Cluster count to use when a run-clustering command omits `k`
    pub fn default_k(&self) -> usize {
        self.default_params
            .get("k")
            .and_then(|v| v.as_u64())
            .map(|k| k as usize)
            .unwrap_or(DEFAULT_K)
    }

    /// Upper bound on canvas points, if the demo sets one
    pub fn max_points(&self) -> Option<usize> {
        self.default_params
            .get("maxPoints")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
    }

    /// Fold one event into the session
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::SessionStarted {
                script_id,
                default_params,
                explanations,
            } => {
                self.reset();
                self.active_script_id = Some(script_id.clone());
                self.is_running = true;
                self.step = Step::Started;
                self.default_params = default_params.clone();
                self.explanations = explanations.clone();
            }
            Event::PointAdded { point } => {
                self.points.push(point.clone());
            }
            Event::PointMoved { id, x, y } => {
                if let Some(point) = self.points.iter_mut().find(|p| p.id == *id) {
                    point.x = *x;
                    point.y = *y;
                }
            }
            Event::PointRemoved { id } => {
                self.points.retain(|p| p.id != *id);
            }
            Event::PointsCleared { explanations } => {
                self.points.clear();
                self.clusters.clear();
                self.step = Step::Started;
                self.explanations = explanations.clone();
            }
            Event::ClusteringStarted => {
                self.step = Step::ClusteringRunning;
            }
            Event::ClusteringComplete {
                clusters,
                points,
                explanations,
            } => {
                self.points = points.clone();
                self.clusters = clusters.clone();
                self.explanations = explanations.clone();
                self.step = Step::ClusteringComplete;
            }
            Event::ClusteringFailed { explanations } => {
                self.explanations = explanations.clone();
                self.step = Step::Started;
            }
            Event::SessionEnded => self.reset(),
        }
    }
}
