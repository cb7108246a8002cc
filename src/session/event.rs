use crate::catalog::DemoParams;
use crate::clusterer::Cluster;
use crate::session::{Point, PointId, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A state delta fanned out to every subscriber of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Event {
    SessionStarted {
        script_id: String,
        default_params: DemoParams,
        explanations: Vec<String>,
    },
    PointAdded {
        point: Point,
    },
    PointMoved {
        id: PointId,
        x: f64,
        y: f64,
    },
    PointRemoved {
        id: PointId,
    },
    PointsCleared {
        explanations: Vec<String>,
    },
    ClusteringStarted,
    ClusteringComplete {
        clusters: Vec<Cluster>,
        points: Vec<Point>,
        explanations: Vec<String>,
    },
    ClusteringFailed {
        explanations: Vec<String>,
    },
    SessionEnded,
}

impl Event {
    /// The serde `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "session-started",
            Event::PointAdded { .. } => "point-added",
            Event::PointMoved { .. } => "point-moved",
            Event::PointRemoved { .. } => "point-removed",
            Event::PointsCleared { .. } => "points-cleared",
            Event::ClusteringStarted => "clustering-started",
            Event::ClusteringComplete { .. } => "clustering-complete",
            Event::ClusteringFailed { .. } => "clustering-failed",
            Event::SessionEnded => "session-ended",
        }
    }
}

/// An event stamped with its channel and position in that channel's stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub channel: String,
    /// Starts at 1 and increases by one per broadcast
    pub seq: u64,
    pub event: Event,
}

/// Full session copy handed to a subscriber when it joins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub channel: String,
    /// Sequence number of the last event folded into `session`
    pub seq: u64,
    pub session: Session,
    pub taken_at: DateTime<Utc>,
}
