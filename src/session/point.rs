use crate::clusterer::Coord;
use serde::{Deserialize, Serialize};

/// Opaque point identifier, unique within a session
pub type PointId = String;

/// A point placed on the demo canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
    /// Set by the last clustering pass, meaningless before it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<u32>,
}

impl Point {
    pub fn new(id: impl Into<PointId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            color: None,
            cluster_id: None,
        }
    }

    /// A point with a freshly generated v4 UUID as its id
    pub fn with_generated_id(x: f64, y: f64) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), x, y)
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}
