use crate::session::PointId;
use serde::{Deserialize, Serialize};

/// Mutating request from the driving connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Command {
    Start {
        script_id: String,
    },
    AddPoint {
        /// Generated by the router when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<PointId>,
        x: f64,
        y: f64,
    },
    MovePoint {
        id: PointId,
        x: f64,
        y: f64,
    },
    RemovePoint {
        id: PointId,
    },
    ClearPoints,
    RunClustering {
        /// Falls back to the demo's `k`, then to 3
        #[serde(default, skip_serializing_if = "Option::is_none")]
        k: Option<usize>,
    },
    Stop,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::AddPoint { .. } => "add-point",
            Command::MovePoint { .. } => "move-point",
            Command::RemovePoint { .. } => "remove-point",
            Command::ClearPoints => "clear-points",
            Command::RunClustering { .. } => "run-clustering",
            Command::Stop => "stop",
        }
    }
}
