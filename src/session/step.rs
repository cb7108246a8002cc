use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse progress label of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// No active demo
    #[default]
    Waiting,
    /// Demo active, points editable
    Started,
    /// Clustering accepted, result not yet broadcast
    ClusteringRunning,
    /// Last clustering pass finished
    ClusteringComplete,
}

impl Step {
    /// Same as the serde name
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Waiting => "waiting",
            Step::Started => "started",
            Step::ClusteringRunning => "clustering-running",
            Step::ClusteringComplete => "clustering-complete",
        }
    }

    /// Whether point edits and clustering requests are accepted in this step
    pub fn accepts_edits(&self) -> bool {
        matches!(self, Step::Started | Step::ClusteringComplete)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
