use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Free-form demo parameters, e.g. `{"k": 3, "maxPoints": 200}`
pub type DemoParams = serde_json::Map<String, serde_json::Value>;

/// Script id of the built-in clustering demo
pub const CLUSTERING_DEMO_ID: &str = "ml-clustering";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog contains no demos")]
    Empty,

    #[error("Duplicate demo id: {0}")]
    DuplicateId(String),
}

/// A demo the presenter can start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub default_params: DemoParams,
    /// Explanations shown when the demo starts or the canvas is cleared
    #[serde(default)]
    pub intro: Vec<String>,
}

/// Static set of demos, looked up by id on start
#[derive(Debug, Clone, Serialize)]
pub struct DemoCatalog {
    demos: Vec<DemoDefinition>,
}

impl DemoCatalog {
    /// Build a catalog, rejecting empty lists and repeated ids
    pub fn new(demos: Vec<DemoDefinition>) -> Result<Self, CatalogError> {
        if demos.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for demo in &demos {
            if !seen.insert(demo.id.as_str()) {
                return Err(CatalogError::DuplicateId(demo.id.clone()));
            }
        }

        Ok(Self { demos })
    }

    /// The demos compiled into the binary
    pub fn builtin() -> Self {
        let mut params = DemoParams::new();
        params.insert("k".to_string(), 3.into());
        params.insert("maxPoints".to_string(), 200.into());

        Self {
            demos: vec![DemoDefinition {
                id: CLUSTERING_DEMO_ID.to_string(),
                name: "K-means Clustering".to_string(),
                description: "Place points on the canvas and watch them group into clusters"
                    .to_string(),
                default_params: params,
                intro: vec![
                    "K-means groups nearby points around shared centers.".to_string(),
                    "Click the canvas to add points, then run clustering.".to_string(),
                ],
            }],
        }
    }

    /// Parse a JSON array of demo definitions
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let demos: Vec<DemoDefinition> = serde_json::from_str(json)?;
        Self::new(demos)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, id: &str) -> Option<&DemoDefinition> {
        self.demos.iter().find(|d| d.id == id)
    }

    pub fn list(&self) -> &[DemoDefinition] {
        &self.demos
    }

    pub fn len(&self) -> usize {
        self.demos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demos.is_empty()
    }
}

impl Default for DemoCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
