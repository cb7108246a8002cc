// Human-readable explanation lines broadcast alongside state changes

use crate::clusterer::Cluster;

pub fn cleared() -> Vec<String> {
    vec![
        "Canvas cleared.".to_string(),
        "Add new points, then run clustering again.".to_string(),
    ]
}

pub fn clustering_complete(algorithm: &str, clusters: &[Cluster], point_count: usize) -> Vec<String> {
    let average = if clusters.is_empty() {
        0.0
    } else {
        point_count as f64 / clusters.len() as f64
    };

    vec![
        format!(
            "Found {} clusters from {} points.",
            clusters.len(),
            point_count
        ),
        format!("Algorithm: {}", algorithm),
        format!("Average cluster size: {:.1} points", average),
    ]
}

pub fn clustering_failed(reason: &str) -> Vec<String> {
    vec![
        format!("Clustering failed: {}", reason),
        "The canvas is unchanged; try running clustering again.".to_string(),
    ]
}
