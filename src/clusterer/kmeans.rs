use crate::clusterer::{
    centroid::compute_centroid,
    distance::euclidean_distance,
    palette::cluster_color,
    types::{Cluster, ClusterError, ClusterRun, Coord},
};
use crate::session::Point;
use std::collections::HashMap;

/// Assignment + update rounds per run. There is no early exit.
pub const KMEANS_ITERATIONS: usize = 10;

/// Partition `points` into at most `min(k, points.len())` non-empty clusters.
///
/// Centroids are seeded by sampling input points uniformly with replacement,
/// so two calls on the same input may disagree unless `seed` is given.
/// Empty input or `k == 0` yields no clusters.
pub fn kmeans(points: &[Point], k: usize, seed: Option<u64>) -> Result<Vec<Cluster>, ClusterError> {
    Ok(kmeans_run(points, k, seed)?.clusters)
}

/// Same as [`kmeans`] but also reports the centroids the final assignment
/// step measured against.
pub fn kmeans_run(points: &[Point], k: usize, seed: Option<u64>) -> Result<ClusterRun, ClusterError> {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    let n = points.len();
    if n == 0 || k == 0 {
        return Ok(ClusterRun::default());
    }

    if let Some(bad) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(ClusterError::NonFiniteCoordinate { id: bad.id.clone() });
    }

    let k = k.min(n);
    let coords: Vec<Coord> = points.iter().map(Point::coord).collect();
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    // 1. Pick initial centers, with replacement
    let mut centroids: Vec<Coord> = (0..k).map(|_| coords[rng.gen_range(0..n)]).collect();

    let mut assignments = vec![0usize; n];
    let mut assignment_centroids = centroids.clone();

    for _ in 0..KMEANS_ITERATIONS {
        assignment_centroids.clone_from(&centroids);

        // 2. Assign each point to the nearest centroid, lowest index on ties
        for (i, &coord) in coords.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, &center) in centroids.iter().enumerate() {
                let dist = euclidean_distance(coord, center);
                if dist < best_dist {
                    best = c;
                    best_dist = dist;
                }
            }
            assignments[i] = best;
        }

        // 3. Recompute centroids; empty clusters keep their previous center
        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<Coord> = coords
                .iter()
                .zip(assignments.iter())
                .filter(|&(_, a)| *a == c)
                .map(|(coord, _)| *coord)
                .collect();

            if let Some(mean) = compute_centroid(&members) {
                *centroid = mean;
            }
        }
    }

    if let Some(c) = centroids.iter().position(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(ClusterError::NonFiniteCentroid { id: c as u32 });
    }

    // 4. Build result clusters, dropping the empty ones without renumbering
    let mut clusters: Vec<Cluster> = centroids
        .iter()
        .enumerate()
        .map(|(c, &centroid)| Cluster {
            id: c as u32,
            centroid,
            points: Vec::new(),
            color: cluster_color(c as u32).to_string(),
        })
        .collect();

    for (point, &cluster_idx) in points.iter().zip(assignments.iter()) {
        let cluster = &mut clusters[cluster_idx];
        let mut member = point.clone();
        member.cluster_id = Some(cluster.id);
        member.color = Some(cluster.color.clone());
        cluster.points.push(member);
    }

    clusters.retain(|c| !c.points.is_empty());

    Ok(ClusterRun {
        clusters,
        assignment_centroids,
        iterations: KMEANS_ITERATIONS,
    })
}

/// Copy `points` in their original order with `cluster_id`/`color` taken from
/// the cluster each one landed in. Points absent from every cluster come back
/// with both fields cleared.
pub fn annotate_points(points: &[Point], clusters: &[Cluster]) -> Vec<Point> {
    let membership: HashMap<&str, &Cluster> = clusters
        .iter()
        .flat_map(|c| c.points.iter().map(move |p| (p.id.as_str(), c)))
        .collect();

    points
        .iter()
        .map(|p| {
            let mut annotated = p.clone();
            match membership.get(p.id.as_str()) {
                Some(cluster) => {
                    annotated.cluster_id = Some(cluster.id);
                    annotated.color = Some(cluster.color.clone());
                }
                None => {
                    annotated.cluster_id = None;
                    annotated.color = None;
                }
            }
            annotated
        })
        .collect()
}
