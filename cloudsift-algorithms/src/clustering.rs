//! Euclidean cluster extraction
//!
//! Groups the plane-stripped cloud into spatially connected components:
//! two points belong to the same cluster when a chain of neighbors, each
//! within `tolerance` of the previous, links them.

use crate::nearest_neighbor::KdTree;
use cloudsift_core::{HasPosition, PointCloud};
use std::collections::VecDeque;

/// Extract spatially connected clusters from a point cloud
///
/// Components are grown to completion by breadth-first expansion over the
/// KD-tree's radius neighborhoods, then any component whose size lies
/// outside `[min_size, max_size]` is discarded as noise or a merged
/// region. Surviving clusters are returned as index-sets into `cloud`,
/// largest cluster first, indices ascending within each cluster.
///
/// The returned sets are pairwise disjoint. An empty cloud, a
/// non-positive tolerance or a zero `min_size` yields an empty result;
/// none of these are errors.
pub fn euclidean_cluster<P: HasPosition>(
    cloud: &PointCloud<P>,
    tolerance: f32,
    min_size: usize,
    max_size: usize,
) -> Vec<Vec<usize>> {
    if cloud.is_empty() || tolerance <= 0.0 || min_size == 0 || min_size > max_size {
        return Vec::new();
    }

    let tree = KdTree::build(&cloud.points);
    let n = cloud.len();
    let mut visited = vec![false; n];
    let mut clusters = Vec::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }

        let mut cluster = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        visited[seed] = true;

        while let Some(current) = queue.pop_front() {
            cluster.push(current);

            let query = cloud[current].position();
            for neighbor in tree.radius_indices(&query, tolerance) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        if (min_size..=max_size).contains(&cluster.len()) {
            cluster.sort_unstable();
            clusters.push(cluster);
        }
    }

    clusters.sort_by_key(|c| std::cmp::Reverse(c.len()));
    clusters
}
