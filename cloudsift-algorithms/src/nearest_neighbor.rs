//! Nearest neighbor search implementations

use cloudsift_core::{HasPosition, NearestNeighborSearch, Point3f};
use kiddo::float::distance::SquaredEuclidean;
use kiddo::float::kdtree::KdTree as KiddoTree;

/// KD-tree spatial index over a point cloud
///
/// Wraps kiddo's float kd-tree and stores `u32` indices mapping back to the
/// slice the tree was built from, so query results can address the original
/// cloud directly.
pub struct KdTree {
    tree: KiddoTree<f32, u32, 3, 32, u32>,
    len: usize,
}

impl KdTree {
    /// Build a KD-tree over the positions of `points`
    pub fn build<P: HasPosition>(points: &[P]) -> Self {
        let mut tree = KiddoTree::with_capacity(points.len().max(1));
        for (i, point) in points.iter().enumerate() {
            let p = point.position();
            tree.add(&[p.x, p.y, p.z], i as u32);
        }

        Self {
            tree,
            len: points.len(),
        }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indices of all points within `radius` of `query`, sorted ascending
    ///
    /// Distances are compared inclusively (`<= radius`). Returns an empty
    /// vector for an empty index, a non-positive radius or a non-finite
    /// query.
    pub fn radius_indices(&self, query: &Point3f, radius: f32) -> Vec<usize> {
        if self.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.coords.iter().all(|v| v.is_finite())
        {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        // kiddo compares strictly; widen the query slightly and re-filter
        // inclusively so points exactly on the boundary are kept.
        let widened = radius_sq + f32::EPSILON * radius_sq.max(1.0);

        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&[query.x, query.y, query.z], widened)
            .into_iter()
            .filter(|n| n.distance <= radius_sq)
            .map(|n| n.item as usize)
            .collect();

        indices.sort_unstable();
        indices
    }
}

impl NearestNeighborSearch for KdTree {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 || !query.coords.iter().all(|v| v.is_finite()) {
            return Vec::new();
        }

        self.tree
            .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], k.min(self.len))
            .into_iter()
            .map(|n| (n.item as usize, n.distance.sqrt()))
            .collect()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        if self.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.coords.iter().all(|v| v.is_finite())
        {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let widened = radius_sq + f32::EPSILON * radius_sq.max(1.0);

        let mut neighbors: Vec<(usize, f32)> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&[query.x, query.y, query.z], widened)
            .into_iter()
            .filter(|n| n.distance <= radius_sq)
            .map(|n| (n.item as usize, n.distance.sqrt()))
            .collect();

        neighbors.sort_unstable_by_key(|&(i, _)| i);
        neighbors
    }
}

/// Simple brute force nearest neighbor search
///
/// Exact reference used to cross-check the KD-tree in tests; also adequate
/// for very small clouds.
pub struct BruteForceSearch {
    positions: Vec<Point3f>,
}

impl BruteForceSearch {
    pub fn new<P: HasPosition>(points: &[P]) -> Self {
        Self {
            positions: points.iter().map(|p| p.position()).collect(),
        }
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let mut distances: Vec<(usize, f32)> = self
            .positions
            .iter()
            .enumerate()
            .map(|(idx, p)| (idx, (p - query).norm()))
            .collect();

        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        if radius <= 0.0 || !radius.is_finite() {
            return Vec::new();
        }

        self.positions
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                let d = (p - query).norm();
                (d <= radius).then_some((idx, d))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_cloud() -> Vec<Point3f> {
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(2.0, 0.0, 0.0),
            Point3f::new(10.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_k_nearest_sorted_by_distance() {
        let tree = KdTree::build(&line_cloud());
        let result = tree.find_k_nearest(&Point3f::new(0.2, 0.0, 0.0), 2);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, 0);
        assert_eq!(result[1].0, 1);
        assert!(result[0].1 <= result[1].1);
    }

    #[test]
    fn test_k_larger_than_cloud() {
        let tree = KdTree::build(&line_cloud());
        let result = tree.find_k_nearest(&Point3f::origin(), 100);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_radius_indices_inclusive_boundary() {
        let points = vec![Point3f::new(1.0, 0.0, 0.0), Point3f::new(5.0, 0.0, 0.0)];
        let tree = KdTree::build(&points);

        let indices = tree.radius_indices(&Point3f::origin(), 1.0);
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn test_radius_indices_sorted() {
        let tree = KdTree::build(&line_cloud());
        let indices = tree.radius_indices(&Point3f::new(1.0, 0.0, 0.0), 1.5);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&Vec::<Point3f>::new());
        assert!(tree.is_empty());
        assert!(tree.find_k_nearest(&Point3f::origin(), 3).is_empty());
        assert!(tree.radius_indices(&Point3f::origin(), 1.0).is_empty());
    }

    #[test]
    fn test_nan_query() {
        let tree = KdTree::build(&line_cloud());
        let query = Point3f::new(f32::NAN, 0.0, 0.0);
        assert!(tree.find_k_nearest(&query, 1).is_empty());
        assert!(tree.radius_indices(&query, 1.0).is_empty());
    }

    #[test]
    fn test_matches_brute_force() {
        let points: Vec<Point3f> = (0..60)
            .map(|i| {
                let f = i as f32;
                Point3f::new((f * 0.37).sin(), (f * 0.91).cos(), f * 0.013)
            })
            .collect();

        let tree = KdTree::build(&points);
        let brute = BruteForceSearch::new(&points);
        let query = Point3f::new(0.1, 0.2, 0.3);

        let mut tree_radius = tree.find_radius_neighbors(&query, 0.5);
        let mut brute_radius = brute.find_radius_neighbors(&query, 0.5);
        tree_radius.sort_unstable_by_key(|&(i, _)| i);
        brute_radius.sort_unstable_by_key(|&(i, _)| i);

        assert_eq!(tree_radius.len(), brute_radius.len());
        for (a, b) in tree_radius.iter().zip(brute_radius.iter()) {
            assert_eq!(a.0, b.0);
            assert_relative_eq!(a.1, b.1, epsilon = 1e-4);
        }

        let tree_knn = tree.find_k_nearest(&query, 5);
        let brute_knn = brute.find_k_nearest(&query, 5);
        for (a, b) in tree_knn.iter().zip(brute_knn.iter()) {
            assert_relative_eq!(a.1, b.1, epsilon = 1e-4);
        }
    }
}
