//! Point cloud data structures and functionality

use crate::point::*;
use crate::traits::HasPosition;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A generic point cloud container
///
/// Points keep their insertion order; filtering stages rely on a stable
/// order so that index sets produced against a cloud remain meaningful
/// for that cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

/// A point cloud with colored points
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.points.iter()
    }

    /// Get a mutable iterator over the points
    pub fn iter_mut(&mut self) -> std::slice::IterMut<T> {
        self.points.iter_mut()
    }

    /// Clear all points from the cloud
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<T: Clone> PointCloud<T> {
    /// Build a new cloud from the points at `indices`, in index order
    ///
    /// Indices must be in bounds for this cloud.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            points: indices.iter().map(|&i| self.points[i].clone()).collect(),
        }
    }
}

impl<T: HasPosition> PointCloud<T> {
    /// Get the axis-aligned bounding box of the cloud
    ///
    /// Returns `None` for an empty cloud.
    pub fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        let first = self.points.first()?.position();
        let mut min = first;
        let mut max = first;

        for point in &self.points {
            let p = point.position();
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Get the mean position of the cloud, or `None` if it is empty
    pub fn centroid(&self) -> Option<Point3f> {
        if self.is_empty() {
            return None;
        }

        let mut sum = Vector3f::zeros();
        for point in &self.points {
            sum += point.position().coords;
        }

        Some(Point3f::from(sum / self.len() as f32))
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IndexMut<usize> for PointCloud<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_select_preserves_index_order() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(2.0, 0.0, 0.0),
            Point3f::new(3.0, 0.0, 0.0),
        ]);

        let selected = cloud.select(&[3, 0, 2]);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].x, 3.0);
        assert_eq!(selected[1].x, 0.0);
        assert_eq!(selected[2].x, 2.0);
    }

    #[test]
    fn test_bounding_box() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(-1.0, 2.0, 0.5),
            Point3f::new(3.0, -2.0, 1.5),
            Point3f::new(0.0, 0.0, 0.0),
        ]);

        let (min, max) = cloud.bounding_box().unwrap();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3f::new(3.0, 2.0, 1.5));
    }

    #[test]
    fn test_bounding_box_empty() {
        let cloud = PointCloud::<Point3f>::new();
        assert!(cloud.bounding_box().is_none());
        assert!(cloud.centroid().is_none());
    }

    #[test]
    fn test_centroid() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.0, 4.0, 6.0),
        ]);

        let centroid = cloud.centroid().unwrap();
        assert_relative_eq!(centroid.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(centroid.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(centroid.z, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_colored_cloud_accessors() {
        let mut cloud = ColoredPointCloud3f::new();
        cloud.push(ColoredPoint3f::new(1.0, 2.0, 3.0, [10, 20, 30]));

        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud[0].color, [10, 20, 30]);
        assert_eq!(cloud[0].position, Point3f::new(1.0, 2.0, 3.0));
    }
}
