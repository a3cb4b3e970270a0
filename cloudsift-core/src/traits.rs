//! Core traits for cloudsift

use crate::point::*;

/// Access to a point's spatial position
///
/// The pipeline stages only look at geometry; implementing this trait is
/// all a point type needs to flow through cropping, downsampling, plane
/// removal and clustering.
pub trait HasPosition {
    fn position(&self) -> Point3f;
}

impl HasPosition for Point3f {
    fn position(&self) -> Point3f {
        *self
    }
}

impl HasPosition for ColoredPoint3f {
    fn position(&self) -> Point3f {
        self.position
    }
}

/// Construction of a single representative point from a group of points
///
/// Used by voxel downsampling: each occupied cell is replaced by the
/// aggregate of its members. `members` is never empty.
pub trait Centroid: HasPosition + Sized {
    fn centroid_of(members: &[Self]) -> Self;
}

impl Centroid for Point3f {
    fn centroid_of(members: &[Self]) -> Self {
        let mut sum = Vector3f::zeros();
        for p in members {
            sum += p.coords;
        }
        Point3f::from(sum / members.len() as f32)
    }
}

impl Centroid for ColoredPoint3f {
    fn centroid_of(members: &[Self]) -> Self {
        let mut sum = Vector3f::zeros();
        let mut color_sum = [0u32; 3];
        for p in members {
            sum += p.position.coords;
            for (acc, &c) in color_sum.iter_mut().zip(p.color.iter()) {
                *acc += u32::from(c);
            }
        }

        let n = members.len() as u32;
        Self {
            position: Point3f::from(sum / members.len() as f32),
            color: [
                (color_sum[0] / n) as u8,
                (color_sum[1] / n) as u8,
                (color_sum[2] / n) as u8,
            ],
        }
    }
}

/// Trait for nearest neighbor search functionality
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;

    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)>;
}
