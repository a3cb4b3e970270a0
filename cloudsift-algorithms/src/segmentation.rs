//! Plane segmentation and removal
//!
//! RANSAC plane fitting plus the iterative loop that strips dominant
//! planar surfaces (floor, table) from a downsampled frame until only
//! candidate foreground geometry remains.

use crate::filtering::extract_indices;
use cloudsift_core::{Error, HasPosition, Matrix3, PointCloud, Point3f, Result, Vector3f};
use nalgebra::Vector4;
use rand::prelude::*;
use rayon::prelude::*;

/// A 3D plane model defined by the equation ax + by + cz + d = 0
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneModel {
    /// Plane coefficients [a, b, c, d] where ax + by + cz + d = 0
    pub coefficients: Vector4<f32>,
}

impl PlaneModel {
    /// Create a new plane model from coefficients
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            coefficients: Vector4::new(a, b, c, d),
        }
    }

    /// Create a plane model from three points
    ///
    /// Returns `None` when the points are collinear.
    pub fn from_points(p1: &Point3f, p2: &Point3f, p3: &Point3f) -> Option<Self> {
        let v1 = p2 - p1;
        let v2 = p3 - p1;

        let normal = v1.cross(&v2);
        if normal.magnitude() < 1e-8 {
            return None;
        }

        let normal = normal.normalize();
        let d = -normal.dot(&p1.coords);

        Some(PlaneModel::new(normal.x, normal.y, normal.z, d))
    }

    /// Least-squares plane fit over the points named by `indices`
    ///
    /// Computes the centroid and covariance of the selected points and
    /// takes the eigenvector of the smallest eigenvalue as the plane
    /// normal. Returns `None` for degenerate geometry (fewer than three
    /// points, or points without a well-defined normal direction).
    pub fn fit_least_squares<P: HasPosition>(points: &[P], indices: &[usize]) -> Option<Self> {
        if indices.len() < 3 {
            return None;
        }

        let mut centroid = Vector3f::zeros();
        for &i in indices {
            centroid += points[i].position().coords;
        }
        centroid /= indices.len() as f32;

        let mut covariance = Matrix3::zeros();
        for &i in indices {
            let r = points[i].position().coords - centroid;
            covariance += r * r.transpose();
        }

        let eigen = covariance.symmetric_eigen();
        let mut smallest = 0;
        for i in 1..3 {
            if eigen.eigenvalues[i] < eigen.eigenvalues[smallest] {
                smallest = i;
            }
        }

        let normal: Vector3f = eigen.eigenvectors.column(smallest).clone_owned();
        if normal.magnitude() < 1e-8 {
            return None;
        }

        let normal = normal.normalize();
        let d = -normal.dot(&centroid);

        Some(PlaneModel::new(normal.x, normal.y, normal.z, d))
    }

    /// Get the normal vector of the plane
    pub fn normal(&self) -> Vector3f {
        Vector3f::new(
            self.coefficients.x,
            self.coefficients.y,
            self.coefficients.z,
        )
    }

    /// Calculate the perpendicular distance from a point to the plane
    pub fn distance_to_point(&self, point: &Point3f) -> f32 {
        let normal = self.normal();
        let normal_magnitude = normal.magnitude();

        if normal_magnitude < 1e-8 {
            return f32::INFINITY;
        }

        (self.coefficients.x * point.x
            + self.coefficients.y * point.y
            + self.coefficients.z * point.z
            + self.coefficients.w)
            .abs()
            / normal_magnitude
    }

    /// Count inliers within a distance threshold
    pub fn count_inliers<P: HasPosition + Sync>(&self, points: &[P], threshold: f32) -> usize {
        points
            .par_iter()
            .filter(|point| self.distance_to_point(&point.position()) <= threshold)
            .count()
    }

    /// Get indices of inlier points within a distance threshold, ascending
    pub fn get_inliers<P: HasPosition + Sync>(&self, points: &[P], threshold: f32) -> Vec<usize> {
        points
            .par_iter()
            .enumerate()
            .filter(|(_, point)| self.distance_to_point(&point.position()) <= threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A fitted plane together with its inlier indices
#[derive(Debug, Clone)]
pub struct PlaneSegmentation {
    /// The best plane model found, after least-squares refinement
    pub model: PlaneModel,
    /// Indices of inlier points, ascending into the cloud the fit ran on
    pub inliers: Vec<usize>,
}

/// Result of iterative plane removal
#[derive(Debug, Clone)]
pub struct PlaneRemoval<P> {
    /// The working cloud left after the removal loop exited
    pub cloud: PointCloud<P>,
    /// The planes that were removed, in removal order
    pub planes: Vec<PlaneModel>,
}

/// Plane segmentation using the RANSAC algorithm
///
/// Draws randomized minimal samples, keeps the candidate plane with the
/// most inliers within `threshold`, refines its coefficients over the full
/// inlier set and recomputes the inliers against the refined model.
///
/// Returns `Ok(None)` when the cloud has fewer than three points or no
/// sample produced a valid model with at least one inlier — the normal
/// "no planar structure" outcome, not an error. `Err` is reserved for
/// invalid parameters.
pub fn segment_plane<P: HasPosition + Sync>(
    cloud: &PointCloud<P>,
    threshold: f32,
    max_iters: usize,
) -> Result<Option<PlaneSegmentation>> {
    segment_plane_with_rng(cloud, threshold, max_iters, &mut thread_rng())
}

/// [`segment_plane`] driving a caller-supplied random number generator
///
/// A seeded rng makes the sample sequence, and with it the whole fit,
/// reproducible.
pub fn segment_plane_with_rng<P, R>(
    cloud: &PointCloud<P>,
    threshold: f32,
    max_iters: usize,
    rng: &mut R,
) -> Result<Option<PlaneSegmentation>>
where
    P: HasPosition + Sync,
    R: Rng,
{
    if threshold <= 0.0 || !threshold.is_finite() {
        return Err(Error::InvalidData("threshold must be positive".to_string()));
    }
    if max_iters == 0 {
        return Err(Error::InvalidData(
            "max_iters must be positive".to_string(),
        ));
    }

    let points = &cloud.points;
    if points.len() < 3 {
        return Ok(None);
    }

    let mut best: Option<(PlaneModel, usize)> = None;

    for _ in 0..max_iters {
        let Some((i0, i1, i2)) = sample_three_distinct(points.len(), rng) else {
            continue;
        };

        let candidate = PlaneModel::from_points(
            &points[i0].position(),
            &points[i1].position(),
            &points[i2].position(),
        );

        if let Some(model) = candidate {
            let count = model.count_inliers(points, threshold);
            if count > 0 && best.as_ref().map_or(true, |(_, best_count)| count > *best_count) {
                best = Some((model, count));
            }
        }
    }

    let Some((model, _)) = best else {
        return Ok(None);
    };

    let inliers = model.get_inliers(points, threshold);
    if inliers.is_empty() {
        return Ok(None);
    }

    // Refine over the full inlier set; keep the sampled candidate if the
    // refinement degenerates or no longer covers any point.
    let segmentation = match PlaneModel::fit_least_squares(points, &inliers) {
        Some(refined) => {
            let refined_inliers = refined.get_inliers(points, threshold);
            if refined_inliers.is_empty() {
                PlaneSegmentation { model, inliers }
            } else {
                PlaneSegmentation {
                    model: refined,
                    inliers: refined_inliers,
                }
            }
        }
        None => PlaneSegmentation { model, inliers },
    };

    Ok(Some(segmentation))
}

/// Iteratively strip dominant planes from a cloud
///
/// Repeats RANSAC plane fitting on a shrinking working cloud while more
/// than `min_remaining_ratio` of the original points remain, removing each
/// found plane's inliers. The loop also ends, normally, when no plane can
/// be fit. Every successful iteration removes at least one point, so the
/// loop always terminates. Each iteration builds a fresh remainder cloud;
/// no buffer is reused across iterations.
pub fn remove_planes<P: HasPosition + Clone + Sync>(
    cloud: &PointCloud<P>,
    threshold: f32,
    max_iters: usize,
    min_remaining_ratio: f32,
) -> Result<PlaneRemoval<P>> {
    remove_planes_with_rng(cloud, threshold, max_iters, min_remaining_ratio, &mut thread_rng())
}

/// [`remove_planes`] driving a caller-supplied random number generator
pub fn remove_planes_with_rng<P, R>(
    cloud: &PointCloud<P>,
    threshold: f32,
    max_iters: usize,
    min_remaining_ratio: f32,
    rng: &mut R,
) -> Result<PlaneRemoval<P>>
where
    P: HasPosition + Clone + Sync,
    R: Rng,
{
    if !(0.0..=1.0).contains(&min_remaining_ratio) {
        return Err(Error::InvalidData(
            "min_remaining_ratio must lie in [0, 1]".to_string(),
        ));
    }

    let size_floor = min_remaining_ratio * cloud.len() as f32;
    let mut working = cloud.clone();
    let mut planes = Vec::new();

    while working.len() as f32 > size_floor {
        let Some(segmentation) = segment_plane_with_rng(&working, threshold, max_iters, rng)?
        else {
            break;
        };

        let remainder = extract_indices(&working, &segmentation.inliers, true);
        debug_assert!(remainder.len() < working.len());

        planes.push(segmentation.model);
        working = remainder;
    }

    Ok(PlaneRemoval {
        cloud: working,
        planes,
    })
}

/// Samples three distinct indices in `[0, n)`
fn sample_three_distinct<R: Rng>(n: usize, rng: &mut R) -> Option<(usize, usize, usize)> {
    if n < 3 {
        return None;
    }

    let i0 = rng.gen_range(0..n);
    let mut i1 = rng.gen_range(0..n);
    let mut attempts = 0;
    while i1 == i0 {
        if attempts > 100 {
            return None;
        }
        i1 = rng.gen_range(0..n);
        attempts += 1;
    }

    let mut i2 = rng.gen_range(0..n);
    attempts = 0;
    while i2 == i0 || i2 == i1 {
        if attempts > 100 {
            return None;
        }
        i2 = rng.gen_range(0..n);
        attempts += 1;
    }

    Some((i0, i1, i2))
}
