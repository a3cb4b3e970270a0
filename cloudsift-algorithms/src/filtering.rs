//! Filtering algorithms
//!
//! The two reduction stages that run before plane removal — an axis range
//! crop and a voxel-grid downsample — plus the index-set extraction used to
//! split a cloud into plane inliers and remainder.

use cloudsift_core::{Centroid, HasPosition, PointCloud, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coordinate axis selector for the range crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn component(&self, point: &impl HasPosition) -> f32 {
        let p = point.position();
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }
}

/// Range crop along a single axis
///
/// Keeps the points whose coordinate on `axis` lies in the inclusive range
/// `[lo, hi]`; points with a non-finite coordinate on that axis are dropped.
/// Pure function of its inputs — an empty result is valid for an empty or
/// entirely out-of-range cloud, and an inverted range simply keeps nothing.
///
/// # Example
/// ```rust
/// use cloudsift_core::{PointCloud, Point3f};
/// use cloudsift_algorithms::{passthrough_filter, Axis};
///
/// let cloud = PointCloud::from_points(vec![
///     Point3f::new(0.0, 0.0, 0.5),
///     Point3f::new(0.0, 0.0, 2.0),
/// ]);
///
/// let cropped = passthrough_filter(&cloud, Axis::Z, 0.0, 1.0);
/// assert_eq!(cropped.len(), 1);
/// ```
pub fn passthrough_filter<P: HasPosition + Clone>(
    cloud: &PointCloud<P>,
    axis: Axis,
    lo: f32,
    hi: f32,
) -> PointCloud<P> {
    cloud
        .iter()
        .filter(|point| {
            let v = axis.component(*point);
            v.is_finite() && v >= lo && v <= hi
        })
        .cloned()
        .collect()
}

/// Voxel grid downsampling
///
/// Partitions space into cubes of `leaf_size` on each axis and replaces the
/// points of every occupied cube with their aggregate (see [`Centroid`]).
/// Cells are keyed on `floor(coord / leaf_size)` in absolute coordinates,
/// so the grid does not move with the cloud's bounding box: running the
/// filter on its own output leaves the cloud unchanged. Output points are
/// emitted in sorted cell-key order, making the stage deterministic for a
/// fixed input.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `leaf_size` - Edge length of each voxel cube
///
/// # Returns
/// * `Result<PointCloud<P>>` - Downsampled point cloud; `Err` only for a
///   non-positive or non-finite `leaf_size`
pub fn voxel_grid_filter<P: Centroid + Clone>(
    cloud: &PointCloud<P>,
    leaf_size: f32,
) -> Result<PointCloud<P>> {
    if !leaf_size.is_finite() || leaf_size <= 0.0 {
        return Err(cloudsift_core::Error::InvalidData(
            "leaf_size must be positive".to_string(),
        ));
    }

    if cloud.is_empty() {
        return Ok(PointCloud::new());
    }

    let mut cells: HashMap<(i32, i32, i32), Vec<P>> = HashMap::new();

    for point in cloud.iter() {
        let p = point.position();
        if !p.x.is_finite() || !p.y.is_finite() || !p.z.is_finite() {
            continue;
        }

        let key = (
            (p.x / leaf_size).floor() as i32,
            (p.y / leaf_size).floor() as i32,
            (p.z / leaf_size).floor() as i32,
        );
        cells.entry(key).or_default().push(point.clone());
    }

    let mut keys: Vec<(i32, i32, i32)> = cells.keys().copied().collect();
    keys.sort_unstable();

    let mut downsampled = PointCloud::with_capacity(keys.len());
    for key in keys {
        let members = &cells[&key];
        downsampled.push(P::centroid_of(members));
    }

    Ok(downsampled)
}

/// Extract the points named by an index set, or their complement
///
/// With `negative == false` the result contains exactly the points at
/// `indices`, in the input cloud's order; with `negative == true` it
/// contains every other point, also in input order. Indices must be in
/// bounds for `cloud`; duplicates are ignored.
pub fn extract_indices<P: Clone>(
    cloud: &PointCloud<P>,
    indices: &[usize],
    negative: bool,
) -> PointCloud<P> {
    let mut selected = vec![false; cloud.len()];
    for &i in indices {
        selected[i] = true;
    }

    cloud
        .iter()
        .zip(selected.iter())
        .filter(|(_, &sel)| sel != negative)
        .map(|(point, _)| point.clone())
        .collect()
}
