//! Pipeline configuration
//!
//! All stage parameters live in one [`PipelineConfig`]; the defaults are
//! the tuned constants the pipeline ships with, and every field can be
//! overridden from a TOML file.

use cloudsift_algorithms::Axis;
use cloudsift_core::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub crop: CropConfig,
    pub voxel: VoxelConfig,
    pub plane_removal: PlaneRemovalConfig,
    pub clustering: ClusteringConfig,
}

/// Depth-window crop settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Axis the crop window applies to (default: z, the depth axis)
    pub axis: Axis,

    /// Lower bound of the kept range in meters (default: 0.0)
    pub lo: f32,

    /// Upper bound of the kept range in meters (default: 1.0)
    pub hi: f32,
}

/// Voxel downsampling settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    /// Edge length of each voxel cube in meters (default: 0.01)
    pub leaf_size: f32,
}

/// Iterative RANSAC plane removal settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlaneRemovalConfig {
    /// Maximum point-to-plane distance for an inlier in meters (default: 0.02)
    pub distance_threshold: f32,

    /// RANSAC sampling trials per plane (default: 100)
    pub max_iterations: usize,

    /// Stop removing planes once the working cloud shrinks to this
    /// fraction of the downsampled frame (default: 0.1)
    pub min_remaining_ratio: f32,
}

/// Euclidean clustering settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Neighbor chain radius in meters (default: 0.04)
    pub tolerance: f32,

    /// Smallest cluster kept as an object candidate (default: 100)
    pub min_cluster_size: usize,

    /// Largest cluster kept as an object candidate (default: 2000)
    pub max_cluster_size: usize,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Z,
            lo: 0.0,
            hi: 1.0,
        }
    }
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self { leaf_size: 0.01 }
    }
}

impl Default for PlaneRemovalConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.02,
            max_iterations: 100,
            min_remaining_ratio: 0.1,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.04,
            min_cluster_size: 100,
            max_cluster_size: 2000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crop: CropConfig::default(),
            voxel: VoxelConfig::default(),
            plane_removal: PlaneRemovalConfig::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig =
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the stages would reject
    pub fn validate(&self) -> Result<()> {
        if !self.crop.lo.is_finite() || !self.crop.hi.is_finite() || self.crop.lo > self.crop.hi {
            return Err(Error::Config(format!(
                "crop range [{}, {}] is not a valid interval",
                self.crop.lo, self.crop.hi
            )));
        }
        if !self.voxel.leaf_size.is_finite() || self.voxel.leaf_size <= 0.0 {
            return Err(Error::Config(format!(
                "voxel leaf_size {} must be positive",
                self.voxel.leaf_size
            )));
        }
        if !self.plane_removal.distance_threshold.is_finite()
            || self.plane_removal.distance_threshold <= 0.0
        {
            return Err(Error::Config(format!(
                "plane distance_threshold {} must be positive",
                self.plane_removal.distance_threshold
            )));
        }
        if self.plane_removal.max_iterations == 0 {
            return Err(Error::Config(
                "plane max_iterations must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.plane_removal.min_remaining_ratio) {
            return Err(Error::Config(format!(
                "min_remaining_ratio {} must lie in [0, 1]",
                self.plane_removal.min_remaining_ratio
            )));
        }
        if !self.clustering.tolerance.is_finite() || self.clustering.tolerance <= 0.0 {
            return Err(Error::Config(format!(
                "clustering tolerance {} must be positive",
                self.clustering.tolerance
            )));
        }
        if self.clustering.min_cluster_size == 0
            || self.clustering.min_cluster_size > self.clustering.max_cluster_size
        {
            return Err(Error::Config(format!(
                "cluster size bounds [{}, {}] are not a valid interval",
                self.clustering.min_cluster_size, self.clustering.max_cluster_size
            )));
        }

        Ok(())
    }
}
