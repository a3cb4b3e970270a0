//! Per-frame processing pipeline
//!
//! One [`Pipeline`] context is built from a validated configuration and
//! then drives every frame through the same four stages: range crop,
//! voxel downsample, iterative plane removal, cluster extraction. The
//! pipeline holds no per-frame state; each frame is processed to
//! completion, independently, before the next one is accepted.

use crate::config::PipelineConfig;
use crate::transport::{FrameSink, FrameSource};
use cloudsift_algorithms::{
    euclidean_cluster, passthrough_filter, remove_planes_with_rng, voxel_grid_filter,
};
use cloudsift_core::{Centroid, PointCloud, Result};
use rand::prelude::*;

/// Output of processing a single frame
#[derive(Debug, Clone)]
pub struct FrameResult<P> {
    /// The plane-stripped foreground cloud
    pub filtered: PointCloud<P>,
    /// Candidate object clusters, as index-sets into `filtered`
    pub clusters: Vec<Vec<usize>>,
    /// How many planar surfaces the removal loop stripped
    pub planes_removed: usize,
}

/// Frame-processing context
///
/// Construct once, then call [`Pipeline::process`] per frame or hand the
/// pipeline a source and sink via [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build a pipeline with the default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one frame into a filtered cloud and its cluster candidates
    ///
    /// Pure with respect to the pipeline: the output depends only on the
    /// frame and the configuration (plane fitting draws its random samples
    /// from the thread rng; see [`Pipeline::process_with_rng`] for a
    /// reproducible variant). An empty or fully out-of-range frame flows
    /// through as an empty result without error.
    pub fn process<P>(&self, frame: &PointCloud<P>) -> Result<FrameResult<P>>
    where
        P: Centroid + Clone + Sync,
    {
        self.process_with_rng(frame, &mut thread_rng())
    }

    /// [`Pipeline::process`] driving a caller-supplied random number generator
    pub fn process_with_rng<P, R>(&self, frame: &PointCloud<P>, rng: &mut R) -> Result<FrameResult<P>>
    where
        P: Centroid + Clone + Sync,
        R: Rng,
    {
        let crop = &self.config.crop;
        let cropped = passthrough_filter(frame, crop.axis, crop.lo, crop.hi);

        let downsampled = voxel_grid_filter(&cropped, self.config.voxel.leaf_size)?;
        tracing::debug!(
            input = frame.len(),
            cropped = cropped.len(),
            downsampled = downsampled.len(),
            "frame reduced"
        );

        let plane = &self.config.plane_removal;
        let removal = remove_planes_with_rng(
            &downsampled,
            plane.distance_threshold,
            plane.max_iterations,
            plane.min_remaining_ratio,
            rng,
        )?;
        if removal.planes.is_empty() {
            tracing::debug!("no planar model found");
        }

        let clustering = &self.config.clustering;
        let clusters = euclidean_cluster(
            &removal.cloud,
            clustering.tolerance,
            clustering.min_cluster_size,
            clustering.max_cluster_size,
        );
        tracing::info!(
            planes = removal.planes.len(),
            remaining = removal.cloud.len(),
            clusters = clusters.len(),
            "frame processed"
        );

        Ok(FrameResult {
            filtered: removal.cloud,
            planes_removed: removal.planes.len(),
            clusters,
        })
    }

    /// Drive the pipeline from a frame source into a result sink
    ///
    /// Pulls frames one at a time and processes each to completion before
    /// asking for the next; returns when the source reports end of stream.
    /// Frames that fail to process are logged and skipped, not fatal.
    pub fn run<P, S, K>(&self, source: &mut S, sink: &mut K)
    where
        P: Centroid + Clone + Sync,
        S: FrameSource<P>,
        K: FrameSink<P>,
    {
        while let Some(frame) = source.next_frame() {
            match self.process(&frame) {
                Ok(result) => sink.publish(result),
                Err(e) => tracing::warn!("dropping frame: {}", e),
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}
