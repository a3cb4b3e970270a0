//! End-to-end scenarios: synthetic sensor frames through the full
//! crop → downsample → plane-removal → clustering pipeline.

use approx::assert_relative_eq;
use cloudsift_core::{ColoredPoint3f, Point3f, PointCloud};
use cloudsift_pipeline::{
    latest_frame_channel, Pipeline, PipelineConfig, VecFrameSink, VecFrameSource,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniformly fills a horizontal slab of the given extent centered at `z`.
fn slab(rng: &mut StdRng, count: usize, z: f32, thickness: f32) -> Vec<Point3f> {
    (0..count)
        .map(|_| {
            Point3f::new(
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                z + rng.gen_range(-thickness / 2.0..thickness / 2.0),
            )
        })
        .collect()
}

/// Uniformly fills a ball of the given radius around `center`.
fn ball(rng: &mut StdRng, count: usize, center: Point3f, radius: f32) -> Vec<Point3f> {
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let offset = Point3f::new(
            rng.gen_range(-radius..radius),
            rng.gen_range(-radius..radius),
            rng.gen_range(-radius..radius),
        );
        if offset.coords.norm() <= radius {
            points.push(center + offset.coords);
        }
    }
    points
}

#[test]
fn slab_scene_reduces_to_single_blob_cluster() {
    let mut rng = StdRng::seed_from_u64(1234);
    let blob_center = Point3f::new(0.3, 0.3, 0.65);

    let mut frame = PointCloud::new();
    frame.extend(slab(&mut rng, 10_000, 0.5, 0.01));
    frame.extend(ball(&mut rng, 600, blob_center, 0.1));
    // Points outside the depth window must never reach later stages
    frame.push(Point3f::new(0.5, 0.5, 1.4));
    frame.push(Point3f::new(0.5, 0.5, -0.3));

    let pipeline = Pipeline::with_defaults();
    let mut process_rng = StdRng::seed_from_u64(99);
    let result = pipeline.process_with_rng(&frame, &mut process_rng).unwrap();

    // The slab is the single dominant plane and is gone entirely
    assert_eq!(result.planes_removed, 1);
    for point in &result.filtered {
        assert!(
            point.z > 0.53,
            "slab point survived plane removal: {:?}",
            point
        );
        assert!((point - blob_center).norm() <= 0.11);
    }

    // Exactly one candidate object remains, close to the blob's size
    assert_eq!(result.clusters.len(), 1);
    let cluster = &result.clusters[0];
    assert!(
        cluster.len() >= 400 && cluster.len() <= 620,
        "unexpected cluster size {}",
        cluster.len()
    );

    // Cluster indices address the filtered cloud
    for &idx in cluster {
        assert!(idx < result.filtered.len());
    }

    // The candidate sits where the blob was placed
    let members = result.filtered.select(cluster);
    let centroid = members.centroid().unwrap();
    assert_relative_eq!(centroid.x, blob_center.x, epsilon = 0.02);
    assert_relative_eq!(centroid.y, blob_center.y, epsilon = 0.02);
    assert_relative_eq!(centroid.z, blob_center.z, epsilon = 0.02);
}

#[test]
fn empty_frame_produces_empty_outputs() {
    let pipeline = Pipeline::with_defaults();
    let result = pipeline.process(&PointCloud::<Point3f>::new()).unwrap();

    assert!(result.filtered.is_empty());
    assert!(result.clusters.is_empty());
    assert_eq!(result.planes_removed, 0);
}

#[test]
fn fully_cropped_frame_produces_empty_outputs() {
    let mut rng = StdRng::seed_from_u64(7);
    let frame = PointCloud::from_points(slab(&mut rng, 500, 2.0, 0.01));

    let pipeline = Pipeline::with_defaults();
    let result = pipeline.process(&frame).unwrap();

    assert!(result.filtered.is_empty());
    assert!(result.clusters.is_empty());
}

#[test]
fn clusters_are_disjoint_and_bounded() {
    let mut rng = StdRng::seed_from_u64(42);

    let mut frame = PointCloud::new();
    frame.extend(slab(&mut rng, 8_000, 0.45, 0.01));
    frame.extend(ball(&mut rng, 250, Point3f::new(0.25, 0.25, 0.62), 0.08));
    frame.extend(ball(&mut rng, 200, Point3f::new(0.75, 0.75, 0.66), 0.08));

    let pipeline = Pipeline::with_defaults();
    let mut process_rng = StdRng::seed_from_u64(5);
    let result = pipeline.process_with_rng(&frame, &mut process_rng).unwrap();

    assert_eq!(result.clusters.len(), 2);

    let mut seen = vec![false; result.filtered.len()];
    let config = pipeline.config();
    for cluster in &result.clusters {
        assert!(cluster.len() >= config.clustering.min_cluster_size);
        assert!(cluster.len() <= config.clustering.max_cluster_size);
        for &idx in cluster {
            assert!(idx < result.filtered.len());
            assert!(!seen[idx], "index {} appears in two clusters", idx);
            seen[idx] = true;
        }
    }
}

#[test]
fn colored_frames_flow_through_generically() {
    let mut rng = StdRng::seed_from_u64(21);

    let mut frame = PointCloud::new();
    for p in slab(&mut rng, 3_000, 0.5, 0.01) {
        frame.push(ColoredPoint3f {
            position: p,
            color: [200, 180, 160],
        });
    }
    for p in ball(&mut rng, 300, Point3f::new(0.4, 0.4, 0.7), 0.07) {
        frame.push(ColoredPoint3f {
            position: p,
            color: [30, 90, 200],
        });
    }

    let mut config = PipelineConfig::default();
    config.clustering.min_cluster_size = 50;

    let pipeline = Pipeline::new(config).unwrap();
    let mut process_rng = StdRng::seed_from_u64(77);
    let result = pipeline.process_with_rng(&frame, &mut process_rng).unwrap();

    assert_eq!(result.clusters.len(), 1);
    // The surviving cluster is the blue blob; colors came through the
    // voxel stage intact.
    for &idx in &result.clusters[0] {
        let point = &result.filtered[idx];
        assert!(point.color[2] > point.color[0]);
    }
}

#[test]
fn run_drains_source_into_sink_in_order() {
    let mut rng = StdRng::seed_from_u64(3);

    let quiet = PointCloud::from_points(ball(
        &mut rng,
        40,
        Point3f::new(0.5, 0.5, 0.5),
        0.05,
    ));
    let empty = PointCloud::<Point3f>::new();

    let mut source = VecFrameSource::new(vec![quiet.clone(), empty, quiet]);
    let mut sink = VecFrameSink::new();

    let pipeline = Pipeline::with_defaults();
    pipeline.run(&mut source, &mut sink);

    assert_eq!(sink.results.len(), 3);
    assert!(sink.results[1].filtered.is_empty());
}

#[test]
fn latest_frame_channel_keeps_only_newest_frame() {
    let (tx, rx) = latest_frame_channel::<PointCloud<Point3f>>();

    tx.send(PointCloud::from_points(vec![Point3f::new(0.0, 0.0, 0.1)]));
    tx.send(PointCloud::from_points(vec![
        Point3f::new(0.0, 0.0, 0.2),
        Point3f::new(0.0, 0.0, 0.3),
    ]));

    let delivered = rx.try_recv().unwrap();
    assert_eq!(delivered.len(), 2);
    assert!(rx.try_recv().is_none());
}
