//! Single-frame pipeline demo
//!
//! Builds a synthetic tabletop frame — a dominant planar surface with two
//! object blobs resting above it — and runs it through the full pipeline.

use cloudsift_core::{Point3f, PointCloud};
use cloudsift_pipeline::Pipeline;
use rand::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let frame = synthetic_tabletop_frame();
    println!("Input frame: {} points", frame.len());

    let pipeline = Pipeline::with_defaults();
    let result = pipeline.process(&frame)?;

    println!("Planes removed: {}", result.planes_removed);
    println!("Foreground points: {}", result.filtered.len());
    println!("Object candidates: {}", result.clusters.len());

    for (i, cluster) in result.clusters.iter().enumerate() {
        let members = result.filtered.select(cluster);
        let centroid = members.centroid().expect("cluster is never empty");
        println!(
            "  candidate {}: {} points, centroid ({:.3}, {:.3}, {:.3})",
            i,
            cluster.len(),
            centroid.x,
            centroid.y,
            centroid.z
        );
    }

    Ok(())
}

/// A table surface at 0.5 m depth with two object blobs above it
fn synthetic_tabletop_frame() -> PointCloud<Point3f> {
    let mut rng = thread_rng();
    let mut frame = PointCloud::new();

    for _ in 0..12_000 {
        frame.push(Point3f::new(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            0.5 + rng.gen_range(-0.005..0.005),
        ));
    }

    for center in [
        Point3f::new(0.3, 0.3, 0.65),
        Point3f::new(0.7, 0.6, 0.62),
    ] {
        let mut placed = 0;
        while placed < 500 {
            let offset = Point3f::new(
                rng.gen_range(-0.08..0.08),
                rng.gen_range(-0.08..0.08),
                rng.gen_range(-0.08..0.08),
            );
            if offset.coords.norm() <= 0.08 {
                frame.push(center + offset.coords);
                placed += 1;
            }
        }
    }

    // A handful of far returns the crop should discard
    for _ in 0..50 {
        frame.push(Point3f::new(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(1.2..2.0),
        ));
    }

    frame
}
