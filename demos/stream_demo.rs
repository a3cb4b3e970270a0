//! Streaming demo: a sensor thread pushing frames through the depth-1
//! channel while the pipeline consumes them.
//!
//! The sensor deliberately produces frames faster than the pipeline can
//! process them; the channel's displacement semantics mean the pipeline
//! always works on the freshest frame and older ones are dropped.

use cloudsift_core::{Point3f, PointCloud};
use cloudsift_pipeline::{latest_frame_channel, FrameSink, FrameSource, Pipeline};
use rand::prelude::*;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (frame_tx, mut frame_rx) = latest_frame_channel::<PointCloud<Point3f>>();

    let sensor = std::thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(8);
        for i in 0..20 {
            let frame = sensor_frame(&mut rng, 0.6 + 0.01 * i as f32);
            if frame_tx.send(frame).is_some() {
                println!("sensor: frame {} displaced an unprocessed frame", i);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        // Dropping the sender ends the stream.
    });

    let pipeline = Pipeline::with_defaults();
    let mut processed = 0usize;
    while let Some(frame) = frame_rx.next_frame() {
        let result = pipeline.process(&frame)?;
        processed += 1;
        println!(
            "pipeline: {} foreground points, {} candidates",
            result.filtered.len(),
            result.clusters.len()
        );
        ReportSink.publish(result);
    }

    sensor.join().expect("sensor thread panicked");
    println!("processed {} of 20 produced frames", processed);

    Ok(())
}

struct ReportSink;

impl FrameSink<Point3f> for ReportSink {
    fn publish(&mut self, result: cloudsift_pipeline::FrameResult<Point3f>) {
        for cluster in &result.clusters {
            let members = result.filtered.select(cluster);
            if let Some((min, max)) = members.bounding_box() {
                println!(
                    "  candidate bbox: ({:.2}, {:.2}, {:.2}) .. ({:.2}, {:.2}, {:.2})",
                    min.x, min.y, min.z, max.x, max.y, max.z
                );
            }
        }
    }
}

/// A plane at 0.5 m with one object whose depth drifts frame to frame
fn sensor_frame(rng: &mut StdRng, object_z: f32) -> PointCloud<Point3f> {
    let mut frame = PointCloud::new();

    for _ in 0..8_000 {
        frame.push(Point3f::new(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            0.5 + rng.gen_range(-0.005..0.005),
        ));
    }

    let center = Point3f::new(0.4, 0.4, object_z);
    let mut placed = 0;
    while placed < 400 {
        let offset = Point3f::new(
            rng.gen_range(-0.07..0.07),
            rng.gen_range(-0.07..0.07),
            rng.gen_range(-0.07..0.07),
        );
        if offset.coords.norm() <= 0.07 {
            frame.push(center + offset.coords);
            placed += 1;
        }
    }

    frame
}
