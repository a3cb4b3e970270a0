use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cloudsift_algorithms::{segment_plane_with_rng, voxel_grid_filter};
use cloudsift_core::{Point3f, PointCloud};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_frame(n: usize, seed: u64) -> PointCloud<Point3f> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cloud = PointCloud::with_capacity(n);

    // Dominant plane at z = 0.5 with a little sensor noise
    for _ in 0..(n * 9 / 10) {
        cloud.push(Point3f::new(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            0.5 + rng.gen_range(-0.005..0.005),
        ));
    }

    // Foreground scatter
    for _ in 0..(n / 10) {
        cloud.push(Point3f::new(
            rng.gen_range(0.2..0.4),
            rng.gen_range(0.2..0.4),
            rng.gen_range(0.55..0.75),
        ));
    }

    cloud
}

fn bench_voxel_grid(c: &mut Criterion) {
    let cloud = synthetic_frame(10_000, 1);

    c.bench_function("voxel_grid_10k", |b| {
        b.iter(|| voxel_grid_filter(black_box(&cloud), 0.01).unwrap())
    });
}

fn bench_segment_plane(c: &mut Criterion) {
    let cloud = voxel_grid_filter(&synthetic_frame(10_000, 2), 0.01).unwrap();

    c.bench_function("segment_plane_downsampled", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(3);
            segment_plane_with_rng(black_box(&cloud), 0.02, 100, &mut rng).unwrap()
        })
    });
}

criterion_group!(benches, bench_voxel_grid, bench_segment_plane);
criterion_main!(benches);
