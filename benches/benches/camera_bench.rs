//! # Camera Benchmarks
//!
//! Measures full frame rendering per post-processing variant and the
//! geometric stages that do not depend on the acoustic simulation.
//!
//! Run: `cargo bench --bench camera_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sono_acoustic::SpatialGrid;
use sono_camera::*;

/// Benchmark one render per variant at a reduced resolution
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    for post in [PostProcess::Plain, PostProcess::marker(), PostProcess::temporal()] {
        let config = CameraConfig {
            height: 120,
            width: 160,
            seed: Some(0),
            ..CameraConfig::with_post(post)
        };
        let mut camera = SoundCamera::with_config(config).unwrap();

        group.bench_with_input(BenchmarkId::new("variant", post.name()), &post, |b, _| {
            b.iter(|| {
                camera.start_recording();
                black_box(camera.render().unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark projection and assembly at full resolution
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    let scale = PixelScale::default();

    group.bench_function("bearing_map_480x640", |b| {
        b.iter(|| black_box(AngularProjector::for_center([0.8, 0.0, 0.1], 480, 640, &scale)))
    });

    let projector = AngularProjector::for_center([0.8, 0.0, 0.1], 480, 640, &scale);
    let grid = SpatialGrid::from_values((0..360).map(|d| d as f64 / 2.0).collect()).unwrap();
    group.bench_function("project_480x640", |b| {
        b.iter(|| black_box(projector.project(&grid)))
    });

    let maps = vec![projector.project(&grid); 3];
    group.bench_function("assemble_480x640", |b| {
        b.iter(|| black_box(assemble(&maps, 480, 640)))
    });

    let frame = assemble(&maps, 480, 640);
    group.bench_function("mark_peak_480x640", |b| {
        b.iter(|| black_box(mark_peak(&frame, 5, 100)))
    });

    let mut state = TemporalState::new(480, 640);
    group.bench_function("temporal_480x640", |b| {
        b.iter(|| black_box(state.apply(&frame, 0.2).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_render, bench_projection);
criterion_main!(benches);
