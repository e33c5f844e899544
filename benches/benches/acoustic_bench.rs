//! # Acoustic Benchmarks
//!
//! Measures the per-array stages: room simulation, STFT and MUSIC.
//!
//! Run: `cargo bench --bench acoustic_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sono_acoustic::*;

fn default_array() -> MicrophoneArray {
    MicrophoneArray::new(ArrayConfig::default()).unwrap()
}

/// Benchmark simulation by reflection order
fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    group.sample_size(10);

    let array = default_array();
    let sources = [Position::new(0.5, 0.3, 0.1), Position::new(0.5, -0.3, 0.1)];

    for order in [0u32, 1, 3] {
        let room = Room::new(RoomConfig::default()).unwrap();
        let config = SimulationConfig {
            max_order: order,
            ..SimulationConfig::default()
        };
        let simulator = RoomSimulator::new(room, config).unwrap();
        let mut noise = GaussianNoise::seeded(0);

        group.bench_with_input(BenchmarkId::new("max_order", order), &order, |b, _| {
            b.iter(|| black_box(simulator.simulate(&array, &sources, &mut noise).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark image-source enumeration
fn bench_image_sources(c: &mut Criterion) {
    let room = Room::new(RoomConfig::default()).unwrap();
    let source = Position::new(0.5, 0.3, 0.1);

    c.bench_function("image_sources_order_3", |b| {
        b.iter(|| black_box(room.image_sources(&source, 3)))
    });
}

/// Benchmark STFT and MUSIC on one second of signal
fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    let array = default_array();
    let room = Room::new(RoomConfig::default()).unwrap();
    let simulator = RoomSimulator::new(room, SimulationConfig::default()).unwrap();
    let signal = simulator
        .simulate(&array, &[Position::new(0.5, 0.3, 0.1)], &mut GaussianNoise::seeded(1))
        .unwrap();

    let stft = SpectralTransform::new(256).unwrap();
    group.bench_function("stft_256", |b| b.iter(|| black_box(stft.analyze(&signal).unwrap())));

    let spectrogram = stft.analyze(&signal).unwrap();
    let doa = MusicDoa::new(&array.offsets(), 16_000, 256).unwrap();
    group.bench_function("music_locate", |b| {
        b.iter(|| black_box(doa.locate(&spectrogram).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_simulate, bench_image_sources, bench_analysis);
criterion_main!(benches);
