//! Testes do módulo sono-acoustic

use super::*;

fn degree_distance(a: usize, b: usize) -> usize {
    let d = a.abs_diff(b) % 360;
    d.min(360 - d)
}

fn anechoic() -> RoomSimulator {
    let room = Room::new(RoomConfig::default()).unwrap();
    let config = SimulationConfig {
        max_order: 0,
        ..SimulationConfig::default()
    };
    RoomSimulator::new(room, config).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_pipeline_recovers_bearing_without_reflections() {
    let simulator = anechoic();
    let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();
    let mut noise = GaussianNoise::seeded(7);

    // Arranjo em (0.8, 0.0); fonte em (0.5, 0.3) → 135°
    let signal = simulator
        .simulate(&array, &[Position::new(0.5, 0.3, 0.1)], &mut noise)
        .unwrap();
    assert_eq!(signal.num_channels(), 8);

    let spectrogram = SpectralTransform::new(256).unwrap().analyze(&signal).unwrap();
    let grid = MusicDoa::new(&array.offsets(), 16_000, 256)
        .unwrap()
        .locate(&spectrogram)
        .unwrap();

    assert_eq!(grid.values().len(), BEARING_GRID_LEN);
    let peak = grid.peak_degree();
    assert!(degree_distance(peak, 135) <= 5, "peak at {}", peak);
}

#[test]
fn test_pipeline_with_reflections_is_well_formed() {
    let room = Room::new(RoomConfig::default()).unwrap();
    let simulator = RoomSimulator::new(room, SimulationConfig::default()).unwrap();
    let array = MicrophoneArray::new(ArrayConfig::at([0.2, -0.3, 0.1])).unwrap();
    let mut noise = GaussianNoise::seeded(1);

    let signal = simulator
        .simulate(
            &array,
            &[Position::new(0.5, 0.3, 0.1), Position::new(0.5, -0.3, 0.1)],
            &mut noise,
        )
        .unwrap();
    let spectrogram = SpectralTransform::new(256).unwrap().analyze(&signal).unwrap();
    let grid = MusicDoa::new(&array.offsets(), 16_000, 256)
        .unwrap()
        .locate(&spectrogram)
        .unwrap();

    assert!(grid.values().iter().all(|v| v.is_finite() && *v > 0.0));
}

#[test]
fn test_pipeline_is_reproducible_with_seed() {
    let simulator = anechoic();
    let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();
    let sources = [Position::new(0.5, -0.3, 0.1)];

    let mut a = GaussianNoise::seeded(99);
    let mut b = GaussianNoise::seeded(99);
    assert_eq!(
        simulator.simulate(&array, &sources, &mut a).unwrap(),
        simulator.simulate(&array, &sources, &mut b).unwrap()
    );
}

#[test]
fn test_source_outside_room_is_recoverable() {
    let simulator = anechoic();
    let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();
    let mut noise = Silence;

    let err = simulator
        .simulate(&array, &[Position::new(0.5, 0.3, 0.1), Position::new(3.0, 0.0, 0.1)], &mut noise)
        .unwrap_err();
    assert!(err.is_recoverable());
    assert!(matches!(err, AcousticError::SourceOutsideRoom { index: 1, .. }));
}

#[test]
fn test_array_outside_room_is_fatal() {
    let simulator = anechoic();
    let array = MicrophoneArray::new(ArrayConfig::at([5.0, 0.0, 0.1])).unwrap();
    let err = simulator
        .simulate(&array, &[Position::new(0.5, 0.3, 0.1)], &mut Silence)
        .unwrap_err();
    assert!(!err.is_recoverable());
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE INTEGRAÇÃO COM CORE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_error_converts_to_sensor_error() {
    let err: SensorError = AcousticError::SignalTooShort { samples: 3, nfft: 256 }.into();
    assert!(matches!(err, SensorError::ReadFailed(_)));
}

#[test]
fn test_default_sources_are_inside_room() {
    let room = Room::new(RoomConfig::default()).unwrap();
    for p in StaticSources::default().positions() {
        assert!(room.contains(&p));
    }
}
