//! Simulador acústico de sala (modelo de fontes-imagem)
//!
//! Para cada cápsula do arranjo, a resposta ao impulso da sala é sintetizada
//! no domínio da frequência (atrasos fracionários exatos, espalhamento
//! esférico e absorção do ar) e convolvida via FFT com o sinal de cada fonte.
//! Ruído branco gaussiano de sensor é somado ao final.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use sono_core::Position;
use std::f64::consts::PI;
use std::fmt;

use crate::array::MicrophoneArray;
use crate::error::{AcousticError, AcousticResult};
use crate::noise::NoiseSource;
use crate::room::{air_absorption_coefficient, ImageSource, Room};
use crate::types::MultichannelSignal;

/// Amostras extras na resposta ao impulso além do atraso máximo
const RIR_GUARD_SAMPLES: usize = 64;

/// Atraso fixo que mantém os lóbulos anteriores de cada sinc dentro da
/// resposta; removido do sinal após a convolução
pub const RIR_PRE_DELAY: usize = 40;

/// Distância mínima fonte–cápsula (evita ganho infinito)
const MIN_DISTANCE: f64 = 1e-3;

/// Configuração da simulação
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub sample_rate: u32,
    /// Ordem máxima de reflexão
    pub max_order: u32,
    /// Variância do ruído branco de sensor
    #[serde(default = "default_sigma2_awgn")]
    pub sigma2_awgn: f64,
    /// Velocidade do som (m/s)
    #[serde(default = "default_speed_of_sound")]
    pub speed_of_sound: f64,
    /// Duração do ruído gerado por fonte (ms)
    #[serde(default = "default_source_duration_ms")]
    pub source_duration_ms: u32,
}

fn default_sigma2_awgn() -> f64 {
    10f64.sqrt() / (4.0 * PI * 2.0).powi(2)
}

fn default_speed_of_sound() -> f64 {
    343.0
}

fn default_source_duration_ms() -> u32 {
    1000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            max_order: 3,
            sigma2_awgn: default_sigma2_awgn(),
            speed_of_sound: default_speed_of_sound(),
            source_duration_ms: default_source_duration_ms(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> AcousticResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192_000 {
            return Err(AcousticError::InvalidSampleRate(self.sample_rate));
        }
        if !(self.speed_of_sound.is_finite() && self.speed_of_sound > 0.0) {
            return Err(AcousticError::InvalidConfig(format!(
                "Speed of sound must be positive, got {}",
                self.speed_of_sound
            )));
        }
        if !(self.sigma2_awgn.is_finite() && self.sigma2_awgn >= 0.0) {
            return Err(AcousticError::InvalidConfig(format!(
                "Noise variance must be >= 0, got {}",
                self.sigma2_awgn
            )));
        }
        if self.source_duration_ms == 0 {
            return Err(AcousticError::InvalidConfig("Source duration must be > 0".into()));
        }
        Ok(())
    }

    /// Amostras de sinal geradas por fonte
    pub fn source_samples(&self) -> usize {
        (self.sample_rate as u64 * self.source_duration_ms as u64 / 1000) as usize
    }
}

/// Simulador de propagação sala → arranjo
#[derive(Clone)]
pub struct RoomSimulator {
    room: Room,
    config: SimulationConfig,
}

impl fmt::Debug for RoomSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomSimulator")
            .field("room", &self.room)
            .field("config", &self.config)
            .finish()
    }
}

impl RoomSimulator {
    pub fn new(room: Room, config: SimulationConfig) -> AcousticResult<Self> {
        config.validate()?;
        Ok(Self { room, config })
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Verifica se todas as cápsulas estão dentro da sala
    pub fn check_array(&self, array: &MicrophoneArray) -> AcousticResult<()> {
        match array.capsules().iter().position(|c| !self.room.contains(c)) {
            Some(capsule) => Err(AcousticError::MicrophoneOutsideRoom { capsule }),
            None => Ok(()),
        }
    }

    /// Sinal recebido por `array` com as fontes em `sources`.
    ///
    /// Cada fonte emite `source_samples()` amostras de ruído N(0, 1) tiradas
    /// de `noise`, sem atraso inicial. Retorna
    /// [`AcousticError::SourceOutsideRoom`] se alguma fonte estiver fora.
    pub fn simulate(
        &self,
        array: &MicrophoneArray,
        sources: &[Position],
        noise: &mut dyn NoiseSource,
    ) -> AcousticResult<MultichannelSignal> {
        self.check_array(array)?;
        for (index, s) in sources.iter().enumerate() {
            if !self.room.contains(s) {
                return Err(AcousticError::SourceOutsideRoom {
                    index,
                    x: s.x,
                    y: s.y,
                    z: s.z,
                });
            }
        }

        let n = self.config.source_samples();
        let images: Vec<Vec<ImageSource>> = sources
            .iter()
            .map(|s| self.room.image_sources(s, self.config.max_order))
            .collect();

        let rir_len = self.rir_len(&images, array);
        let full_len = n + rir_len - 1;
        let out_len = full_len - RIR_PRE_DELAY;
        let conv_len = full_len.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let rir_inverse = planner.plan_fft_inverse(rir_len);
        let forward = planner.plan_fft_forward(conv_len);
        let inverse = planner.plan_fft_inverse(conv_len);

        let spectra: Vec<Vec<Complex64>> = sources
            .iter()
            .map(|_| {
                let signal = noise.standard_normal(n);
                let mut buf = padded(&signal, conv_len);
                forward.process(&mut buf);
                buf
            })
            .collect();

        let noise_std = self.config.sigma2_awgn.sqrt();
        let scale = 1.0 / conv_len as f64;
        let mut channels = Vec::with_capacity(array.len());

        for capsule in array.capsules() {
            let mut acc = vec![Complex64::new(0.0, 0.0); conv_len];
            for (source_images, spectrum) in images.iter().zip(&spectra) {
                let rir = self.rir_from_images(source_images, capsule, rir_len, rir_inverse.as_ref());
                let mut h = padded(&rir, conv_len);
                forward.process(&mut h);
                for ((a, s), h) in acc.iter_mut().zip(spectrum).zip(&h) {
                    *a += s * h;
                }
            }
            inverse.process(&mut acc);

            let mut channel: Vec<f64> = acc[RIR_PRE_DELAY..full_len]
                .iter()
                .map(|c| c.re * scale)
                .collect();
            if noise_std > 0.0 {
                let sensor = noise.standard_normal(out_len);
                for (x, w) in channel.iter_mut().zip(sensor) {
                    *x += noise_std * w;
                }
            }
            channels.push(channel);
        }

        tracing::trace!(
            capsules = array.len(),
            sources = sources.len(),
            rir_len,
            samples = out_len,
            "room simulation complete"
        );

        Ok(MultichannelSignal::new(self.config.sample_rate, channels))
    }

    /// Resposta ao impulso fonte → cápsula, comprimento potência de 2.
    ///
    /// Inclui o atraso fixo de [`RIR_PRE_DELAY`] amostras.
    pub fn impulse_response(&self, source: &Position, capsule: &Position) -> Vec<f64> {
        let images = vec![self.room.image_sources(source, self.config.max_order)];
        let rir_len = self.rir_len_for(&images, std::slice::from_ref(capsule));
        let inverse = FftPlanner::<f64>::new().plan_fft_inverse(rir_len);
        self.rir_from_images(&images[0], capsule, rir_len, inverse.as_ref())
    }

    fn rir_len(&self, images: &[Vec<ImageSource>], array: &MicrophoneArray) -> usize {
        self.rir_len_for(images, array.capsules())
    }

    fn rir_len_for(&self, images: &[Vec<ImageSource>], capsules: &[Position]) -> usize {
        let max_distance = images
            .iter()
            .flatten()
            .flat_map(|img| capsules.iter().map(move |c| (img.position - c).norm()))
            .fold(0.0_f64, f64::max);
        let max_delay = (max_distance / self.config.speed_of_sound * self.config.sample_rate as f64).ceil();
        (max_delay as usize + RIR_PRE_DELAY + RIR_GUARD_SAMPLES).next_power_of_two()
    }

    fn rir_from_images(
        &self,
        images: &[ImageSource],
        capsule: &Position,
        rir_len: usize,
        inverse: &dyn Fft<f64>,
    ) -> Vec<f64> {
        let fs = self.config.sample_rate as f64;
        let c = self.config.speed_of_sound;
        let air = self.room.air_absorption();
        let half = rir_len / 2;
        let pre_delay = RIR_PRE_DELAY as f64 / fs;

        let paths: Vec<(f64, f64)> = images
            .iter()
            .map(|img| {
                let d = (img.position - capsule).norm().max(MIN_DISTANCE);
                (d, img.gain / (4.0 * PI * d))
            })
            .collect();

        let mut spectrum = vec![Complex64::new(0.0, 0.0); rir_len];
        for (k, bin) in spectrum.iter_mut().enumerate().take(half + 1) {
            let f = k as f64 * fs / rir_len as f64;
            let alpha = if air { air_absorption_coefficient(f) } else { 0.0 };
            *bin = paths
                .iter()
                .map(|&(d, amp)| {
                    let attenuation = if air { (-0.5 * alpha * d).exp() } else { 1.0 };
                    Complex64::from_polar(amp * attenuation, -2.0 * PI * f * (d / c + pre_delay))
                })
                .sum();
        }
        // Simetria hermitiana para resposta real
        spectrum[half] = Complex64::new(spectrum[half].re, 0.0);
        for k in 1..half {
            spectrum[rir_len - k] = spectrum[k].conj();
        }

        inverse.process(&mut spectrum);
        spectrum.iter().map(|v| v.re / rir_len as f64).collect()
    }
}

fn padded(signal: &[f64], len: usize) -> Vec<Complex64> {
    let mut buf = vec![Complex64::new(0.0, 0.0); len];
    for (b, s) in buf.iter_mut().zip(signal) {
        b.re = *s;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ArrayConfig;
    use crate::noise::{GaussianNoise, Silence};
    use crate::room::RoomConfig;

    /// Emite um impulso unitário na primeira amostra de cada sinal
    #[derive(Debug)]
    struct Impulse;

    impl NoiseSource for Impulse {
        fn fill_standard_normal(&mut self, out: &mut [f64]) {
            out.fill(0.0);
            if let Some(first) = out.first_mut() {
                *first = 1.0;
            }
        }

        fn reseed(&mut self, _seed: u64) {}
    }

    fn simulator(config: SimulationConfig) -> RoomSimulator {
        RoomSimulator::new(Room::new(RoomConfig::default()).unwrap(), config).unwrap()
    }

    fn sources() -> Vec<Position> {
        vec![Position::new(0.5, 0.3, 0.04), Position::new(0.5, -0.3, 0.04)]
    }

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.source_samples(), 16_000);
        assert!((config.sigma2_awgn - 0.005_006_3).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulationConfig { sample_rate: 1000, ..SimulationConfig::default() };
        assert_eq!(config.validate(), Err(AcousticError::InvalidSampleRate(1000)));

        let config = SimulationConfig { sigma2_awgn: -1.0, ..SimulationConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_simulate_shape() {
        let sim = simulator(SimulationConfig::default());
        let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();
        let mut noise = GaussianNoise::seeded(3);

        let signal = sim.simulate(&array, &sources(), &mut noise).unwrap();
        assert_eq!(signal.num_channels(), 8);
        assert!(signal.len() > 16_000);
        assert_eq!(signal.sample_rate, 16_000);
        assert!(signal.rms() > 0.0);
    }

    #[test]
    fn test_simulate_is_deterministic_for_a_seed() {
        let sim = simulator(SimulationConfig::default());
        let array = MicrophoneArray::new(ArrayConfig::at([0.2, 0.3, 0.1])).unwrap();

        let a = sim.simulate(&array, &sources(), &mut GaussianNoise::seeded(9)).unwrap();
        let b = sim.simulate(&array, &sources(), &mut GaussianNoise::seeded(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_source_outside_room() {
        let sim = simulator(SimulationConfig::default());
        let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();
        let sources = vec![Position::new(0.5, 0.3, 0.04), Position::new(1.7, 0.0, 0.04)];

        let err = sim.simulate(&array, &sources, &mut Silence).unwrap_err();
        assert!(matches!(err, AcousticError::SourceOutsideRoom { index: 1, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_microphone_outside_room_is_fatal() {
        let sim = simulator(SimulationConfig::default());
        let array = MicrophoneArray::new(ArrayConfig::at([1.49, 0.0, 0.1])).unwrap();

        let err = sim.simulate(&array, &sources(), &mut Silence).unwrap_err();
        assert!(matches!(err, AcousticError::MicrophoneOutsideRoom { capsule: 0 }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_silence_in_silence_out() {
        let config = SimulationConfig { sigma2_awgn: 0.0, ..SimulationConfig::default() };
        let sim = simulator(config);
        let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();

        let signal = sim.simulate(&array, &sources(), &mut Silence).unwrap();
        assert!(signal.peak() < 1e-12);
    }

    #[test]
    fn test_direct_path_delay() {
        let config = SimulationConfig {
            max_order: 0,
            sigma2_awgn: 0.0,
            ..SimulationConfig::default()
        };
        let room = Room::new(RoomConfig { air_absorption: false, ..RoomConfig::default() }).unwrap();
        let sim = RoomSimulator::new(room, config).unwrap();
        let array = MicrophoneArray::new(ArrayConfig::default()).unwrap();
        let source = Position::new(0.2, 0.0, 0.1);

        let signal = sim.simulate(&array, &[source], &mut Impulse).unwrap();
        for (capsule, channel) in array.capsules().iter().zip(&signal.channels) {
            let d = (source - capsule).norm();
            let expected = (d / 343.0 * 16_000.0).round() as usize;
            let (argmax, peak) = channel
                .iter()
                .enumerate()
                .fold((0, f64::MIN), |best, (i, v)| if *v > best.1 { (i, *v) } else { best });
            assert_eq!(argmax, expected);
            assert!(peak > 0.5 / (4.0 * PI * d) && peak < 1.0 / (4.0 * PI * d) + 1e-9);
        }
    }

    #[test]
    fn test_fractional_delay_does_not_wrap() {
        let config = SimulationConfig {
            max_order: 0,
            sigma2_awgn: 0.0,
            ..SimulationConfig::default()
        };
        let room = Room::new(RoomConfig { air_absorption: false, ..RoomConfig::default() }).unwrap();
        let sim = RoomSimulator::new(room, config).unwrap();

        // 4.5 amostras: o pior caso para os lóbulos da sinc
        let capsule = Position::new(0.5, 0.0, 1.0);
        let source = capsule + Position::new(4.5 * 343.0 / 16_000.0, 0.0, 0.0);
        let rir = sim.impulse_response(&source, &capsule);

        let (argmax, peak) = rir
            .iter()
            .enumerate()
            .fold((0, 0.0_f64), |best, (i, v)| if v.abs() > best.1 { (i, v.abs()) } else { best });
        assert!(argmax == RIR_PRE_DELAY + 4 || argmax == RIR_PRE_DELAY + 5, "peak at {}", argmax);
        assert!(rir[rir.len() - 8..].iter().all(|v| v.abs() < 0.02 * peak));
        assert!(rir[..8].iter().all(|v| v.abs() < 0.02 * peak));
    }

    #[test]
    fn test_impulse_response_energy_grows_with_order() {
        let source = Position::new(0.5, 0.3, 0.04);
        let capsule = Position::new(0.8, 0.0, 0.1);

        let direct = simulator(SimulationConfig { max_order: 0, ..SimulationConfig::default() })
            .impulse_response(&source, &capsule);
        let reverberant = simulator(SimulationConfig::default()).impulse_response(&source, &capsule);

        let energy = |rir: &[f64]| rir.iter().map(|v| v * v).sum::<f64>();
        assert!(direct.len().is_power_of_two());
        assert!(energy(&reverberant) > energy(&direct));
    }
}
