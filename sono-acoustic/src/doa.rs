//! Estimador de direção de chegada MUSIC
//!
//! Para cada bin da faixa de análise:
//!
//! 1. covariância espacial `C = (1/T) Σ x xᴴ` sobre os quadros
//! 2. decomposição em autovalores; os `M − s` menores formam o subespaço de ruído `En`
//! 3. pseudo-espectro `P(θ) = 1 / Σ |eᴴ a(θ)|²` para `e ∈ En`
//!
//! A grade final é a média de `P` sobre os bins multiplicada por um ganho fixo.

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sono_core::Position;
use std::f64::consts::PI;
use std::ops::Range;

use crate::error::{AcousticError, AcousticResult};
use crate::stft::Spectrogram;
use crate::types::{BEARING_GRID_LEN, FrequencyBand, SpatialGrid};

/// Piso do denominador do pseudo-espectro
const MIN_DENOMINATOR: f64 = 1e-20;

/// Configuração do estimador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoaConfig {
    /// Velocidade do som (m/s)
    pub speed_of_sound: f64,
    /// Fontes a resolver por arranjo
    pub num_sources: usize,
    /// Faixa de análise
    pub freq_range: FrequencyBand,
    /// Limita a análise aos primeiros bins da faixa
    #[serde(default)]
    pub max_freq_bins: Option<usize>,
    /// Ganho aplicado à grade
    pub gain: f64,
}

impl Default for DoaConfig {
    fn default() -> Self {
        Self {
            speed_of_sound: 343.0,
            num_sources: 1,
            freq_range: FrequencyBand::default(),
            max_freq_bins: None,
            gain: 25.0,
        }
    }
}

/// MUSIC sobre uma grade de azimute de 1°
#[derive(Debug, Clone)]
pub struct MusicDoa {
    config: DoaConfig,
    sample_rate: u32,
    nfft: usize,
    num_mics: usize,
    bins: Range<usize>,
    /// Um bloco `M × 360` de vetores de direção por bin analisado
    steering: Vec<DMatrix<Complex64>>,
}

impl MusicDoa {
    /// Cria estimador com a configuração padrão
    pub fn new(offsets: &[Position], sample_rate: u32, nfft: usize) -> AcousticResult<Self> {
        Self::with_config(offsets, sample_rate, nfft, DoaConfig::default())
    }

    /// Cria estimador a partir das posições das cápsulas relativas ao centro
    pub fn with_config(
        offsets: &[Position],
        sample_rate: u32,
        nfft: usize,
        config: DoaConfig,
    ) -> AcousticResult<Self> {
        let num_mics = offsets.len();
        if num_mics < 2 {
            return Err(AcousticError::InvalidConfig(format!(
                "MUSIC needs at least 2 capsules, got {}",
                num_mics
            )));
        }
        if config.num_sources == 0 || config.num_sources >= num_mics {
            return Err(AcousticError::InvalidConfig(format!(
                "Number of sources must be in 1..{}, got {}",
                num_mics, config.num_sources
            )));
        }
        if !(config.speed_of_sound.is_finite() && config.speed_of_sound > 0.0) {
            return Err(AcousticError::InvalidConfig(format!(
                "Speed of sound must be positive, got {}",
                config.speed_of_sound
            )));
        }
        if !config.gain.is_finite() {
            return Err(AcousticError::InvalidConfig("Gain must be finite".into()));
        }
        if sample_rate == 0 {
            return Err(AcousticError::InvalidSampleRate(sample_rate));
        }
        if nfft < 2 {
            return Err(AcousticError::InvalidConfig(format!("Invalid FFT size {}", nfft)));
        }
        config.freq_range.validate(sample_rate)?;

        let mut bins = config.freq_range.bins(sample_rate, nfft);
        bins.end = bins.end.min(nfft / 2 + 1);
        if let Some(max) = config.max_freq_bins {
            bins.end = bins.end.min(bins.start + max);
        }
        if bins.is_empty() {
            return Err(AcousticError::InvalidConfig(format!(
                "Band [{}, {}] Hz selects no FFT bins",
                config.freq_range.low_hz, config.freq_range.high_hz
            )));
        }

        let steering = bins
            .clone()
            .map(|k| {
                let freq = k as f64 * sample_rate as f64 / nfft as f64;
                DMatrix::from_fn(num_mics, BEARING_GRID_LEN, |m, deg| {
                    let theta = (deg as f64).to_radians();
                    let r = &offsets[m];
                    let projection = r.x * theta.cos() + r.y * theta.sin();
                    Complex64::from_polar(1.0, 2.0 * PI * freq * projection / config.speed_of_sound)
                })
            })
            .collect();

        Ok(Self {
            config,
            sample_rate,
            nfft,
            num_mics,
            bins,
            steering,
        })
    }

    pub fn config(&self) -> &DoaConfig {
        &self.config
    }

    /// Bins de FFT analisados
    pub fn bins(&self) -> Range<usize> {
        self.bins.clone()
    }

    /// Estima a verossimilhança por grau de azimute
    pub fn locate(&self, spectrogram: &Spectrogram) -> AcousticResult<SpatialGrid> {
        if spectrogram.channels() != self.num_mics {
            return Err(AcousticError::ChannelMismatch {
                expected: self.num_mics,
                found: spectrogram.channels(),
            });
        }
        if spectrogram.nfft != self.nfft || spectrogram.sample_rate != self.sample_rate {
            return Err(AcousticError::InvalidConfig(format!(
                "Spectrogram ({} Hz, nfft {}) does not match estimator ({} Hz, nfft {})",
                spectrogram.sample_rate, spectrogram.nfft, self.sample_rate, self.nfft
            )));
        }
        let frames = spectrogram.frames();
        if frames == 0 {
            return Err(AcousticError::SignalTooShort {
                samples: 0,
                nfft: self.nfft,
            });
        }

        let noise_dim = self.num_mics - self.config.num_sources;
        let mut accum = vec![0.0; BEARING_GRID_LEN];

        for (k, steering) in self.bins.clone().zip(&self.steering) {
            let x = DMatrix::from_fn(self.num_mics, frames, |m, t| spectrogram.data[[t, k, m]]);
            let covariance = (&x * x.adjoint()) * Complex64::new(1.0 / frames as f64, 0.0);
            if covariance.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
                return Err(AcousticError::Numerical(format!(
                    "Non-finite covariance at bin {}",
                    k
                )));
            }

            let eigen = SymmetricEigen::try_new(covariance, f64::EPSILON, 0).ok_or_else(|| {
                AcousticError::Numerical(format!("Eigendecomposition failed at bin {}", k))
            })?;

            let mut order: Vec<usize> = (0..self.num_mics).collect();
            order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

            let noise = DMatrix::from_fn(self.num_mics, noise_dim, |m, j| {
                eigen.eigenvectors[(m, order[j])]
            });
            let projection = noise.adjoint() * steering;

            for (deg, column) in projection.column_iter().enumerate() {
                let denom = column.iter().map(|c| c.norm_sqr()).sum::<f64>();
                accum[deg] += 1.0 / denom.max(MIN_DENOMINATOR);
            }
        }

        let count = self.steering.len() as f64;
        accum.iter_mut().for_each(|v| *v /= count);
        tracing::trace!(
            bins = self.steering.len(),
            frames,
            "MUSIC pseudo-spectrum computed"
        );

        Ok(SpatialGrid::from_values(accum)?.scaled(self.config.gain))
    }
}
