//! Tipos de dados acústicos

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{AcousticError, AcousticResult};

/// Número de pontos da grade de azimute (1 grau de resolução)
pub const BEARING_GRID_LEN: usize = 360;

/// Faixa de frequências de análise em Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// Valida a faixa contra a frequência de Nyquist
    pub fn validate(&self, sample_rate: u32) -> AcousticResult<()> {
        let nyquist = sample_rate as f64 / 2.0;
        if !(self.low_hz >= 0.0 && self.low_hz < self.high_hz && self.high_hz <= nyquist) {
            return Err(AcousticError::InvalidConfig(format!(
                "Frequency band [{}, {}] Hz must satisfy 0 <= low < high <= {}",
                self.low_hz, self.high_hz, nyquist
            )));
        }
        Ok(())
    }

    /// Bins de FFT cobertos pela faixa (intervalo semiaberto)
    pub fn bins(&self, sample_rate: u32, nfft: usize) -> Range<usize> {
        let to_bin = |hz: f64| (hz / sample_rate as f64 * nfft as f64).round() as usize;
        to_bin(self.low_hz)..to_bin(self.high_hz)
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self::new(300.0, 3500.0)
    }
}

/// Sinal multicanal no domínio do tempo (um canal por cápsula)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultichannelSignal {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f64>>,
}

impl MultichannelSignal {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f64>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Cria sinal silencioso
    pub fn silence(sample_rate: u32, num_channels: usize, samples: usize) -> Self {
        Self::new(sample_rate, vec![vec![0.0; samples]; num_channels])
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Amostras por canal (o menor canal, se houver divergência)
    pub fn len(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retorna duração em milissegundos
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.len() as u64 * 1000 / self.sample_rate as u64) as u32
    }

    /// RMS sobre todos os canais
    pub fn rms(&self) -> f64 {
        let count: usize = self.channels.iter().map(Vec::len).sum();
        if count == 0 {
            return 0.0;
        }
        let sum_squares: f64 = self.channels.iter().flatten().map(|s| s * s).sum();
        (sum_squares / count as f64).sqrt()
    }

    /// Maior valor absoluto
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }
}

/// Verossimilhança espacial por grau inteiro de azimute (0–359)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialGrid {
    values: Vec<f64>,
}

impl SpatialGrid {
    /// Cria grade a partir de 360 valores
    pub fn from_values(values: Vec<f64>) -> AcousticResult<Self> {
        if values.len() != BEARING_GRID_LEN {
            return Err(AcousticError::InvalidConfig(format!(
                "Bearing grid needs {} values, got {}",
                BEARING_GRID_LEN,
                values.len()
            )));
        }
        Ok(Self { values })
    }

    /// Grade nula
    pub fn zeros() -> Self {
        Self {
            values: vec![0.0; BEARING_GRID_LEN],
        }
    }

    /// Valor no grau `degree` (reduzido módulo 360)
    pub fn at_degree(&self, degree: usize) -> f64 {
        self.values[degree % BEARING_GRID_LEN]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Grau de maior verossimilhança (primeira ocorrência em empate)
    pub fn peak_degree(&self) -> usize {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v > self.values[best] {
                best = i;
            }
        }
        best
    }

    /// Multiplica todos os valores por `gain`
    pub fn scaled(mut self, gain: f64) -> Self {
        self.values.iter_mut().for_each(|v| *v *= gain);
        self
    }
}
