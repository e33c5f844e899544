//! Transformada de Fourier de tempo curto multicanal

use ndarray::Array3;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

use crate::error::{AcousticError, AcousticResult};
use crate::types::MultichannelSignal;

/// Tensor tempo–frequência–canal (`[frame, bin, channel]`)
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub sample_rate: u32,
    pub nfft: usize,
    pub data: Array3<Complex64>,
}

impl Spectrogram {
    pub fn frames(&self) -> usize {
        self.data.dim().0
    }

    /// Bins do espectro unilateral (`nfft / 2 + 1`)
    pub fn bins(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// Frequência central do bin `k` em Hz
    pub fn bin_frequency(&self, k: usize) -> f64 {
        k as f64 * self.sample_rate as f64 / self.nfft as f64
    }
}

/// STFT com janela retangular e salto fixo
#[derive(Clone)]
pub struct SpectralTransform {
    nfft: usize,
    hop: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for SpectralTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralTransform")
            .field("nfft", &self.nfft)
            .field("hop", &self.hop)
            .finish()
    }
}

impl SpectralTransform {
    /// Janela de `nfft` pontos com salto de meia janela
    pub fn new(nfft: usize) -> AcousticResult<Self> {
        Self::with_hop(nfft, nfft / 2)
    }

    pub fn with_hop(nfft: usize, hop: usize) -> AcousticResult<Self> {
        if nfft < 2 || !nfft.is_power_of_two() {
            return Err(AcousticError::InvalidConfig(format!(
                "FFT size must be a power of two >= 2, got {}",
                nfft
            )));
        }
        if hop == 0 || hop > nfft {
            return Err(AcousticError::InvalidConfig(format!(
                "Hop must be in 1..={}, got {}",
                nfft, hop
            )));
        }
        let fft = FftPlanner::new().plan_fft_forward(nfft);
        Ok(Self { nfft, hop, fft })
    }

    pub fn nfft(&self) -> usize {
        self.nfft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Número de quadros completos para `samples` amostras
    pub fn frame_count(&self, samples: usize) -> usize {
        if samples < self.nfft {
            0
        } else {
            (samples - self.nfft) / self.hop + 1
        }
    }

    /// Decompõe o sinal; todos os canais precisam de ao menos `nfft` amostras
    pub fn analyze(&self, signal: &MultichannelSignal) -> AcousticResult<Spectrogram> {
        let samples = signal.len();
        let frames = self.frame_count(samples);
        if frames == 0 {
            return Err(AcousticError::SignalTooShort {
                samples,
                nfft: self.nfft,
            });
        }

        let bins = self.nfft / 2 + 1;
        let mut data = Array3::<Complex64>::zeros((frames, bins, signal.num_channels()));
        let mut buf = vec![Complex64::new(0.0, 0.0); self.nfft];

        for (ch, channel) in signal.channels.iter().enumerate() {
            for t in 0..frames {
                let start = t * self.hop;
                for (b, s) in buf.iter_mut().zip(&channel[start..start + self.nfft]) {
                    *b = Complex64::new(*s, 0.0);
                }
                self.fft.process(&mut buf);
                for (k, value) in buf.iter().take(bins).enumerate() {
                    data[[t, k, ch]] = *value;
                }
            }
        }

        Ok(Spectrogram {
            sample_rate: signal.sample_rate,
            nfft: self.nfft,
            data,
        })
    }
}
