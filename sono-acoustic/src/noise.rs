//! Geradores de ruído injetáveis
//!
//! O simulador nunca usa aleatoriedade global: toda amostra vem de um
//! [`NoiseSource`] possuído pelo chamador, que pode ser ressemeado.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt::Debug;

/// Fonte de amostras normais padrão N(0, 1)
pub trait NoiseSource: Send + Sync + Debug {
    /// Preenche `out` com amostras N(0, 1)
    fn fill_standard_normal(&mut self, out: &mut [f64]);

    /// Reinicia o gerador com uma nova semente
    fn reseed(&mut self, seed: u64);

    /// Vetor com `len` amostras N(0, 1)
    fn standard_normal(&mut self, len: usize) -> Vec<f64> {
        let mut out = vec![0.0; len];
        self.fill_standard_normal(&mut out);
        out
    }
}

/// Ruído gaussiano branco com gerador semeável
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: StdRng,
}

impl GaussianNoise {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Gerador semeado pela entropia do sistema
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for GaussianNoise {
    fn fill_standard_normal(&mut self, out: &mut [f64]) {
        for sample in out.iter_mut() {
            *sample = StandardNormal.sample(&mut self.rng);
        }
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Fonte que só produz zeros (útil para isolar a propagação em testes)
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl NoiseSource for Silence {
    fn fill_standard_normal(&mut self, out: &mut [f64]) {
        out.fill(0.0);
    }

    fn reseed(&mut self, _seed: u64) {}
}
