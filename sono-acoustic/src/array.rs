//! Arranjo circular de microfones

use serde::{Deserialize, Serialize};
use sono_core::Position;
use std::f64::consts::PI;

use crate::error::{AcousticError, AcousticResult};

/// Configuração de um arranjo circular horizontal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayConfig {
    /// Centro do arranjo (m)
    pub center: [f64; 3],
    /// Raio do círculo de cápsulas (m)
    pub radius: f64,
    /// Número de cápsulas
    pub capsules: usize,
    /// Ângulo da primeira cápsula (rad)
    #[serde(default)]
    pub phi0: f64,
}

impl ArrayConfig {
    pub fn at(center: [f64; 3]) -> Self {
        Self {
            center,
            ..Self::default()
        }
    }

    /// Os três arranjos fixos da cena (R, G, B)
    pub fn default_layout() -> Vec<ArrayConfig> {
        vec![
            Self::at([0.8, 0.0, 0.1]),
            Self::at([0.2, -0.3, 0.1]),
            Self::at([0.2, 0.3, 0.1]),
        ]
    }
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            center: [0.8, 0.0, 0.1],
            radius: 0.035,
            capsules: 8,
            phi0: 0.0,
        }
    }
}

/// Arranjo de microfones com coordenadas absolutas das cápsulas
#[derive(Debug, Clone, PartialEq)]
pub struct MicrophoneArray {
    config: ArrayConfig,
    center: Position,
    capsules: Vec<Position>,
}

impl MicrophoneArray {
    pub fn new(config: ArrayConfig) -> AcousticResult<Self> {
        if config.capsules < 2 {
            return Err(AcousticError::InvalidConfig(format!(
                "Array needs at least 2 capsules, got {}",
                config.capsules
            )));
        }
        if !(config.radius.is_finite() && config.radius > 0.0) {
            return Err(AcousticError::InvalidConfig(format!(
                "Array radius must be positive, got {}",
                config.radius
            )));
        }
        if config.center.iter().any(|c| !c.is_finite()) {
            return Err(AcousticError::InvalidConfig("Array center must be finite".into()));
        }

        let center = Position::from(config.center);
        let capsules = (0..config.capsules)
            .map(|k| {
                let phi = config.phi0 + 2.0 * PI * k as f64 / config.capsules as f64;
                center + Position::new(config.radius * phi.cos(), config.radius * phi.sin(), 0.0)
            })
            .collect();

        Ok(Self {
            config,
            center,
            capsules,
        })
    }

    pub fn config(&self) -> &ArrayConfig {
        &self.config
    }

    pub fn center(&self) -> Position {
        self.center
    }

    /// Posições absolutas das cápsulas
    pub fn capsules(&self) -> &[Position] {
        &self.capsules
    }

    /// Posições relativas ao centro
    pub fn offsets(&self) -> Vec<Position> {
        self.capsules.iter().map(|c| c - self.center).collect()
    }

    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }
}
