//! Pós-processamento do quadro montado
//!
//! | Variante | Saída |
//! |:---------|:------|
//! | `Plain` | quadro base inalterado |
//! | `Marker` | R = energia, G = quadrado no pico, B = limiar de energia |
//! | `Temporal` | acumulador multiplicativo persistente entre chamadas |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CameraError, CameraResult};
use crate::types::{Frame, Pixel};

/// Valor inicial de cada célula do acumulador temporal
pub const TEMPORAL_INITIAL: f32 = 127.5;
/// Faixa do acumulador temporal
pub const TEMPORAL_FLOOR: f32 = 30.0;
pub const TEMPORAL_CEIL: f32 = 255.0;

/// Variante de pós-processamento
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PostProcess {
    Plain,
    Marker {
        /// Meia largura do quadrado marcador
        size: usize,
        /// Energia acima da qual o azul satura
        threshold: u8,
    },
    Temporal {
        weight: f32,
    },
}

impl PostProcess {
    pub fn marker() -> Self {
        PostProcess::Marker {
            size: 5,
            threshold: 100,
        }
    }

    pub fn temporal() -> Self {
        PostProcess::Temporal { weight: 0.2 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PostProcess::Plain => "plain",
            PostProcess::Marker { .. } => "marker",
            PostProcess::Temporal { .. } => "temporal",
        }
    }
}

impl Default for PostProcess {
    fn default() -> Self {
        PostProcess::Plain
    }
}

impl fmt::Display for PostProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PostProcess {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "plain" => Ok(PostProcess::Plain),
            "marker" => Ok(PostProcess::marker()),
            "weighted" | "temporal" => Ok(PostProcess::temporal()),
            other => Err(CameraError::InvalidConfig(format!(
                "Unknown post-processing variant '{}' (expected plain, marker or temporal)",
                other
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARCADOR DE PICO
// ═══════════════════════════════════════════════════════════════════════════════

/// Sobrepõe o marcador do pixel de maior energia.
///
/// A energia é a média truncada dos canais. Empates ficam com o primeiro
/// pixel em ordem de linhas.
pub fn mark_peak(base: &Frame, size: usize, threshold: u8) -> Frame {
    let energy: Vec<u8> = base.pixels.iter().map(Pixel::intensity).collect();

    let mut peak = 0;
    for (i, e) in energy.iter().enumerate() {
        if *e > energy[peak] {
            peak = i;
        }
    }

    let mut out = Frame {
        height: base.height,
        width: base.width,
        pixels: energy
            .iter()
            .map(|&e| Pixel::new(e, 0, if e > threshold { 255 } else { 0 }))
            .collect(),
    };

    if base.width > 0 {
        let (row, col) = (peak / base.width, peak % base.width);
        let rows = row.saturating_sub(size)..(row + size + 1).min(base.height);
        let cols = col.saturating_sub(size)..(col + size + 1).min(base.width);
        for r in rows {
            for c in cols.clone() {
                if let Some(p) = out.get_mut(r, c) {
                    p.g = 255;
                }
            }
        }
    }

    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACUMULADOR TEMPORAL
// ═══════════════════════════════════════════════════════════════════════════════

/// Acumulador H×W×3 em f32, possuído pelo renderizador
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalState {
    height: usize,
    width: usize,
    acc: Vec<f32>,
}

impl TemporalState {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            acc: vec![TEMPORAL_INITIAL; height * width * 3],
        }
    }

    /// Valores intercalados R, G, B em ordem de linhas
    pub fn accumulator(&self) -> &[f32] {
        &self.acc
    }

    /// `acc *= normalizado + weight`, limitado a [30, 255]
    pub fn apply(&mut self, base: &Frame, weight: f32) -> CameraResult<Frame> {
        if base.shape() != (self.height, self.width) {
            return Err(CameraError::FrameShape {
                expected: (self.height, self.width),
                found: base.shape(),
            });
        }

        for c in 0..3 {
            let (min, max) = base
                .pixels
                .iter()
                .map(|p| p.channel(c))
                .fold((u8::MAX, u8::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
            let span = max.saturating_sub(min) as f32;

            for (i, pixel) in base.pixels.iter().enumerate() {
                let normalized = if span > 0.0 {
                    (pixel.channel(c) - min) as f32 / span
                } else {
                    0.5
                };
                let cell = &mut self.acc[i * 3 + c];
                *cell = (*cell * (normalized + weight)).clamp(TEMPORAL_FLOOR, TEMPORAL_CEIL);
            }
        }

        Ok(Frame {
            height: self.height,
            width: self.width,
            pixels: self
                .acc
                .chunks_exact(3)
                .map(|v| Pixel::new(v[0] as u8, v[1] as u8, v[2] as u8))
                .collect(),
        })
    }
}

/// Aplica a variante escolhida e guarda o estado entre quadros
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessor {
    mode: PostProcess,
    temporal: Option<TemporalState>,
}

impl PostProcessor {
    pub fn new(mode: PostProcess, height: usize, width: usize) -> Self {
        let temporal = match mode {
            PostProcess::Temporal { .. } => Some(TemporalState::new(height, width)),
            _ => None,
        };
        Self { mode, temporal }
    }

    pub fn mode(&self) -> PostProcess {
        self.mode
    }

    pub fn temporal_state(&self) -> Option<&TemporalState> {
        self.temporal.as_ref()
    }

    pub fn apply(&mut self, base: Frame) -> CameraResult<Frame> {
        match (self.mode, self.temporal.as_mut()) {
            (PostProcess::Plain, _) => Ok(base),
            (PostProcess::Marker { size, threshold }, _) => Ok(mark_peak(&base, size, threshold)),
            (PostProcess::Temporal { weight }, Some(state)) => state.apply(&base, weight),
            (PostProcess::Temporal { .. }, None) => Err(CameraError::InvalidConfig(
                "Temporal post-processing without accumulator".into(),
            )),
        }
    }
}
