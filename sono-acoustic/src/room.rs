//! Modelo de sala: polígono convexo extrudado, paredes refletoras e
//! conjunto de fontes-imagem até uma ordem máxima.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sono_core::Position;

use crate::error::{AcousticError, AcousticResult};

/// Frequências centrais das bandas de absorção do ar (Hz)
pub const AIR_ABSORPTION_BANDS_HZ: [f64; 7] = [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0];

/// Coeficientes de absorção do ar por banda (1/m), 20 °C e ~40 % de umidade
pub const AIR_ABSORPTION_COEFFS: [f64; 7] = [0.1e-3, 0.2e-3, 0.5e-3, 1.1e-3, 2.7e-3, 9.4e-3, 29.0e-3];

/// Tolerância para considerar duas fontes-imagem coincidentes (m)
const IMAGE_MERGE_TOLERANCE: f64 = 1e-9;

/// Configuração da sala
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Cantos do polígono no plano xy (fechamento implícito)
    pub corners: Vec<[f64; 2]>,
    /// Altura da extrusão em metros
    pub height: f64,
    /// Absorção de energia das paredes [0, 1); 0 = totalmente refletora
    #[serde(default)]
    pub wall_absorption: f64,
    /// Aplica absorção do ar dependente da frequência
    #[serde(default = "default_air_absorption")]
    pub air_absorption: bool,
}

fn default_air_absorption() -> bool {
    true
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            corners: vec![[-0.5, 1.0], [1.5, 1.0], [1.5, -1.0], [-0.5, -1.0]],
            height: 3.0,
            wall_absorption: 0.0,
            air_absorption: true,
        }
    }
}

/// Plano de parede com normal apontando para fora da sala
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Wall {
    /// Distância com sinal: negativa dentro da sala
    pub fn signed_distance(&self, p: &Position) -> f64 {
        self.normal.dot(p) - self.offset
    }

    /// Reflexo especular de `p` através do plano
    pub fn mirror(&self, p: &Position) -> Position {
        p - self.normal * (2.0 * self.signed_distance(p))
    }
}

/// Fonte virtual produzida por reflexões nas paredes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSource {
    pub position: Position,
    /// Número de reflexões (0 = caminho direto)
    pub order: u32,
    /// Ganho acumulado de reflexão (sem espalhamento esférico)
    pub gain: f64,
    /// Parede da última reflexão
    pub wall: Option<usize>,
}

/// Sala imutável
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    config: RoomConfig,
    walls: Vec<Wall>,
}

impl Room {
    /// Cria sala validando a geometria
    pub fn new(config: RoomConfig) -> AcousticResult<Self> {
        if config.corners.len() < 3 {
            return Err(AcousticError::InvalidGeometry(format!(
                "Room polygon needs at least 3 corners, got {}",
                config.corners.len()
            )));
        }
        if !(config.height.is_finite() && config.height > 0.0) {
            return Err(AcousticError::InvalidGeometry(format!(
                "Room height must be positive, got {}",
                config.height
            )));
        }
        if !(0.0..1.0).contains(&config.wall_absorption) {
            return Err(AcousticError::InvalidConfig(format!(
                "Wall absorption must be in [0, 1), got {}",
                config.wall_absorption
            )));
        }

        let area = signed_area(&config.corners);
        if area.abs() < 1e-12 || !area.is_finite() {
            return Err(AcousticError::InvalidGeometry("Room polygon is degenerate".into()));
        }
        if !is_convex(&config.corners, area) {
            return Err(AcousticError::InvalidGeometry(
                "Room polygon must be convex".into(),
            ));
        }

        let orientation = area.signum();
        let n = config.corners.len();
        let mut walls = Vec::with_capacity(n + 2);
        for i in 0..n {
            let a = config.corners[i];
            let b = config.corners[(i + 1) % n];
            let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
            let len = (dx * dx + dy * dy).sqrt();
            if len < 1e-12 {
                return Err(AcousticError::InvalidGeometry(format!(
                    "Corners {} and {} coincide",
                    i,
                    (i + 1) % n
                )));
            }
            // CCW: normal externa = (dy, -dx)
            let normal = Vector3::new(orientation * dy / len, -orientation * dx / len, 0.0);
            walls.push(Wall {
                normal,
                offset: normal.x * a[0] + normal.y * a[1],
            });
        }
        // Piso e teto
        walls.push(Wall {
            normal: Vector3::new(0.0, 0.0, -1.0),
            offset: 0.0,
        });
        walls.push(Wall {
            normal: Vector3::new(0.0, 0.0, 1.0),
            offset: config.height,
        });

        Ok(Self { config, walls })
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Ponto dentro da sala (bordas incluídas)
    pub fn contains(&self, p: &Position) -> bool {
        p.iter().all(|c| c.is_finite()) && self.walls.iter().all(|w| w.signed_distance(p) <= 0.0)
    }

    /// Ganho de amplitude por reflexão
    pub fn reflection_gain(&self) -> f64 {
        (1.0 - self.config.wall_absorption).sqrt()
    }

    pub fn air_absorption(&self) -> bool {
        self.config.air_absorption
    }

    /// Fontes-imagem de `source` até `max_order` reflexões, sem duplicatas.
    ///
    /// O índice 0 é sempre a fonte direta.
    pub fn image_sources(&self, source: &Position, max_order: u32) -> Vec<ImageSource> {
        let reflection = self.reflection_gain();
        let mut images = vec![ImageSource {
            position: *source,
            order: 0,
            gain: 1.0,
            wall: None,
        }];
        let mut frontier = vec![0usize];

        for order in 1..=max_order {
            let mut next = Vec::new();
            for &parent_idx in &frontier {
                let parent = images[parent_idx];
                for (wall_idx, wall) in self.walls.iter().enumerate() {
                    if parent.wall == Some(wall_idx) || wall.signed_distance(&parent.position) > 0.0 {
                        continue;
                    }
                    let position = wall.mirror(&parent.position);
                    let duplicate = images
                        .iter()
                        .any(|img| (img.position - position).norm() < IMAGE_MERGE_TOLERANCE);
                    if duplicate {
                        continue;
                    }
                    images.push(ImageSource {
                        position,
                        order,
                        gain: parent.gain * reflection,
                        wall: Some(wall_idx),
                    });
                    next.push(images.len() - 1);
                }
            }
            frontier = next;
        }

        images
    }
}

/// Coeficiente de absorção do ar (1/m) interpolado linearmente entre bandas
pub fn air_absorption_coefficient(freq_hz: f64) -> f64 {
    let bands = &AIR_ABSORPTION_BANDS_HZ;
    let coeffs = &AIR_ABSORPTION_COEFFS;
    if freq_hz <= bands[0] {
        return coeffs[0];
    }
    for i in 1..bands.len() {
        if freq_hz <= bands[i] {
            let t = (freq_hz - bands[i - 1]) / (bands[i] - bands[i - 1]);
            return coeffs[i - 1] + t * (coeffs[i] - coeffs[i - 1]);
        }
    }
    coeffs[coeffs.len() - 1]
}

fn signed_area(corners: &[[f64; 2]]) -> f64 {
    let n = corners.len();
    (0..n)
        .map(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % n];
            a[0] * b[1] - b[0] * a[1]
        })
        .sum::<f64>()
        / 2.0
}

fn is_convex(corners: &[[f64; 2]], area: f64) -> bool {
    let n = corners.len();
    (0..n).all(|i| {
        let a = corners[i];
        let b = corners[(i + 1) % n];
        let c = corners[(i + 2) % n];
        let cross = (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]);
        cross * area.signum() >= -1e-12
    })
}
