//! Projeção de azimute para pixels
//!
//! Cada pixel recebe o grau inteiro de azimute visto a partir do pixel de
//! referência do arranjo. O mapa de azimutes depende só da geometria e é
//! calculado uma vez na construção.

use serde::{Deserialize, Serialize};
use sono_acoustic::{BEARING_GRID_LEN, SpatialGrid};

use crate::types::IntensityMap;

/// Escala métrica → pixel da cena.
///
/// `row = trunc((x_origin − x)·H / x_extent)`,
/// `col = trunc((y − y_origin)·W / y_extent)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelScale {
    pub x_origin: f64,
    pub x_extent: f64,
    pub y_origin: f64,
    pub y_extent: f64,
}

impl Default for PixelScale {
    fn default() -> Self {
        Self {
            x_origin: 0.8,
            x_extent: 0.6,
            y_origin: -0.4,
            y_extent: 0.8,
        }
    }
}

impl PixelScale {
    /// Pixel de referência de um ponto do plano (pode cair fora da imagem)
    pub fn reference_pixel(&self, x: f64, y: f64, height: usize, width: usize) -> (i64, i64) {
        let row = (self.x_origin - x) * height as f64 / self.x_extent;
        let col = (y - self.y_origin) * width as f64 / self.y_extent;
        (row as i64, col as i64)
    }
}

/// Grau inteiro de azimute do pixel `(row, col)` visto de `reference`
pub fn bearing_degree(row: i64, col: i64, reference: (i64, i64)) -> usize {
    let dr = (row - reference.0) as f64;
    let dc = (col - reference.1) as f64;
    let angle = (dr.atan2(dc).to_degrees() + 90.0).rem_euclid(360.0);
    (angle as usize).min(BEARING_GRID_LEN - 1)
}

/// Tabela pixel → grau para uma imagem H×W
#[derive(Debug, Clone, PartialEq)]
pub struct AngularProjector {
    height: usize,
    width: usize,
    reference: (i64, i64),
    bearings: Vec<u16>,
}

impl AngularProjector {
    pub fn new(height: usize, width: usize, reference: (i64, i64)) -> Self {
        let mut bearings = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                bearings.push(bearing_degree(row as i64, col as i64, reference) as u16);
            }
        }
        Self {
            height,
            width,
            reference,
            bearings,
        }
    }

    /// Projetor para o arranjo centrado em `center`
    pub fn for_center(center: [f64; 3], height: usize, width: usize, scale: &PixelScale) -> Self {
        Self::new(height, width, scale.reference_pixel(center[0], center[1], height, width))
    }

    pub fn reference(&self) -> (i64, i64) {
        self.reference
    }

    pub fn bearing_at(&self, row: usize, col: usize) -> usize {
        self.bearings[row * self.width + col] as usize
    }

    /// Azimutes em ordem de linhas
    pub fn bearings(&self) -> &[u16] {
        &self.bearings
    }

    /// Atribui a cada pixel a verossimilhança do seu grau
    pub fn project(&self, grid: &SpatialGrid) -> IntensityMap {
        IntensityMap {
            height: self.height,
            width: self.width,
            values: self
                .bearings
                .iter()
                .map(|b| grid.at_degree(*b as usize))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pixels_of_default_layout() {
        let scale = PixelScale::default();
        assert_eq!(scale.reference_pixel(0.8, 0.0, 480, 640), (0, 320));
        assert_eq!(scale.reference_pixel(0.2, -0.3, 480, 640), (480, 80));
        // Pontos fora da cena caem fora da imagem
        assert!(scale.reference_pixel(1.4, 0.0, 480, 640).0 < 0);
    }

    #[test]
    fn test_bearing_follows_world_azimuth() {
        let reference = (100, 100);
        // Linha cresce quando x diminui; coluna cresce com y
        assert_eq!(bearing_degree(0, 100, reference), 0);
        assert_eq!(bearing_degree(100, 200, reference), 90);
        assert_eq!(bearing_degree(200, 100, reference), 180);
        assert_eq!(bearing_degree(100, 0, reference), 270);
        assert_eq!(bearing_degree(0, 200, reference), 45);
        // Pixel de referência: atan2(0, 0) = 0 → 90°
        assert_eq!(bearing_degree(100, 100, reference), 90);
    }

    #[test]
    fn test_bearing_truncates() {
        // atan2(-1, 1000) ≈ −0.057° → 89.94° → 89
        assert_eq!(bearing_degree(99, 1100, (100, 100)), 89);
        // Logo abaixo de 360 trunca para 359
        assert_eq!(bearing_degree(0, 99, (1000, 100)), 359);
    }

    #[test]
    fn test_projection_is_lookup() {
        let projector = AngularProjector::new(4, 6, (2, 3));
        let grid = SpatialGrid::from_values((0..360).map(|d| d as f64).collect()).unwrap();
        let map = projector.project(&grid);
        assert_eq!(map.values.len(), 24);
        for row in 0..4 {
            for col in 0..6 {
                assert_eq!(map.get(row, col), projector.bearing_at(row, col) as f64);
            }
        }
    }

    #[test]
    fn test_bearing_map_is_deterministic() {
        let a = AngularProjector::for_center([0.2, 0.3, 0.1], 48, 64, &PixelScale::default());
        let b = AngularProjector::for_center([0.2, 0.3, 0.1], 48, 64, &PixelScale::default());
        assert_eq!(a.bearings(), b.bearings());
        assert!(a.bearings().iter().all(|d| *d < 360));
    }
}
