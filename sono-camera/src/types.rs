//! Tipos de imagem da câmera sonora

use serde::{Deserialize, Serialize};

/// Pixel RGB de 8 bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Média dos três canais, truncada
    pub fn intensity(&self) -> u8 {
        ((self.r as u32 + self.g as u32 + self.b as u32) / 3) as u8
    }

    /// Canal por índice (0 = R, 1 = G, 2 = B)
    pub fn channel(&self, c: usize) -> u8 {
        match c {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }

    pub fn set_channel(&mut self, c: usize, value: u8) {
        match c {
            0 => self.r = value,
            1 => self.g = value,
            _ => self.b = value,
        }
    }
}

/// Imagem H×W×3 em ordem de linhas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub height: usize,
    pub width: usize,
    pub pixels: Vec<Pixel>,
}

impl Frame {
    /// Imagem preta
    pub fn black(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            pixels: vec![Pixel::default(); height * width],
        }
    }

    /// (altura, largura)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Pixel> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.pixels.get(row * self.width + col)
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Pixel> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.pixels.get_mut(row * self.width + col)
    }

    /// Bytes intercalados R, G, B em ordem de linhas
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }

    /// Média do canal `c`
    pub fn channel_mean(&self, c: usize) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.pixels.iter().map(|p| p.channel(c) as u64).sum();
        sum as f64 / self.pixels.len() as f64
    }

    /// Maior valor do canal
    pub fn channel_max(&self, c: usize) -> u8 {
        self.pixels.iter().map(|p| p.channel(c)).max().unwrap_or(0)
    }
}

/// Mapa escalar H×W produzido pela projeção de um arranjo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityMap {
    pub height: usize,
    pub width: usize,
    pub values: Vec<f64>,
}

impl IntensityMap {
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            values: vec![0.0; height * width],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.width + col]
    }
}
