//! Implementações de [`SourceTracker`]
//!
//! - [`StaticSources`]: posições fixas (fallback quando não há motor de física)
//! - [`SharedSources`]: posições compartilhadas, atualizadas pelo dono da cena

use crate::Position;
use crate::traits::SourceTracker;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Posições padrão das duas fontes quando nenhum colaborador é acoplado
pub const DEFAULT_SOURCE_POSITIONS: [[f64; 3]; 2] = [[0.5, 0.3, 0.1], [0.5, -0.3, 0.1]];

/// Fontes em posições fixas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSources {
    positions: Vec<Position>,
}

impl StaticSources {
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }
}

impl Default for StaticSources {
    fn default() -> Self {
        Self::new(
            DEFAULT_SOURCE_POSITIONS
                .iter()
                .map(|p| Position::new(p[0], p[1], p[2]))
                .collect(),
        )
    }
}

impl SourceTracker for StaticSources {
    fn source_count(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied()
    }
}

/// Fontes cujas posições são escritas por outro dono (ex.: motor de física).
///
/// Clones compartilham o mesmo estado: o renderizador lê, a cena escreve.
#[derive(Debug, Clone, Default)]
pub struct SharedSources {
    positions: Arc<RwLock<Vec<Position>>>,
}

impl SharedSources {
    pub fn new(positions: Vec<Position>) -> Self {
        Self {
            positions: Arc::new(RwLock::new(positions)),
        }
    }

    /// Move a fonte `index`; retorna `false` se o índice não existe
    pub fn set_position(&self, index: usize, position: Position) -> bool {
        let mut guard = match self.positions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.get_mut(index) {
            Some(slot) => {
                *slot = position;
                true
            }
            None => false,
        }
    }
}

impl SourceTracker for SharedSources {
    fn source_count(&self) -> usize {
        self.positions.read().map(|p| p.len()).unwrap_or(0)
    }

    fn position(&self, index: usize) -> Option<Position> {
        self.positions.read().ok()?.get(index).copied()
    }
}
