//! # 🔊 sono-core
//!
//! Núcleo do sonomap: traits compartilhados pelos crates de percepção
//! acústica e de renderização da câmera sonora.
//!
//! ## Módulos
//!
//! - [`traits`]: `SonoComponent`, `Sensor`, `SourceTracker`
//! - [`tracker`]: fontes estáticas e compartilhadas
//! - [`prelude`]: re-exportações convenientes
//!
//! ## Quick Start
//!
//! ```
//! use sono_core::prelude::*;
//!
//! let sources = StaticSources::default();
//! assert_eq!(sources.positions().len(), 2);
//! ```

pub mod traits;
pub mod tracker;
pub mod prelude;

/// Posição 3D em metros, no referencial da cena
pub type Position = nalgebra::Vector3<f64>;

// Re-exportações de nível superior
pub use traits::{SonoComponent, Sensor, SensorError, SourceTracker};
pub use tracker::{SharedSources, StaticSources, DEFAULT_SOURCE_POSITIONS};
