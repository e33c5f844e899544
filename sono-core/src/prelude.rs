//! # Prelude — Re-exportações Convenientes
//!
//! ```
//! use sono_core::prelude::*;
//! ```

pub use crate::Position;

// Traits fundamentais
pub use crate::traits::{
    SonoComponent,
    Sensor,
    SensorError,
    SourceTracker,
};

// Colaboradores
pub use crate::tracker::{
    SharedSources,
    StaticSources,
    DEFAULT_SOURCE_POSITIONS,
};
