//! # 🎤 sono-acoustic — Cadeia acústica do sonomap
//!
//! Simula a propagação de fontes sonoras numa sala poligonal extrudada
//! (método das fontes-imagem), decompõe o sinal multicanal com uma STFT e
//! estima a verossimilhança de direção de chegada com MUSIC.
//!
//! ## Pipeline por arranjo
//!
//! - [`RoomSimulator::simulate`]: fontes → sinal nas cápsulas
//! - [`SpectralTransform::analyze`]: sinal → espectrograma `[frame, bin, canal]`
//! - [`MusicDoa::locate`]: espectrograma → [`SpatialGrid`] de 360 graus
//!
//! ## Exemplo
//!
//! ```ignore
//! use sono_acoustic::*;
//!
//! let room = Room::new(RoomConfig::default())?;
//! let simulator = RoomSimulator::new(room, SimulationConfig::default())?;
//! let array = MicrophoneArray::new(ArrayConfig::default())?;
//! let mut noise = GaussianNoise::seeded(0);
//!
//! let signal = simulator.simulate(&array, &[Position::new(0.5, 0.3, 0.1)], &mut noise)?;
//! let spectrogram = SpectralTransform::new(256)?.analyze(&signal)?;
//! let grid = MusicDoa::new(&array.offsets(), 16_000, 256)?.locate(&spectrogram)?;
//! println!("pico em {}°", grid.peak_degree());
//! ```

pub mod array;
pub mod doa;
pub mod error;
pub mod noise;
pub mod room;
pub mod simulator;
pub mod stft;
pub mod types;

pub use array::{ArrayConfig, MicrophoneArray};
pub use doa::{DoaConfig, MusicDoa};
pub use error::{AcousticError, AcousticResult};
pub use noise::{GaussianNoise, NoiseSource, Silence};
pub use room::{ImageSource, Room, RoomConfig, Wall};
pub use simulator::{RoomSimulator, SimulationConfig};
pub use stft::{SpectralTransform, Spectrogram};
pub use types::{BEARING_GRID_LEN, FrequencyBand, MultichannelSignal, SpatialGrid};

// Re-export core types
pub use sono_core::prelude::*;

#[cfg(test)]
mod tests;
