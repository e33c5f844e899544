//! # 📷 sono-camera — Câmera Sonora
//!
//! Converte a verossimilhança de direção de chegada de três arranjos de
//! microfones em imagens RGB (um arranjo por canal) e grava a sequência de
//! quadros em vídeo.
//!
//! ## Variantes
//!
//! - **plain**: quadro montado, sem alteração
//! - **marker**: marcador verde no pico de energia, azul acima do limiar
//! - **temporal**: mistura exponencial persistente entre quadros
//!
//! ## Exemplo
//!
//! ```ignore
//! use sono_camera::{CameraConfig, PostProcess, SoundCamera};
//!
//! let mut camera = SoundCamera::with_config(CameraConfig::with_post(PostProcess::marker()))?;
//! camera.start_recording();
//! for _ in 0..30 {
//!     let frame = camera.render()?;
//! }
//! camera.stop_recording(Path::new("sound.avi"), 30)?;
//! ```

pub mod camera;
pub mod config;
pub mod error;
pub mod post;
pub mod projector;
pub mod recorder;
pub mod types;

pub use camera::{SoundCamera, assemble};
pub use config::{ARRAY_COUNT, CameraConfig};
pub use error::{CameraError, CameraResult};
pub use post::{PostProcess, PostProcessor, TemporalState, mark_peak};
pub use projector::{AngularProjector, PixelScale, bearing_degree};
pub use recorder::{AviInfo, AviWriter, DEFAULT_FOURCC, FrameRecorder, RecordingSummary};
pub use types::{Frame, IntensityMap, Pixel};

// Re-export core types
pub use sono_core::prelude::*;
