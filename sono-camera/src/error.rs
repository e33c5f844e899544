//! Erros específicos da câmera sonora

use sono_acoustic::AcousticError;
use sono_core::traits::SensorError;
use thiserror::Error;

pub type CameraResult<T> = Result<T, CameraError>;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error(transparent)]
    Acoustic(#[from] AcousticError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Expected exactly 3 microphone arrays, got {0}")]
    UnsupportedArrayCount(usize),

    #[error("Frame shape mismatch: expected {expected:?}, got {found:?}")]
    FrameShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(u32),

    #[error("Malformed video container: {0}")]
    Container(String),

    #[error("Configuration file error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Conversão para SensorError do core
impl From<CameraError> for SensorError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::Acoustic(inner) => inner.into(),
            CameraError::InvalidConfig(msg) | CameraError::Config(msg) => {
                SensorError::InvalidConfig(msg)
            }
            CameraError::UnsupportedArrayCount(_) | CameraError::InvalidFrameRate(_) => {
                SensorError::InvalidConfig(err.to_string())
            }
            CameraError::Io(e) => SensorError::Io(e.to_string()),
            other => SensorError::ReadFailed(other.to_string()),
        }
    }
}
