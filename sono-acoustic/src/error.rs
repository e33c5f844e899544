//! Erros específicos do módulo acústico

use thiserror::Error;
use sono_core::traits::SensorError;

pub type AcousticResult<T> = Result<T, AcousticError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcousticError {
    /// Fonte fora do polígono da sala: recuperável pelo chamador
    #[error("Sound source {index} at ({x:.3}, {y:.3}, {z:.3}) is outside the room")]
    SourceOutsideRoom { index: usize, x: f64, y: f64, z: f64 },

    #[error("Microphone capsule {capsule} is outside the room")]
    MicrophoneOutsideRoom { capsule: usize },

    #[error("Invalid room geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Signal too short: {samples} samples for a {nfft}-point window")]
    SignalTooShort { samples: usize, nfft: usize },

    #[error("Channel count mismatch: expected {expected}, got {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Numerical failure: {0}")]
    Numerical(String),
}

impl AcousticError {
    /// Condições geométricas que o renderizador absorve zerando o canal
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AcousticError::SourceOutsideRoom { .. })
    }
}

// Conversão para SensorError do core
impl From<AcousticError> for SensorError {
    fn from(err: AcousticError) -> Self {
        match err {
            AcousticError::InvalidConfig(msg) | AcousticError::InvalidGeometry(msg) => {
                SensorError::InvalidConfig(msg)
            }
            AcousticError::InvalidSampleRate(rate) => {
                SensorError::InvalidConfig(format!("Invalid sample rate: {}", rate))
            }
            AcousticError::Numerical(msg) => SensorError::Numerical(msg),
            other => SensorError::ReadFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_outside_room_is_recoverable() {
        let outside = AcousticError::SourceOutsideRoom { index: 1, x: 3.0, y: 0.0, z: 0.1 };
        assert!(outside.is_recoverable());
        assert!(!AcousticError::Numerical("eig".into()).is_recoverable());
        assert!(!AcousticError::MicrophoneOutsideRoom { capsule: 0 }.is_recoverable());
    }

    #[test]
    fn test_sensor_error_conversion() {
        let err: SensorError = AcousticError::InvalidSampleRate(10).into();
        assert_eq!(err, SensorError::InvalidConfig("Invalid sample rate: 10".into()));

        let err: SensorError = AcousticError::Numerical("no convergence".into()).into();
        assert!(matches!(err, SensorError::Numerical(_)));
    }
}
