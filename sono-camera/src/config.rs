//! Configuração da câmera sonora (`sonomap.toml`)

use serde::{Deserialize, Serialize};
use sono_acoustic::{ArrayConfig, DoaConfig, RoomConfig, SimulationConfig};
use std::path::Path;

use crate::error::{CameraError, CameraResult};
use crate::post::PostProcess;
use crate::projector::PixelScale;
use crate::recorder::DEFAULT_FOURCC;

/// Número de arranjos da cena (um por canal de cor)
pub const ARRAY_COUNT: usize = 3;

/// Configuração completa da câmera, fixa após a construção
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub height: usize,
    pub width: usize,
    /// Taxa padrão de gravação
    pub fps: u32,
    /// Tamanho da janela da STFT
    pub nfft: usize,
    /// Semente do ruído (ausente = entropia do sistema)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Tag de codec do vídeo
    #[serde(default = "default_fourcc")]
    pub fourcc: String,
    #[serde(default)]
    pub post: PostProcess,
    #[serde(default)]
    pub scale: PixelScale,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub doa: DoaConfig,
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default = "ArrayConfig::default_layout")]
    pub arrays: Vec<ArrayConfig>,
}

fn default_fourcc() -> String {
    String::from_utf8_lossy(&DEFAULT_FOURCC).into_owned()
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            height: 480,
            width: 640,
            fps: 30,
            nfft: 256,
            seed: None,
            fourcc: default_fourcc(),
            post: PostProcess::default(),
            scale: PixelScale::default(),
            simulation: SimulationConfig::default(),
            doa: DoaConfig::default(),
            room: RoomConfig::default(),
            arrays: ArrayConfig::default_layout(),
        }
    }
}

impl CameraConfig {
    /// Configuração padrão com outra variante de pós-processamento
    pub fn with_post(post: PostProcess) -> Self {
        Self {
            post,
            ..Self::default()
        }
    }

    /// Validação estrutural (a geometria é validada ao montar a cena)
    pub fn validate(&self) -> CameraResult<()> {
        if self.height == 0 || self.width == 0 {
            return Err(CameraError::InvalidConfig(
                "Width and height must be > 0".into(),
            ));
        }
        if self.fps == 0 {
            return Err(CameraError::InvalidFrameRate(self.fps));
        }
        if self.arrays.len() != ARRAY_COUNT {
            return Err(CameraError::UnsupportedArrayCount(self.arrays.len()));
        }
        self.fourcc_bytes()?;
        if let PostProcess::Temporal { weight } = self.post {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CameraError::InvalidConfig(format!(
                    "Temporal weight must be >= 0, got {}",
                    weight
                )));
            }
        }
        Ok(())
    }

    /// Tag de codec como 4 bytes ASCII
    pub fn fourcc_bytes(&self) -> CameraResult<[u8; 4]> {
        let bytes = self.fourcc.as_bytes();
        match <[u8; 4]>::try_from(bytes) {
            Ok(tag) if tag.is_ascii() => Ok(tag),
            _ => Err(CameraError::InvalidConfig(format!(
                "FourCC must be 4 ASCII characters, got '{}'",
                self.fourcc
            ))),
        }
    }

    /// Carrega configuração de uma string TOML
    pub fn from_str(content: &str) -> CameraResult<Self> {
        toml::from_str(content)
            .map_err(|e| CameraError::Config(format!("Failed to parse camera config: {}", e)))
    }

    /// Carrega configuração de um arquivo TOML
    pub fn from_file(path: &Path) -> CameraResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CameraError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Serializa para TOML
    pub fn to_string(&self) -> CameraResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CameraError::Config(format!("Failed to serialize camera config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CameraConfig::default();
        assert_eq!((config.height, config.width, config.fps), (480, 640, 30));
        assert_eq!(config.arrays.len(), 3);
        assert_eq!(config.fourcc_bytes().unwrap(), *b"DIB ");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = CameraConfig::from_str(
            r#"
height = 48
width = 64
fps = 10
nfft = 256

[post]
kind = "marker"
size = 3
threshold = 90
"#,
        )
        .unwrap();
        assert_eq!(config.height, 48);
        assert_eq!(config.post, PostProcess::Marker { size: 3, threshold: 90 });
        assert_eq!(config.arrays, ArrayConfig::default_layout());
        assert_eq!(config.room, RoomConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CameraConfig {
            seed: Some(42),
            ..CameraConfig::with_post(PostProcess::temporal())
        };
        let text = config.to_string().unwrap();
        assert_eq!(CameraConfig::from_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs() {
        let config = CameraConfig {
            arrays: vec![ArrayConfig::default()],
            ..CameraConfig::default()
        };
        assert!(matches!(config.validate(), Err(CameraError::UnsupportedArrayCount(1))));

        let config = CameraConfig { fourcc: "MPEG4".into(), ..CameraConfig::default() };
        assert!(config.validate().is_err());

        let config = CameraConfig { fps: 0, ..CameraConfig::default() };
        assert!(config.validate().is_err());

        assert!(CameraConfig::from_str("height = \"tall\"").is_err());
    }
}
