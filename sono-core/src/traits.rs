//! # 🎯 Traits — Abstrações Fundamentais do sonomap
//!
//! Este módulo define os traits base que os componentes do renderizador
//! acústico implementam:
//!
//! | Trait | Papel |
//! |:------|:------|
//! | [`SonoComponent`] | Identidade e prontidão de qualquer componente |
//! | [`Sensor`] | Componentes que produzem uma observação por passo |
//! | [`SourceTracker`] | Colaborador externo (física) que informa as fontes |
//!
//! > *"Trait no core, implementação no módulo."*

use crate::Position;
use std::fmt::Debug;

// ═══════════════════════════════════════════════════════════════════════════════
// TRAIT BASE — Todo componente sonomap
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait base para qualquer componente do sonomap.
///
/// # Exemplo
///
/// ```
/// use sono_core::traits::SonoComponent;
///
/// #[derive(Debug)]
/// struct MyArray;
///
/// impl SonoComponent for MyArray {
///     fn name(&self) -> &str { "my-array" }
/// }
///
/// assert!(MyArray.is_ready());
/// ```
pub trait SonoComponent: Send + Sync + Debug {
    /// Nome único do componente (para logs e debug)
    fn name(&self) -> &str;

    /// Versão do componente (para compatibilidade)
    fn version(&self) -> &str {
        "2026.1.16"
    }

    /// Componente está pronto para uso?
    fn is_ready(&self) -> bool {
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PERCEPÇÃO — Sensores
// ═══════════════════════════════════════════════════════════════════════════════

/// Erro de sensor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("Sensor read failed: {0}")]
    ReadFailed(String),
    #[error("Configuration invalid: {0}")]
    InvalidConfig(String),
    #[error("Numerical failure: {0}")]
    Numerical(String),
    #[error("I/O failure: {0}")]
    Io(String),
}

/// Trait para sensores que produzem uma observação por passo de simulação.
///
/// A câmera sonora implementa este trait com `RawData = Frame`.
pub trait Sensor: SonoComponent {
    /// Tipo dos dados brutos lidos do sensor
    type RawData;

    /// Tipo de configuração do sensor
    type Config;

    /// Configura o sensor
    fn configure(&mut self, _config: Self::Config) -> Result<(), SensorError> {
        Ok(())
    }

    /// Lê uma observação
    fn read(&mut self) -> Result<Self::RawData, SensorError>;

    /// Taxa de amostragem em Hz (0 = sob demanda)
    fn sample_rate(&self) -> f32 {
        0.0
    }

    /// Calibra o sensor
    fn calibrate(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLABORADOR EXTERNO — Motor de física
// ═══════════════════════════════════════════════════════════════════════════════

/// Consulta somente-leitura às posições das fontes sonoras.
///
/// O motor de física é dono das posições; o renderizador apenas as amostra
/// uma vez por chamada de `render`.
pub trait SourceTracker: Send + Sync + Debug {
    /// Número de fontes rastreadas
    fn source_count(&self) -> usize;

    /// Posição atual da fonte `index`, se existir
    fn position(&self, index: usize) -> Option<Position>;

    /// Posições de todas as fontes, na ordem dos índices
    fn positions(&self) -> Vec<Position> {
        (0..self.source_count())
            .filter_map(|i| self.position(i))
            .collect()
    }
}
