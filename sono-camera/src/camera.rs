//! Renderizador da câmera sonora
//!
//! Cada chamada de [`SoundCamera::render`] amostra as fontes, simula a sala
//! para os três arranjos (R, G, B, nessa ordem), estima a verossimilhança de
//! azimute, projeta na imagem, espelha as colunas e aplica a variante de
//! pós-processamento.

use sono_acoustic::{
    GaussianNoise, MicrophoneArray, MusicDoa, NoiseSource, Room, RoomSimulator, SpectralTransform,
};
use sono_core::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ARRAY_COUNT, CameraConfig};
use crate::error::{CameraError, CameraResult};
use crate::post::{PostProcessor, TemporalState};
use crate::projector::AngularProjector;
use crate::recorder::{AviWriter, FrameRecorder, RecordingSummary};
use crate::types::{Frame, IntensityMap, Pixel};

/// Cadeia fixa de um arranjo: geometria, estimador e tabela de pixels
#[derive(Debug, Clone)]
struct ArrayPipeline {
    array: MicrophoneArray,
    doa: MusicDoa,
    projector: AngularProjector,
}

/// Partes da câmera que dependem só da configuração
struct Scene {
    simulator: RoomSimulator,
    stft: SpectralTransform,
    pipelines: Vec<ArrayPipeline>,
}

impl Scene {
    fn build(config: &CameraConfig) -> CameraResult<Self> {
        config.validate()?;

        let room = Room::new(config.room.clone())?;
        let simulator = RoomSimulator::new(room, config.simulation.clone())?;
        let stft = SpectralTransform::new(config.nfft)?;
        let sample_rate = config.simulation.sample_rate;

        let mut pipelines = Vec::with_capacity(ARRAY_COUNT);
        for (index, array_config) in config.arrays.iter().enumerate() {
            let array = MicrophoneArray::new(array_config.clone())?;
            simulator.check_array(&array).map_err(|e| {
                CameraError::InvalidConfig(format!("Microphone array {}: {}", index, e))
            })?;
            let doa = MusicDoa::with_config(
                &array.offsets(),
                sample_rate,
                config.nfft,
                config.doa.clone(),
            )?;
            let projector = AngularProjector::for_center(
                array_config.center,
                config.height,
                config.width,
                &config.scale,
            );
            pipelines.push(ArrayPipeline {
                array,
                doa,
                projector,
            });
        }

        Ok(Self {
            simulator,
            stft,
            pipelines,
        })
    }
}

/// Câmera sonora com três arranjos e buffer de gravação
#[derive(Debug)]
pub struct SoundCamera {
    config: CameraConfig,
    simulator: RoomSimulator,
    stft: SpectralTransform,
    pipelines: Vec<ArrayPipeline>,
    tracker: Box<dyn SourceTracker>,
    noise: Box<dyn NoiseSource>,
    post: PostProcessor,
    recorder: FrameRecorder,
}

impl SoundCamera {
    /// Câmera padrão com as fontes estáticas
    pub fn new() -> CameraResult<Self> {
        Self::with_config(CameraConfig::default())
    }

    /// Câmera com configuração específica e fontes estáticas
    pub fn with_config(config: CameraConfig) -> CameraResult<Self> {
        Self::with_tracker(config, StaticSources::default())
    }

    /// Câmera que lê as fontes de `tracker` a cada quadro
    pub fn with_tracker(
        config: CameraConfig,
        tracker: impl SourceTracker + 'static,
    ) -> CameraResult<Self> {
        let noise: Box<dyn NoiseSource> = match config.seed {
            Some(seed) => Box::new(GaussianNoise::seeded(seed)),
            None => Box::new(GaussianNoise::from_entropy()),
        };
        Self::build(config, Box::new(tracker), noise)
    }

    /// Substitui a fonte de ruído (ex.: [`sono_acoustic::Silence`] em testes)
    pub fn with_noise(mut self, noise: impl NoiseSource + 'static) -> Self {
        self.noise = Box::new(noise);
        self
    }

    fn build(
        config: CameraConfig,
        tracker: Box<dyn SourceTracker>,
        noise: Box<dyn NoiseSource>,
    ) -> CameraResult<Self> {
        let scene = Scene::build(&config)?;
        let post = PostProcessor::new(config.post, config.height, config.width);

        Ok(Self {
            config,
            simulator: scene.simulator,
            stft: scene.stft,
            pipelines: scene.pipelines,
            tracker,
            noise,
            post,
            recorder: FrameRecorder::new(),
        })
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// (altura, largura) da imagem
    pub fn resolution(&self) -> (usize, usize) {
        (self.config.height, self.config.width)
    }

    /// Pixels de referência dos arranjos, na ordem dos canais
    pub fn reference_pixels(&self) -> Vec<(i64, i64)> {
        self.pipelines.iter().map(|p| p.projector.reference()).collect()
    }

    /// Bins de FFT analisados por arranjo
    pub fn analysis_bins(&self) -> std::ops::Range<usize> {
        self.pipelines
            .first()
            .map(|p| p.doa.bins())
            .unwrap_or(0..0)
    }

    /// Ressemeia o ruído de fontes e sensores
    pub fn seed(&mut self, seed: u64) {
        self.noise.reseed(seed);
    }

    /// Quadros gravados desde o último `start_recording`
    pub fn frames(&self) -> &[Frame] {
        self.recorder.frames()
    }

    pub fn temporal_state(&self) -> Option<&TemporalState> {
        self.post.temporal_state()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RENDERIZAÇÃO
    // ═══════════════════════════════════════════════════════════════════════════

    /// Produz um quadro H×W×3.
    ///
    /// Fonte fora da sala zera o canal do arranjo e segue; qualquer outro erro
    /// é fatal e deixa buffer e acumulador intactos.
    pub fn render(&mut self) -> CameraResult<Frame> {
        let started = Instant::now();
        let sources = self.tracker.positions();
        let (height, width) = self.resolution();

        let mut maps = Vec::with_capacity(self.pipelines.len());
        for (index, pipeline) in self.pipelines.iter().enumerate() {
            let map = match self
                .simulator
                .simulate(&pipeline.array, &sources, self.noise.as_mut())
            {
                Ok(signal) => {
                    let spectrogram = self.stft.analyze(&signal)?;
                    let grid = pipeline.doa.locate(&spectrogram)?;
                    debug!(
                        array = index,
                        peak_degree = grid.peak_degree(),
                        "Bearing likelihood estimated"
                    );
                    pipeline.projector.project(&grid)
                }
                Err(e) if e.is_recoverable() => {
                    warn!(array = index, error = %e, "Skipping sound simulation for array");
                    IntensityMap::zeros(height, width)
                }
                Err(e) => return Err(e.into()),
            };
            maps.push(map);
        }

        let base = assemble(&maps, height, width);
        let frame = self.post.apply(base)?;
        self.recorder.push(frame.clone());

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            variant = %self.post.mode(),
            "Frame rendered"
        );
        Ok(frame)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // GRAVAÇÃO
    // ═══════════════════════════════════════════════════════════════════════════

    /// Limpa o buffer de quadros
    pub fn start_recording(&mut self) {
        self.recorder.start();
        info!("Recording started");
    }

    /// Grava os quadros do buffer em `path` e esvazia o buffer
    pub fn stop_recording(&mut self, path: &Path, fps: u32) -> CameraResult<RecordingSummary> {
        let (height, width) = self.resolution();
        let writer = AviWriter::new(height, width, fps)?.with_fourcc(self.config.fourcc_bytes()?);
        let summary = writer.write_file(path, self.recorder.frames())?;
        self.recorder.drain();
        info!(
            path = %summary.path.display(),
            frames = summary.frames,
            fps,
            "Recording saved"
        );
        Ok(summary)
    }
}

/// Empilha os mapas em R, G, B, espelha as colunas e satura em 8 bits
pub fn assemble(maps: &[IntensityMap], height: usize, width: usize) -> Frame {
    let to_u8 = |v: f64| v.clamp(0.0, 255.0) as u8;
    let channel = |c: usize, row: usize, col: usize| {
        maps.get(c)
            .filter(|m| m.height == height && m.width == width)
            .map(|m| to_u8(m.get(row, width - 1 - col)))
            .unwrap_or(0)
    };

    let mut pixels = Vec::with_capacity(height * width);
    for row in 0..height {
        for col in 0..width {
            pixels.push(Pixel::new(
                channel(0, row, col),
                channel(1, row, col),
                channel(2, row, col),
            ));
        }
    }
    Frame {
        height,
        width,
        pixels,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPLEMENTAÇÃO DOS TRAITS DO CORE
// ═══════════════════════════════════════════════════════════════════════════════

impl SonoComponent for SoundCamera {
    fn name(&self) -> &str {
        "SoundCamera"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }
}

impl Sensor for SoundCamera {
    type RawData = Frame;
    type Config = CameraConfig;

    /// Reconstrói a cena mantendo fontes e ruído; limpa buffer e acumulador
    fn configure(&mut self, config: Self::Config) -> Result<(), SensorError> {
        let scene = Scene::build(&config)?;
        self.post = PostProcessor::new(config.post, config.height, config.width);
        self.simulator = scene.simulator;
        self.stft = scene.stft;
        self.pipelines = scene.pipelines;
        self.recorder.start();
        self.config = config;
        Ok(())
    }

    fn read(&mut self) -> Result<Self::RawData, SensorError> {
        self.render().map_err(SensorError::from)
    }

    fn sample_rate(&self) -> f32 {
        self.config.fps as f32
    }
}
