//! sonomap - sound camera renderer
//! Command-line interface for rendering acoustic localization maps to video

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use sono_camera::{CameraConfig, Frame, PostProcess, SoundCamera};
use sono_core::{Position, SharedSources, SourceTracker, DEFAULT_SOURCE_POSITIONS};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sonomap")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version = "2026.1.16")]
#[command(about = "sonomap - render simulated sound-source maps as RGB video", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render frames and save them as an AVI video
    Render {
        /// Camera configuration (TOML)
        #[arg(short, long, value_name = "FILE", env = "SONOMAP_CONFIG")]
        config: Option<PathBuf>,

        /// Post-processing variant: plain, marker or temporal
        #[arg(short, long, value_name = "VARIANT")]
        variant: Option<String>,

        /// Number of frames to render
        #[arg(short = 'n', long, default_value_t = 30)]
        frames: usize,

        /// Output video file
        #[arg(short, long, value_name = "OUTPUT", default_value = "sonomap.avi")]
        output: PathBuf,

        /// Video frame rate (defaults to the configured rate)
        #[arg(long)]
        fps: Option<u32>,

        /// Noise seed for reproducible renders
        #[arg(long, env = "SONOMAP_SEED")]
        seed: Option<u64>,

        /// Image height override
        #[arg(long)]
        height: Option<usize>,

        /// Image width override
        #[arg(long)]
        width: Option<usize>,

        /// Move the sources along a circular orbit between frames
        #[arg(long)]
        orbit: bool,

        /// Print per-frame statistics as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as TOML
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Show scene geometry for a configuration
    Info {
        /// Camera configuration (TOML)
        #[arg(short, long, value_name = "FILE", env = "SONOMAP_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sono_cli=info,sono_camera=info,sono_acoustic=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            config,
            variant,
            frames,
            output,
            fps,
            seed,
            height,
            width,
            orbit,
            json,
        } => {
            let overrides = Overrides {
                variant,
                seed,
                height,
                width,
            };
            load_config(config.as_deref())
                .and_then(|c| overrides.apply(c))
                .and_then(|c| render_command(c, frames, &output, fps, orbit, json))
        }
        Commands::Config { output } => config_command(output.as_deref()),
        Commands::Info { config } => load_config(config.as_deref()).and_then(info_command),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

// ============================================================================
// Configuration
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<CameraConfig> {
    match path {
        Some(path) => CameraConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(CameraConfig::default()),
    }
}

/// Command-line values that take precedence over the configuration file
struct Overrides {
    variant: Option<String>,
    seed: Option<u64>,
    height: Option<usize>,
    width: Option<usize>,
}

impl Overrides {
    fn apply(self, mut config: CameraConfig) -> Result<CameraConfig> {
        if let Some(name) = self.variant {
            config.post = name.parse::<PostProcess>()?;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        config.validate()?;
        Ok(config)
    }
}

fn config_command(output: Option<&Path>) -> Result<()> {
    let text = CameraConfig::default().to_string()?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("{} {}", "   Created".green().bold(), path.display().to_string().cyan());
        }
        None => print!("{}", text),
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

/// Position of source `index` after `step` of `steps` along the orbit.
///
/// Sources start at their default positions and circle the point (0.5, 0.0)
/// at a radius of 0.3 m, one full turn over the whole render.
fn orbit_position(index: usize, step: usize, steps: usize) -> Position {
    let start = DEFAULT_SOURCE_POSITIONS[index % DEFAULT_SOURCE_POSITIONS.len()];
    let (cx, cy) = (0.5, 0.0);
    let radius = ((start[0] - cx).powi(2) + (start[1] - cy).powi(2)).sqrt();
    let phase = (start[1] - cy).atan2(start[0] - cx);
    let angle = phase + 2.0 * PI * step as f64 / steps.max(1) as f64;
    Position::new(cx + radius * angle.cos(), cy + radius * angle.sin(), start[2])
}

/// Summary of one rendered frame
#[derive(Debug, Serialize)]
struct FrameStats {
    index: usize,
    mean: [f64; 3],
    max: [u8; 3],
    peak_row: usize,
    peak_col: usize,
    elapsed_ms: u64,
}

impl FrameStats {
    fn from_frame(index: usize, frame: &Frame, elapsed_ms: u64) -> Self {
        let mut peak = 0;
        for (i, p) in frame.pixels.iter().enumerate() {
            if p.intensity() > frame.pixels[peak].intensity() {
                peak = i;
            }
        }
        let width = frame.width.max(1);
        Self {
            index,
            mean: [frame.channel_mean(0), frame.channel_mean(1), frame.channel_mean(2)],
            max: [frame.channel_max(0), frame.channel_max(1), frame.channel_max(2)],
            peak_row: peak / width,
            peak_col: peak % width,
            elapsed_ms,
        }
    }
}

fn render_command(
    config: CameraConfig,
    frames: usize,
    output: &Path,
    fps: Option<u32>,
    orbit: bool,
    json: bool,
) -> Result<()> {
    if frames == 0 {
        bail!("at least one frame must be rendered");
    }
    let fps = fps.unwrap_or(config.fps);
    let variant = config.post;
    tracing::debug!(frames, fps, orbit, %variant, "Starting render");

    let sources = SharedSources::new(
        DEFAULT_SOURCE_POSITIONS
            .iter()
            .map(|p| Position::new(p[0], p[1], p[2]))
            .collect(),
    );
    let mut camera = SoundCamera::with_tracker(config, sources.clone())?;

    if !json {
        let (height, width) = camera.resolution();
        println!(
            "{} {} frames ({}x{}, variant {})",
            "Rendering".green().bold(),
            frames,
            width,
            height,
            variant.to_string().cyan()
        );
    }

    camera.start_recording();
    let started = Instant::now();
    for step in 0..frames {
        if orbit {
            for index in 0..sources.source_count() {
                sources.set_position(index, orbit_position(index, step, frames));
            }
        }

        let frame_start = Instant::now();
        let frame = camera.render()?;
        let stats = FrameStats::from_frame(step, &frame, frame_start.elapsed().as_millis() as u64);

        if json {
            println!("{}", serde_json::to_string(&stats)?);
        } else {
            println!(
                "  frame {:>4}  mean R/G/B {:>6.1} {:>6.1} {:>6.1}  peak ({}, {})  {} ms",
                stats.index,
                stats.mean[0],
                stats.mean[1],
                stats.mean[2],
                stats.peak_row,
                stats.peak_col,
                stats.elapsed_ms
            );
        }
    }

    let summary = camera
        .stop_recording(output, fps)
        .with_context(|| format!("writing {}", output.display()))?;

    if !json {
        println!(
            "{} {} ({} frames @ {} fps, {} bytes) in {:.2}s",
            "   Saved".green().bold(),
            summary.path.display().to_string().cyan(),
            summary.frames,
            summary.fps,
            summary.bytes,
            started.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

// ============================================================================
// Info
// ============================================================================

fn info_command(config: CameraConfig) -> Result<()> {
    let camera = SoundCamera::with_config(config.clone())?;
    let (height, width) = camera.resolution();

    println!("{}", "sonomap - sound camera renderer".bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("{}", "Image:".bold());
    println!("  {}x{} @ {} fps, variant {}", width, height, config.fps, config.post);
    println!();
    println!("{}", "Room:".bold());
    for corner in &config.room.corners {
        println!("  corner ({:.2}, {:.2})", corner[0], corner[1]);
    }
    println!("  height {:.2} m, reflection order {}", config.room.height, config.simulation.max_order);
    println!();
    println!("{}", "Arrays:".bold());
    let channels = ["R", "G", "B"];
    for ((array, reference), channel) in config
        .arrays
        .iter()
        .zip(camera.reference_pixels())
        .zip(channels)
    {
        println!(
            "  {} center ({:.2}, {:.2}, {:.2}), {} capsules, reference pixel ({}, {})",
            channel.cyan(),
            array.center[0],
            array.center[1],
            array.center[2],
            array.capsules,
            reference.0,
            reference.1
        );
    }
    println!();
    println!("{}", "Analysis:".bold());
    let bins = camera.analysis_bins();
    println!(
        "  {} Hz, nfft {}, bins {}..{} ({:.0}-{:.0} Hz)",
        config.simulation.sample_rate,
        config.nfft,
        bins.start,
        bins.end,
        config.doa.freq_range.low_hz,
        config.doa.freq_range.high_hz
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_starts_at_default_positions() {
        let p = orbit_position(0, 0, 10);
        assert!((p - Position::new(0.5, 0.3, 0.1)).norm() < 1e-12);
        let p = orbit_position(1, 0, 10);
        assert!((p - Position::new(0.5, -0.3, 0.1)).norm() < 1e-12);
    }

    #[test]
    fn test_orbit_half_turn_swaps_sources() {
        let p = orbit_position(0, 5, 10);
        assert!((p - Position::new(0.5, -0.3, 0.1)).norm() < 1e-12);
    }

    #[test]
    fn test_overrides() {
        let overrides = Overrides {
            variant: Some("weighted".into()),
            seed: Some(9),
            height: Some(10),
            width: None,
        };
        let config = overrides.apply(CameraConfig::default()).unwrap();
        assert_eq!(config.post, PostProcess::temporal());
        assert_eq!(config.seed, Some(9));
        assert_eq!((config.height, config.width), (10, 640));

        let bad = Overrides {
            variant: Some("sepia".into()),
            seed: None,
            height: None,
            width: None,
        };
        assert!(bad.apply(CameraConfig::default()).is_err());
    }

    #[test]
    fn test_frame_stats() {
        let mut frame = Frame::black(2, 3);
        frame.pixels[4] = sono_camera::Pixel::new(30, 60, 90);
        let stats = FrameStats::from_frame(0, &frame, 1);
        assert_eq!((stats.peak_row, stats.peak_col), (1, 1));
        assert_eq!(stats.max, [30, 60, 90]);
        assert!((stats.mean[0] - 5.0).abs() < 1e-12);
    }
}
