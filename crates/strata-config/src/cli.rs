//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::StrataConfig;

/// strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Adaptive level-of-detail terrain")]
pub struct CliArgs {
    /// Terrain side length in chunks.
    #[arg(long)]
    pub width: Option<u32>,

    /// Deepest quadtree level.
    #[arg(long)]
    pub max_level: Option<u32>,

    /// Vertices along one patch side (2^k + 1).
    #[arg(long)]
    pub vertices: Option<u32>,

    /// Camera refinement distance.
    #[arg(long)]
    pub max_distance: Option<f32>,

    /// Enable or disable the field sample cache.
    #[arg(long)]
    pub cache: Option<bool>,

    /// Number of demo frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl StrataConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.terrain.width = w;
        }
        if let Some(level) = args.max_level {
            self.terrain.max_level = level;
        }
        if let Some(n) = args.vertices {
            self.terrain.vertices_per_side = n;
        }
        if let Some(d) = args.max_distance {
            self.terrain.camera_max_distance = d;
        }
        if let Some(enabled) = args.cache {
            self.cache.enabled = enabled;
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
