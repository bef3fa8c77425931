//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrataConfig {
    /// Terrain shape and level-of-detail settings.
    pub terrain: TerrainConfig,
    /// Field sample cache settings.
    pub cache: CacheConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless fly-over settings used by the demo binary.
    pub demo: DemoConfig,
}

/// Terrain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Terrain side length in chunks. Rounded up to a power of two.
    pub width: u32,
    /// Deepest quadtree level. Clamped to `log2(width)`.
    pub max_level: u32,
    /// Vertices along one patch side. Must be `2^k + 1`.
    pub vertices_per_side: u32,
    /// Distance at which the camera stops requesting refinement.
    pub camera_max_distance: f32,
    /// Distance at which focus objects stop requesting refinement.
    pub object_max_distance: f32,
    /// World size of one chunk.
    pub chunk_size: f32,
    /// Multiplier applied to a node's bounding radius in distance tests.
    pub margin_factor: f32,
    /// Lowest height the field is expected to produce.
    pub min_height: f32,
    /// Highest height the field is expected to produce.
    pub max_height: f32,
    /// Patches at this level or deeper emit collider meshes.
    pub min_physics_level: u32,
    /// Weight face normals by triangle area when accumulating vertex normals.
    pub area_weighted_normals: bool,
}

/// Field cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoize field samples. When disabled every request hits the sampler.
    pub enabled: bool,
    /// Frames between cache refreshes (0 = never refresh).
    pub refresh_frames: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Frames between terrain statistics log lines (0 = never).
    pub stats_interval_frames: u32,
}

/// Demo fly-over configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of frames to simulate.
    pub frames: u32,
    /// Noise seed for the demo height field.
    pub seed: u32,
    /// Camera height above the zero plane.
    pub camera_altitude: f32,
    /// Camera travel per frame in world units.
    pub camera_speed: f32,
    /// Amplitude of the first noise octave.
    pub amplitude: f32,
    /// Frequency of the first noise octave.
    pub base_frequency: f32,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 64,
            max_level: 4,
            vertices_per_side: 9,
            camera_max_distance: 512.0,
            object_max_distance: 128.0,
            chunk_size: 16.0,
            margin_factor: 1.0,
            min_height: -64.0,
            max_height: 256.0,
            min_physics_level: 3,
            area_weighted_normals: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_frames: 120,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval_frames: 60,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            seed: 7,
            camera_altitude: 80.0,
            camera_speed: 4.0,
            amplitude: 48.0,
            base_frequency: 0.004,
        }
    }
}

// --- Load / Save / Reload ---

impl StrataConfig {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = StrataConfig::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join("config.ron");
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let new_config = read_config(&config_path)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config(path: &Path) -> Result<StrataConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
