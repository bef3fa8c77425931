//! Validated terrain settings derived from the raw configuration.
//!
//! Invalid values are never fatal: each one is clamped to the nearest
//! supported value and reported once with a warning.

use crate::{CacheConfig, StrataConfig, TerrainConfig};

/// Deepest quadtree level the integer grid can address.
const MAX_LEVEL_LIMIT: u32 = 16;
/// Largest supported patch span (`vertices_per_side - 1`).
const MAX_PATCH_SPAN: u32 = 256;
/// Largest supported terrain width in chunks.
const MAX_WIDTH: u32 = 1 << 16;

/// Terrain settings after validation. All invariants the terrain relies on hold.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSettings {
    /// Terrain side length in chunks, a power of two.
    pub width: u32,
    /// Deepest quadtree level, at most `log2(width)`.
    pub max_level: u32,
    /// Vertices along one patch side, `2^k + 1` with `k >= 1`.
    pub vertices_per_side: usize,
    /// Camera refinement distance.
    pub camera_max_distance: f32,
    /// Focus object refinement distance.
    pub object_max_distance: f32,
    /// World size of one chunk.
    pub chunk_size: f32,
    /// Bounding radius multiplier.
    pub margin_factor: f32,
    /// Theoretical lowest height.
    pub min_height: f32,
    /// Theoretical highest height.
    pub max_height: f32,
    /// First level that emits colliders.
    pub min_physics_level: u32,
    /// Area-weighted normal accumulation.
    pub area_weighted_normals: bool,
    /// Memoize field samples.
    pub use_cache: bool,
    /// Frames between cache refreshes (0 = never).
    pub cache_refresh_frames: u32,
}

impl TerrainSettings {
    /// Validate raw terrain and cache configuration.
    pub fn from_config(terrain: &TerrainConfig, cache: &CacheConfig) -> Self {
        let width = validate_width(terrain.width);
        let max_level = validate_max_level(terrain.max_level, width);
        let vertices_per_side = validate_vertices(terrain.vertices_per_side);

        let (min_height, max_height) = if terrain.min_height > terrain.max_height {
            log::warn!(
                "min_height {} exceeds max_height {}, swapping",
                terrain.min_height,
                terrain.max_height
            );
            (terrain.max_height, terrain.min_height)
        } else {
            (terrain.min_height, terrain.max_height)
        };

        let defaults = TerrainConfig::default();
        Self {
            width,
            max_level,
            vertices_per_side,
            camera_max_distance: positive_or(
                "camera_max_distance",
                terrain.camera_max_distance,
                defaults.camera_max_distance,
            ),
            object_max_distance: positive_or(
                "object_max_distance",
                terrain.object_max_distance,
                defaults.object_max_distance,
            ),
            chunk_size: positive_or("chunk_size", terrain.chunk_size, defaults.chunk_size),
            margin_factor: positive_or("margin_factor", terrain.margin_factor, 1.0),
            min_height,
            max_height,
            min_physics_level: terrain.min_physics_level,
            area_weighted_normals: terrain.area_weighted_normals,
            use_cache: cache.enabled,
            cache_refresh_frames: cache.refresh_frames,
        }
    }

    /// Grid steps along one patch side (`vertices_per_side - 1`).
    pub fn patch_span(&self) -> i32 {
        (self.vertices_per_side - 1) as i32
    }

    /// World-space side length of the whole terrain.
    pub fn world_extent(&self) -> f32 {
        self.width as f32 * self.chunk_size
    }
}

impl Default for TerrainSettings {
    fn default() -> Self {
        StrataConfig::default().terrain_settings()
    }
}

impl StrataConfig {
    /// Validated terrain settings for this configuration.
    pub fn terrain_settings(&self) -> TerrainSettings {
        TerrainSettings::from_config(&self.terrain, &self.cache)
    }
}

fn validate_width(width: u32) -> u32 {
    let clamped = width.clamp(1, MAX_WIDTH);
    let rounded = clamped.next_power_of_two();
    if rounded != width {
        log::warn!("terrain width {width} is not a supported power of two, using {rounded}");
    }
    rounded
}

fn validate_max_level(max_level: u32, width: u32) -> u32 {
    let supported = width.trailing_zeros().min(MAX_LEVEL_LIMIT);
    if max_level > supported {
        log::warn!("max_level {max_level} exceeds what width {width} supports, clamping to {supported}");
        supported
    } else {
        max_level
    }
}

fn validate_vertices(vertices: u32) -> usize {
    let span = vertices.saturating_sub(1).clamp(2, MAX_PATCH_SPAN);
    let span = span.next_power_of_two();
    let snapped = span + 1;
    if snapped != vertices {
        log::warn!("vertices_per_side {vertices} must be 2^k + 1, using {snapped}");
    }
    snapped as usize
}

fn positive_or(name: &str, value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("{name} must be positive, got {value}, using {fallback}");
        fallback
    }
}
