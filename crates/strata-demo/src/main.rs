//! Headless fly-over of a noise terrain.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --frames 300 --log-level debug`.

use clap::Parser;
use glam::Vec3;
use strata_config::{CliArgs, StrataConfig};
use strata_field::{NoiseField, NoiseParams};
use strata_terrain::{Camera, ColliderMesh, ColliderSink, MeshSink, PatchKey, PatchMesh, TerrainManager};
use tracing::info;

/// Stand-in renderer: tallies what would be uploaded.
#[derive(Default)]
struct UploadTally {
    meshes: usize,
    triangles: usize,
    bytes: usize,
}

impl MeshSink for UploadTally {
    fn submit(&mut self, _key: PatchKey, mesh: &PatchMesh) {
        self.meshes += 1;
        self.triangles += mesh.triangle_count();
        self.bytes += mesh.vertex_bytes().len() + mesh.index_bytes().len();
    }
}

/// Stand-in physics layer: counts live collider triangles.
#[derive(Default)]
struct ColliderTally {
    live: usize,
    inserted: usize,
    removed: usize,
}

impl ColliderSink for ColliderTally {
    fn insert_collider(&mut self, _key: PatchKey, _mesh: ColliderMesh) {
        self.live += 1;
        self.inserted += 1;
    }

    fn remove_collider(&mut self, _key: PatchKey) {
        self.live = self.live.saturating_sub(1);
        self.removed += 1;
    }
}

/// Camera eye and look target for a frame of the circular flight path.
fn flight_pose(terrain: &TerrainManager<NoiseField>, config: &StrataConfig, frame: u32) -> (Vec3, Vec3) {
    let radius = terrain.layout().world_extent() * 0.35;
    let circumference = std::f32::consts::TAU * radius;
    let angle = frame as f32 * config.demo.camera_speed / circumference * std::f32::consts::TAU;
    let ground = |x: f32, y: f32| terrain.sampler().height(f64::from(x), f64::from(y)) as f32;

    let (sin, cos) = angle.sin_cos();
    let x = radius * cos;
    let y = radius * sin;
    let eye = Vec3::new(x, y, ground(x, y) + config.demo.camera_altitude);
    let ahead = Vec3::new(-sin, cos, 0.0) * config.demo.camera_altitude * 2.0;
    let target = Vec3::new(eye.x + ahead.x, eye.y + ahead.y, ground(eye.x + ahead.x, eye.y + ahead.y));
    (eye, target)
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .unwrap_or_else(strata_config::default_config_dir);

    let mut config = StrataConfig::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        StrataConfig::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let settings = config.terrain_settings();
    let field = NoiseField::new(NoiseParams {
        seed: config.demo.seed,
        amplitude: f64::from(config.demo.amplitude),
        base_frequency: f64::from(config.demo.base_frequency),
        ..NoiseParams::default()
    });
    let mut terrain = TerrainManager::new(settings, field);

    let mut uploads = UploadTally::default();
    let mut colliders = ColliderTally::default();
    let interval = config.debug.stats_interval_frames;

    info!(frames = config.demo.frames, "starting fly-over");
    for frame in 0..config.demo.frames {
        let (eye, target) = flight_pose(&terrain, &config, frame);
        let camera = Camera::looking_at(eye, target, 1.0, 16.0 / 9.0, 0.5, 4096.0);
        // A probe below the camera refines the ground it would collide with.
        let probe = Vec3::new(eye.x, eye.y, eye.z - config.demo.camera_altitude);

        terrain.update(&camera, &[probe], &mut colliders);
        uploads = UploadTally::default();
        terrain.render(&mut uploads);

        let stats = terrain.stats();
        if interval > 0 && stats.frame % u64::from(interval) == 0 {
            let ground_level = terrain.patch_at(eye.truncate()).map(|p| p.level());
            info!(
                frame = stats.frame,
                patches = stats.active_patches,
                nodes = stats.active_nodes,
                culled = stats.culled_nodes,
                rebuilds = stats.rebuilds,
                total_rebuilds = stats.total_rebuilds,
                seam_vertices = stats.seam_vertices,
                drift = stats.drift_warnings,
                ground_level,
                cache_samples = stats.cache.map(|c| c.samples),
                triangles = uploads.triangles,
                upload_kib = uploads.bytes / 1024,
                colliders = colliders.live,
                frame_us = stats.timings.total().as_micros() as u64,
                "terrain stats"
            );
        }
    }

    let stats = terrain.stats();
    info!(
        frames = stats.frame,
        total_rebuilds = stats.total_rebuilds,
        meshes = uploads.meshes,
        colliders_inserted = colliders.inserted,
        colliders_removed = colliders.removed,
        "fly-over finished"
    );
}
