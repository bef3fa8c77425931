#![allow(dead_code)]

use std::collections::BTreeMap;

use glam::{IVec2, Vec3};
use strata_config::TerrainSettings;
use strata_field::FieldValue;
use strata_lod::QuadTree;
use strata_terrain::{Camera, ColliderMesh, ColliderSink, Patch, PatchKey};

/// 64 world units across, levels 0..=3, 5 vertices per patch side.
pub fn small_terrain_settings() -> TerrainSettings {
    TerrainSettings {
        width: 64,
        max_level: 3,
        vertices_per_side: 5,
        camera_max_distance: 24.0,
        object_max_distance: 8.0,
        chunk_size: 1.0,
        margin_factor: 1.0,
        min_height: -1.0,
        max_height: 1.0,
        min_physics_level: 3,
        area_weighted_normals: true,
        use_cache: true,
        cache_refresh_frames: 0,
    }
}

/// Same terrain with five levels and 9 vertices per side. Deep enough that
/// the distance rings leave level gaps above two.
pub fn deep_terrain_settings() -> TerrainSettings {
    TerrainSettings {
        max_level: 5,
        vertices_per_side: 9,
        ..small_terrain_settings()
    }
}

pub fn far_camera() -> Camera {
    Camera::new(Vec3::new(0.0, 0.0, 500.0))
}

/// Camera just above the ground at a world position.
pub fn ground_camera(x: f32, y: f32) -> Camera {
    Camera::new(Vec3::new(x, y, 1.0))
}

/// Gentle hills that stay inside the configured height range.
pub fn rolling(x: f32, y: f32) -> FieldValue {
    FieldValue::with_height(0.4 * (x * 0.35).sin() + 0.3 * (y * 0.27).cos())
}

/// Whether a grid point lies on the closed footprint of a patch.
pub fn touches(patch: &Patch, grid: IVec2) -> bool {
    let rel = grid - patch.key().origin;
    let size = patch.size();
    rel.x >= 0 && rel.y >= 0 && rel.x <= size && rel.y <= size
}

pub fn find_patch<'a>(patches: impl IntoIterator<Item = &'a Patch>, level: u32, origin: IVec2) -> &'a Patch {
    let key = PatchKey { level, origin };
    patches
        .into_iter()
        .find(|p| p.key() == key)
        .unwrap_or_else(|| panic!("no patch {key:?}"))
}

/// Children XOR patch on every node; culled nodes own nothing.
pub fn assert_tree_invariant(tree: &QuadTree<Patch>) {
    for (id, node) in tree.iter() {
        let has_children = node.children().is_some();
        let has_patch = node.patch().is_some();
        assert!(!(has_children && has_patch), "{id:?} owns children and a patch");
        if node.is_culled() {
            assert!(!has_children && !has_patch, "culled {id:?} still owns data");
        } else {
            assert!(has_children || has_patch, "visible {id:?} owns nothing");
        }
    }
}

/// Collider sink that remembers which colliders are live.
#[derive(Default)]
pub struct RecordingColliders {
    pub live: BTreeMap<PatchKey, usize>,
    pub inserts: usize,
    pub removals: usize,
}

impl ColliderSink for RecordingColliders {
    fn insert_collider(&mut self, key: PatchKey, mesh: ColliderMesh) {
        self.inserts += 1;
        self.live.insert(key, mesh.triangles.len());
    }

    fn remove_collider(&mut self, key: PatchKey) {
        self.removals += 1;
        self.live.remove(&key);
    }
}
