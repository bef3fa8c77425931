//! Frame-level behavior of the terrain manager.

mod common;

use common::*;
use glam::{IVec2, Vec3};
use strata_config::TerrainSettings;
use strata_field::FlatField;
use strata_mesh::Side;
use strata_terrain::{Camera, NoColliders, TerrainManager};

/// A distant camera over the center needs nothing but the root patch.
#[test]
fn far_camera_keeps_single_root_patch() {
    let mut terrain = TerrainManager::new(small_terrain_settings(), FlatField::new(0.0));
    for _ in 0..3 {
        terrain.update(&far_camera(), &[], &mut NoColliders);
    }
    let tree = terrain.tree();
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.leaf_ids(), vec![tree.root()]);
    assert_eq!(terrain.stats().rebuilds, 0);
    assert_eq!(terrain.stats().total_rebuilds, 1);
    let root = terrain.patches().next().unwrap();
    assert_eq!(root.level(), 0);
    assert_eq!(root.rebuild_count(), 1);
}

/// Descending over one quadrant refines it to the deepest level and leaves
/// the other quadrants as single level 1 patches.
#[test]
fn near_quadrant_refines_and_settles() {
    let mut terrain = TerrainManager::new(small_terrain_settings(), FlatField::new(0.0));
    terrain.update(&far_camera(), &[], &mut NoColliders);

    let camera = ground_camera(-16.0, -16.0);
    let stats = terrain.update(&camera, &[], &mut NoColliders);
    assert_eq!(stats.patches_destroyed, 1);
    assert_eq!(stats.active_patches, 19);

    let fine: Vec<_> = terrain.patches().filter(|p| p.level() == 3).collect();
    assert_eq!(fine.len(), 16);
    assert!(fine.iter().all(|p| p.key().origin.x < 16 && p.key().origin.y < 16));
    let coarse: Vec<_> = terrain.patches().filter(|p| p.level() == 1).map(|p| p.key().origin).collect();
    assert_eq!(coarse.len(), 3);
    assert!(!coarse.contains(&IVec2::ZERO));

    let tree = terrain.tree();
    let quadrant = tree.node(tree.root()).unwrap().children().unwrap()[0];
    for child in tree.node(quadrant).unwrap().children().unwrap() {
        let child = tree.node(child).unwrap();
        assert_eq!(child.level(), 2);
        assert_eq!(child.children().map(|c| c.len()), Some(4));
    }

    // Every patch was built exactly once at the transition, and a steady
    // camera causes no further rebuilds.
    assert!(terrain.patches().all(|p| p.rebuild_count() == 1));
    for _ in 0..3 {
        let stats = terrain.update(&camera, &[], &mut NoColliders);
        assert_eq!(stats.rebuilds, 0);
        assert_eq!(stats.patches_created, 0);
        assert_eq!(stats.patches_destroyed, 0);
    }
    assert!(terrain.patches().all(|p| p.rebuild_count() == 1));
}

/// A level 3 patch left of which lies a level 1 patch keeps every fourth
/// left boundary vertex and drops the rest from its index buffer.
#[test]
fn left_joint_of_two_levels_elides_border_vertices() {
    let mut terrain = TerrainManager::new(small_terrain_settings(), FlatField::new(0.0));
    terrain.update(&ground_camera(16.0, -16.0), &[], &mut NoColliders);

    let patch = find_patch(terrain.patches(), 3, IVec2::new(16, 0));
    let joints = patch.joints().unwrap();
    assert_eq!(joints.get(Side::Left), 2);
    assert_eq!(joints.get(Side::Right), 0);
    assert_eq!(joints.get(Side::Front), 0);

    let column = patch.column(Side::Left);
    let valid: Vec<bool> = column
        .external()
        .iter()
        .map(|&i| patch.vertices()[i].valid)
        .collect();
    assert_eq!(valid, vec![true, false, false, false, true]);

    let mesh = patch.mesh().unwrap();
    assert_eq!(mesh.vertices.len(), 22);
    for &i in column.external() {
        let vertex = &patch.vertices()[i];
        assert_eq!(vertex.mesh_index.is_some(), vertex.valid);
    }
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));

    let neighbor = find_patch(terrain.patches(), 1, IVec2::ZERO);
    assert_eq!(neighbor.joints(), Some(strata_mesh::JointLevels::NONE));
}

/// The tree invariant holds on every frame of a flight with frustum culling.
#[test]
fn tree_invariant_holds_during_flight() {
    let mut terrain = TerrainManager::new(small_terrain_settings(), rolling);
    let mut created = 0;
    let mut destroyed = 0;
    let mut culled = 0;
    for frame in 0..40 {
        let t = frame as f32 / 39.0;
        let eye = Vec3::new(-40.0 + 80.0 * t, -30.0 + 60.0 * t, 3.0);
        let camera = Camera::looking_at(eye, eye + Vec3::new(1.0, 0.6, -0.2), 1.0, 1.5, 0.1, 200.0);
        let stats = terrain.update(&camera, &[], &mut NoColliders);
        created += stats.patches_created;
        destroyed += stats.patches_destroyed;
        culled += stats.culled_nodes;
        assert_eq!(created - destroyed, stats.active_patches);
        assert_tree_invariant(terrain.tree());
    }
    assert!(culled > 0, "flight never culled anything");
}

/// Focus objects refine the terrain around themselves.
#[test]
fn focus_object_refines_under_far_camera() {
    let mut terrain = TerrainManager::new(small_terrain_settings(), FlatField::new(0.0));
    let objects = [Vec3::new(20.0, 20.0, 0.0)];
    terrain.update(&far_camera(), &objects, &mut NoColliders);
    let tree = terrain.tree();
    let leaf = tree.find_leaf(IVec2::new(26, 26)).unwrap();
    assert_eq!(tree.node(leaf).unwrap().level(), 3);
    let opposite = tree.find_leaf(IVec2::new(2, 2)).unwrap();
    assert_eq!(tree.node(opposite).unwrap().level(), 1);
}

/// Colliders exist only for fine enough patches and go away with them.
#[test]
fn colliders_follow_patch_lifetime() {
    let mut terrain = TerrainManager::new(small_terrain_settings(), FlatField::new(0.0));
    let mut colliders = RecordingColliders::default();

    terrain.update(&ground_camera(-16.0, -16.0), &[], &mut colliders);
    assert_eq!(colliders.live.len(), 16);
    assert!(colliders.live.keys().all(|k| k.level >= 3));
    assert!(colliders.live.values().all(|&triangles| triangles > 0));

    terrain.update(&far_camera(), &[], &mut colliders);
    assert!(colliders.live.is_empty());
    assert_eq!(colliders.removals, 16);
    assert_eq!(colliders.inserts, 16);
}

/// Refreshing through the manager drops samples only deep patches used.
#[test]
fn cache_refresh_evicts_abandoned_levels() {
    let settings = TerrainSettings {
        cache_refresh_frames: 1,
        ..small_terrain_settings()
    };
    let mut terrain = TerrainManager::new(settings, rolling);
    terrain.update(&ground_camera(-16.0, -16.0), &[], &mut NoColliders);
    let near_heights: Vec<f32> = find_patch(terrain.patches(), 3, IVec2::ZERO)
        .vertices()
        .iter()
        .map(|v| v.sample.height)
        .collect();
    assert!(terrain.cache_stats().unwrap().nodes > 1);

    for _ in 0..3 {
        terrain.update(&far_camera(), &[], &mut NoColliders);
    }
    assert_eq!(terrain.cache_stats().unwrap().nodes, 1);

    terrain.update(&ground_camera(-16.0, -16.0), &[], &mut NoColliders);
    let again: Vec<f32> = find_patch(terrain.patches(), 3, IVec2::ZERO)
        .vertices()
        .iter()
        .map(|v| v.sample.height)
        .collect();
    assert_eq!(near_heights, again);
}

/// With three vertices per side a two level gap cannot be stitched: it is
/// reported, left unstitched and shaded with estimated normals.
#[test]
fn unrepresentable_joint_is_reported_not_fatal() {
    let settings = TerrainSettings {
        vertices_per_side: 3,
        ..small_terrain_settings()
    };
    let mut terrain = TerrainManager::new(settings, rolling);
    let stats = terrain.update(&ground_camera(-16.0, -16.0), &[], &mut NoColliders);
    assert!(stats.drift_warnings > 0);
    assert!(stats.estimated_normals > 0);

    // Grid extent is 16 here; the level 3 patch at (6, 0) borders quadrant 1.
    let patch = find_patch(terrain.patches(), 3, IVec2::new(6, 0));
    assert_eq!(patch.joints().unwrap().get(Side::Right), 0);
    assert!(patch.vertices().iter().all(|v| v.valid));
    for vertex in patch.vertices() {
        assert!((vertex.normal.length() - 1.0).abs() < 1e-4);
        assert!(vertex.normal.z > 0.0);
    }
    assert_tree_invariant(terrain.tree());
}
