//! Narrow interfaces to the renderer and the physics layer.

use strata_mesh::{ColliderMesh, PatchKey, PatchMesh};

/// Receives renderable patch meshes.
pub trait MeshSink {
    /// Submit one patch mesh for this frame.
    fn submit(&mut self, key: PatchKey, mesh: &PatchMesh);
}

/// Receives static collision geometry.
pub trait ColliderSink {
    /// Create or replace the collider for a patch.
    fn insert_collider(&mut self, key: PatchKey, mesh: ColliderMesh);

    /// Remove the collider of a destroyed patch.
    fn remove_collider(&mut self, key: PatchKey);
}

/// Collider sink for terrains without physics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoColliders;

impl ColliderSink for NoColliders {
    fn insert_collider(&mut self, _key: PatchKey, _mesh: ColliderMesh) {}

    fn remove_collider(&mut self, _key: PatchKey) {}
}

impl<F: FnMut(PatchKey, &PatchMesh)> MeshSink for F {
    fn submit(&mut self, key: PatchKey, mesh: &PatchMesh) {
        self(key, mesh)
    }
}
