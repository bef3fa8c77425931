//! Patch-local vertex record.

use std::rc::Rc;

use glam::{IVec2, Vec3};
use strata_field::FieldSample;

/// One vertex of a patch grid.
#[derive(Clone, Debug)]
pub struct Vertex {
    /// Shared field sample at this grid point.
    pub sample: Rc<FieldSample>,
    /// Terrain grid position.
    pub grid_pos: IVec2,
    /// Index in the emitted vertex buffer; `None` when elided.
    pub mesh_index: Option<u32>,
    /// Normal accumulated from this patch's own triangles.
    pub local_normal: Vec3,
    /// Final normal after seam reconciliation.
    pub normal: Vec3,
    /// `false` when a coarser neighbor supplies this boundary vertex instead.
    pub valid: bool,
}

impl Vertex {
    /// A fresh, valid vertex with an up normal.
    pub fn new(sample: Rc<FieldSample>, grid_pos: IVec2) -> Self {
        Self {
            sample,
            grid_pos,
            mesh_index: None,
            local_normal: Vec3::Z,
            normal: Vec3::Z,
            valid: true,
        }
    }

    /// 3D world position (Z up).
    pub fn position(&self) -> Vec3 {
        self.sample.position()
    }
}
