//! Integer grid shared by the quadtree, the patches and the cache.
//!
//! One grid unit is the vertex spacing of a patch at the deepest level. A
//! node at level `L` spans `span << (max_level - L)` units with a vertex
//! every `1 << (max_level - L)` units, so the same grid point is addressed
//! identically at every level.

use glam::{IVec2, Vec2};
use strata_config::TerrainSettings;

/// Grid geometry of one terrain instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    max_level: u32,
    patch_span: i32,
    world_extent: f32,
}

impl GridLayout {
    /// Create a layout. `patch_span` is `vertices_per_side - 1`, a power of two.
    pub fn new(max_level: u32, patch_span: i32, world_extent: f32) -> Self {
        debug_assert!(patch_span >= 2 && (patch_span as u32).is_power_of_two());
        Self {
            max_level,
            patch_span,
            world_extent,
        }
    }

    /// Layout for validated settings.
    pub fn from_settings(settings: &TerrainSettings) -> Self {
        Self::new(
            settings.max_level,
            settings.patch_span(),
            settings.world_extent(),
        )
    }

    /// Deepest quadtree level.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Grid steps along one patch side.
    pub fn patch_span(&self) -> i32 {
        self.patch_span
    }

    /// Vertices along one patch side.
    pub fn vertices_per_side(&self) -> usize {
        self.patch_span as usize + 1
    }

    /// Side length of the whole terrain in grid units.
    pub fn extent(&self) -> i32 {
        self.patch_span << self.max_level
    }

    /// Vertex spacing in grid units at `level`.
    pub fn spacing(&self, level: u32) -> i32 {
        1 << (self.max_level - level.min(self.max_level))
    }

    /// Node side length in grid units at `level`.
    pub fn node_size(&self, level: u32) -> i32 {
        self.patch_span * self.spacing(level)
    }

    /// World units per grid unit.
    pub fn unit(&self) -> f32 {
        self.world_extent / self.extent() as f32
    }

    /// World-space side length of the terrain.
    pub fn world_extent(&self) -> f32 {
        self.world_extent
    }

    /// Convert a grid point to a world position. The terrain is centered on
    /// the world origin.
    pub fn grid_to_world(&self, grid: IVec2) -> Vec2 {
        let half = self.extent() / 2;
        (grid - IVec2::splat(half)).as_vec2() * self.unit()
    }

    /// Convert a world position to the nearest grid point at or below it.
    pub fn world_to_grid(&self, world: Vec2) -> IVec2 {
        let half = (self.extent() / 2) as f32;
        (world / self.unit() + Vec2::splat(half)).floor().as_ivec2()
    }

    /// Whether a grid point lies on the closed terrain square.
    pub fn contains(&self, grid: IVec2) -> bool {
        let e = self.extent();
        grid.x >= 0 && grid.y >= 0 && grid.x <= e && grid.y <= e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        // 64 world units, 3 levels, 5 vertices per side
        GridLayout::new(3, 4, 64.0)
    }

    #[test]
    fn test_extent_and_sizes() {
        let l = layout();
        assert_eq!(l.extent(), 32);
        assert_eq!(l.node_size(0), 32);
        assert_eq!(l.node_size(3), 4);
        assert_eq!(l.spacing(0), 8);
        assert_eq!(l.spacing(3), 1);
        assert_eq!(l.vertices_per_side(), 5);
    }

    /// The terrain is centered on the origin.
    #[test]
    fn test_grid_to_world_centered() {
        let l = layout();
        assert_eq!(l.grid_to_world(IVec2::ZERO), Vec2::new(-32.0, -32.0));
        assert_eq!(l.grid_to_world(IVec2::splat(16)), Vec2::ZERO);
        assert_eq!(l.grid_to_world(IVec2::splat(32)), Vec2::new(32.0, 32.0));
    }

    #[test]
    fn test_world_to_grid_inverse() {
        let l = layout();
        for g in [IVec2::ZERO, IVec2::new(5, 17), IVec2::splat(32)] {
            assert_eq!(l.world_to_grid(l.grid_to_world(g)), g);
        }
    }

    #[test]
    fn test_contains_closed_square() {
        let l = layout();
        assert!(l.contains(IVec2::new(32, 0)));
        assert!(!l.contains(IVec2::new(33, 0)));
        assert!(!l.contains(IVec2::new(-1, 4)));
    }
}
