//! Diagnostics threaded through the manager.

use std::time::Duration;

use strata_field::CacheStats;

/// Wall time spent in each pass of the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassTimings {
    pub visibility: Duration,
    pub rebuild: Duration,
    pub seams: Duration,
    pub destruction: Duration,
    pub render: Duration,
}

impl PassTimings {
    /// Sum of all passes.
    pub fn total(&self) -> Duration {
        self.visibility + self.rebuild + self.seams + self.destruction + self.render
    }
}

/// Counters for the last frame of one terrain instance.
///
/// Everything except `frame` and `total_rebuilds` is reset at the start of
/// each [`update`](crate::TerrainManager::update).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TerrainStats {
    /// Frames updated so far.
    pub frame: u64,
    /// Live quadtree nodes.
    pub active_nodes: usize,
    /// Leaves owning a patch.
    pub active_patches: usize,
    /// Nodes culled by the frustum this frame.
    pub culled_nodes: usize,
    pub patches_created: usize,
    pub patches_destroyed: usize,
    /// Patches rebuilt this frame.
    pub rebuilds: usize,
    /// Patches rebuilt since the terrain was created.
    pub total_rebuilds: u64,
    /// Boundary vertices whose normal was reconciled with another patch.
    pub seam_vertices: usize,
    /// Boundary vertices that fell back to the corner estimate.
    pub estimated_normals: usize,
    /// Sides whose joint level could not be stitched.
    pub drift_warnings: usize,
    /// Colliders inserted or removed.
    pub collider_updates: usize,
    /// Meshes handed to the last render call.
    pub submitted: usize,
    /// Field cache contents, when the cache is enabled.
    pub cache: Option<CacheStats>,
    pub timings: PassTimings,
}

impl TerrainStats {
    pub(crate) fn begin_frame(&mut self) {
        *self = Self {
            frame: self.frame + 1,
            total_rebuilds: self.total_rebuilds,
            cache: self.cache,
            ..Self::default()
        };
    }

    /// Whether the set of patches or any mesh changed this frame.
    pub fn structure_changed(&self) -> bool {
        self.patches_created > 0 || self.patches_destroyed > 0 || self.rebuilds > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_frame_keeps_totals() {
        let mut stats = TerrainStats {
            frame: 4,
            rebuilds: 3,
            total_rebuilds: 10,
            drift_warnings: 1,
            ..TerrainStats::default()
        };
        stats.begin_frame();
        assert_eq!(stats.frame, 5);
        assert_eq!(stats.total_rebuilds, 10);
        assert_eq!(stats.rebuilds, 0);
        assert_eq!(stats.drift_warnings, 0);
        assert!(!stats.structure_changed());
    }

    #[test]
    fn test_timings_total() {
        let timings = PassTimings {
            visibility: Duration::from_micros(5),
            seams: Duration::from_micros(7),
            ..PassTimings::default()
        };
        assert_eq!(timings.total(), Duration::from_micros(12));
    }
}
