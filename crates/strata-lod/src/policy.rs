//! Distance-driven refinement policy.
//!
//! A node at `level` must be refined while some observer is close enough
//! to require a deeper level. Required levels form concentric rings: the
//! squared distance band `(i-1)/max, i/max] * max_distance^2` maps to level
//! `max_level - i + 1`.

use glam::Vec3;
use strata_config::TerrainSettings;

use crate::frustum::CameraView;

/// Converts observer distances into required quadtree levels.
///
/// Rings are uniform in squared distance and neighbors are not balanced
/// against each other. At high `max_level` adjacent leaves can settle more
/// than two levels apart, and that drift persists while the observers stay
/// put.
#[derive(Clone, Debug, PartialEq)]
pub struct LodPolicy {
    max_level: u32,
    camera_max_distance_sq: f32,
    object_max_distance_sq: f32,
    margin_factor: f32,
}

impl LodPolicy {
    /// Create a policy.
    pub fn new(
        max_level: u32,
        camera_max_distance: f32,
        object_max_distance: f32,
        margin_factor: f32,
    ) -> Self {
        Self {
            max_level,
            camera_max_distance_sq: camera_max_distance * camera_max_distance,
            object_max_distance_sq: object_max_distance * object_max_distance,
            margin_factor,
        }
    }

    /// Policy for validated settings.
    pub fn from_settings(settings: &TerrainSettings) -> Self {
        Self::new(
            settings.max_level,
            settings.camera_max_distance,
            settings.object_max_distance,
            settings.margin_factor,
        )
    }

    /// Deepest level.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Level required at `distance_sq` from an observer whose reach is `max_distance_sq`.
    pub fn level_for(&self, distance_sq: f32, max_distance_sq: f32) -> u32 {
        let mut level = 0;
        let max = self.max_level as f32;
        for i in (1..=self.max_level).rev() {
            if distance_sq > i as f32 / max * max_distance_sq {
                break;
            }
            level += 1;
        }
        level
    }

    /// Deepest level any observer requires for a node centered at `center`
    /// with horizontal bounding radius `radius`.
    ///
    /// Distances are measured to the node's bounding circle, not its center.
    pub fn required_level<C: CameraView + ?Sized>(
        &self,
        camera: &C,
        objects: &[Vec3],
        center: Vec3,
        radius: f32,
    ) -> u32 {
        let radius = radius * self.margin_factor;
        let radius_sq = radius * radius;
        let camera_level = self.level_for(
            camera.distance_squared_to(center) - radius_sq,
            self.camera_max_distance_sq,
        );
        objects
            .iter()
            .map(|object| {
                self.level_for(
                    object.distance_squared(center) - radius_sq,
                    self.object_max_distance_sq,
                )
            })
            .fold(camera_level, u32::max)
    }

    /// Whether a node at `level` must be subdivided.
    pub fn needs_refinement(&self, level: u32, required: u32) -> bool {
        level < self.max_level && required > level
    }
}
