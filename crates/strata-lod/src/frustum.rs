//! Frustum classification of bounding boxes and the camera query contract.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::Aabb;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Where a box lies relative to the view volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Completely outside; nothing inside it is drawn.
    Outside,
    /// Straddles at least one plane; children must be tested.
    Intersect,
    /// Completely inside; children inherit visibility without testing.
    Inside,
}

/// What the terrain needs from a camera.
pub trait CameraView {
    /// Classify a world-space box against the view volume.
    fn box_visibility(&self, aabb: &Aabb) -> Visibility;

    /// Squared distance from the viewpoint to a world-space point.
    fn distance_squared_to(&self, point: Vec3) -> f32;
}

/// A view frustum defined by six inward-pointing planes extracted from
/// the view-projection matrix.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `Vec4(a, b, c, d)` where `(a,b,c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined reverse-Z view-projection
    /// matrix using the Griggs-Hartmann method.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // Reverse-Z maps near to 1 and far to 0: row2 alone is the far plane.
        planes[NEAR] = rows[3] + rows[2];
        planes[FAR] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Classify an AABB with the p-vertex / n-vertex test.
    ///
    /// Conservative: boxes near frustum corners may be reported as
    /// `Intersect` while actually outside, never the reverse.
    pub fn classify(&self, aabb: &Aabb) -> Visibility {
        let mut result = Visibility::Inside;
        for plane in &self.planes {
            let normal = plane.truncate();
            let d = plane.w;

            // Corner furthest along the normal, and the one opposite to it.
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            let negative = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.min, aabb.max);

            if normal.dot(positive) + d < 0.0 {
                return Visibility::Outside;
            }
            if normal.dot(negative) + d < 0.0 {
                result = Visibility::Intersect;
            }
        }
        result
    }
}

/// A viewpoint with an optional frustum. Without a frustum nothing is culled.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    frustum: Option<Frustum>,
}

impl Camera {
    /// A camera that sees everything (distance-only LOD).
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            frustum: None,
        }
    }

    /// A camera with an explicit frustum.
    pub fn with_frustum(position: Vec3, frustum: Frustum) -> Self {
        Self {
            position,
            frustum: Some(frustum),
        }
    }

    /// A Z-up perspective camera at `eye` looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Z);
        // reverse-Z: far as near param
        let proj = Mat4::perspective_rh(fov_y, aspect, far, near);
        Self::with_frustum(eye, Frustum::from_view_projection(&(proj * view)))
    }

    /// Viewpoint position.
    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl CameraView for Camera {
    fn box_visibility(&self, aabb: &Aabb) -> Visibility {
        match &self.frustum {
            Some(frustum) => frustum.classify(aabb),
            None => Visibility::Inside,
        }
    }

    fn distance_squared_to(&self, point: Vec3) -> f32 {
        self.position.distance_squared(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_vp() -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            1000.0, // reverse-Z: far as near param
            0.1,    // reverse-Z: near as far param
        );
        proj * view
    }

    fn frustum() -> Frustum {
        Frustum::from_view_projection(&default_camera_vp())
    }

    #[test]
    fn test_box_in_front_is_inside() {
        let aabb = Aabb::new(Vec3::new(-0.5, -0.5, -10.5), Vec3::new(0.5, 0.5, -9.5));
        assert_eq!(frustum().classify(&aabb), Visibility::Inside);
    }

    #[test]
    fn test_box_straddling_side_plane_intersects() {
        let aabb = Aabb::new(Vec3::new(-100.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
        assert_eq!(frustum().classify(&aabb), Visibility::Intersect);
    }

    #[test]
    fn test_object_behind_camera_outside() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(frustum().classify(&aabb), Visibility::Outside);
    }

    #[test]
    fn test_all_six_planes_tested() {
        let f = frustum();
        let outside = [
            Aabb::new(Vec3::splat(10.0), Vec3::splat(20.0)),
            Aabb::new(Vec3::new(-1000.0, 0.0, -5.0), Vec3::new(-999.0, 1.0, -4.0)),
            Aabb::new(Vec3::new(999.0, 0.0, -5.0), Vec3::new(1000.0, 1.0, -4.0)),
            Aabb::new(Vec3::new(0.0, 999.0, -5.0), Vec3::new(1.0, 1000.0, -4.0)),
            Aabb::new(Vec3::new(0.0, -1000.0, -5.0), Vec3::new(1.0, -999.0, -4.0)),
            Aabb::new(Vec3::new(0.0, 0.0, -2000.0), Vec3::new(1.0, 1.0, -1500.0)),
        ];
        for aabb in &outside {
            assert_eq!(f.classify(aabb), Visibility::Outside, "{aabb:?} should be culled");
        }
    }

    #[test]
    fn test_frustum_planes_normalized() {
        for plane in &frustum().planes {
            let normal_len = plane.truncate().length();
            assert!(
                (normal_len - 1.0).abs() < 1e-4,
                "plane normal not normalized: {normal_len}"
            );
        }
    }

    /// Without a frustum every box is inside.
    #[test]
    fn test_unculled_camera() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 10.0));
        let aabb = Aabb::new(Vec3::splat(-1e6), Vec3::splat(-1e6 + 1.0));
        assert_eq!(camera.box_visibility(&aabb), Visibility::Inside);
        assert_eq!(camera.distance_squared_to(Vec3::ZERO), 100.0);
    }

    /// A Z-up camera looking down +X sees ground ahead, not behind.
    #[test]
    fn test_looking_at_z_up() {
        let camera = Camera::looking_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(100.0, 0.0, 0.0),
            std::f32::consts::FRAC_PI_3,
            1.0,
            0.1,
            1000.0,
        );
        let ahead = Aabb::new(Vec3::new(40.0, -5.0, -1.0), Vec3::new(50.0, 5.0, 1.0));
        let behind = Aabb::new(Vec3::new(-50.0, -5.0, -1.0), Vec3::new(-40.0, 5.0, 1.0));
        assert_ne!(camera.box_visibility(&ahead), Visibility::Outside);
        assert_eq!(camera.box_visibility(&behind), Visibility::Outside);
    }
}
