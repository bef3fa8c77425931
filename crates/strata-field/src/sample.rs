//! Field sample types and the sampler contract.

use glam::{Vec2, Vec3};

/// Raw sampler output for one world coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldValue {
    /// Height above the zero plane.
    pub height: f32,
    /// Linear RGB color.
    pub color: Vec3,
}

impl FieldValue {
    /// A value with the given height and a neutral grey color.
    pub fn with_height(height: f32) -> Self {
        Self {
            height,
            color: Vec3::splat(0.5),
        }
    }
}

/// An immutable, memoized sample of the field at a grid-aligned world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSample {
    /// Height above the zero plane.
    pub height: f32,
    /// Linear RGB color.
    pub color: Vec3,
    /// Horizontal world position the sample was taken at.
    pub world_pos: Vec2,
}

impl FieldSample {
    /// Full 3D position (Z up).
    pub fn position(&self) -> Vec3 {
        self.world_pos.extend(self.height)
    }
}

/// A pure function `world (x, y) -> (height, color)`.
///
/// Implementations must be referentially stable: sampling the same
/// coordinate twice returns the same value.
pub trait FieldSampler {
    /// Sample the field at a world coordinate.
    fn sample(&self, x: f32, y: f32) -> FieldValue;
}

impl<F> FieldSampler for F
where
    F: Fn(f32, f32) -> FieldValue,
{
    fn sample(&self, x: f32, y: f32) -> FieldValue {
        self(x, y)
    }
}

/// A constant-height field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatField {
    /// Height everywhere.
    pub height: f32,
    /// Color everywhere.
    pub color: Vec3,
}

impl FlatField {
    /// A flat field at the given height.
    pub fn new(height: f32) -> Self {
        Self {
            height,
            color: Vec3::splat(0.5),
        }
    }
}

impl FieldSampler for FlatField {
    fn sample(&self, _x: f32, _y: f32) -> FieldValue {
        FieldValue {
            height: self.height,
            color: self.color,
        }
    }
}
