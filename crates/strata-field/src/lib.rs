//! Height/color field sampling and sample memoization.
//!
//! The terrain core only needs a pure function from a world coordinate to a
//! height and a color. This crate defines that contract ([`FieldSampler`]),
//! the integer grid every patch vertex lives on ([`GridLayout`]), and the
//! quadtree-shaped [`FieldCache`] that hands out one shared sample per grid
//! point.

mod cache;
mod grid;
mod noise_field;
mod sample;

pub use cache::{CacheStats, DirectSource, FieldCache, SampleSource};
pub use grid::GridLayout;
pub use noise_field::{NoiseField, NoiseParams};
pub use sample::{FieldSample, FieldSampler, FieldValue, FlatField};
