//! Patch mesh generation with crack-free seams between LOD levels.
//!
//! A [`Patch`] owns an `N x N` vertex grid for one quadtree leaf. When a
//! neighbor is coarser, the boundary vertices it cannot match are elided and
//! the boundary strip is re-triangulated against the interior, so both sides
//! of the seam share exactly the same edge vertices.

mod column;
mod mesh;
mod normals;
mod patch;
mod side;
pub mod stitching;
mod vertex;

pub use column::BoundaryColumn;
pub use mesh::{ColliderMesh, PatchMesh, TerrainVertex};
pub use normals::{accumulate_normals, estimate_normal};
pub use patch::{Patch, PatchKey};
pub use side::{JointLevels, Side};
pub use vertex::Vertex;
