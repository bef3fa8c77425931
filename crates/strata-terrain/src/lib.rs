//! Per-frame orchestration of the LOD terrain.
//!
//! [`TerrainManager`] owns the quadtree, the field cache and every patch. One
//! call to [`TerrainManager::update`] runs the visibility pass, the rebuild
//! pass, the seam normal pass and deferred destruction in that order;
//! [`TerrainManager::render`] hands the resulting meshes to a [`MeshSink`].

mod manager;
mod sampling;
mod seams;
mod sink;
mod stats;

pub use manager::TerrainManager;
pub use sampling::Sampling;
pub use sink::{ColliderSink, MeshSink, NoColliders};
pub use stats::{PassTimings, TerrainStats};

pub use strata_lod::{Camera, CameraView};
pub use strata_mesh::{ColliderMesh, Patch, PatchKey, PatchMesh};
