//! Camera-driven quadtree level-of-detail controller.
//!
//! The [`QuadTree`] is an arena of [`SpatialNode`]s. Once per frame the
//! visibility pass culls nodes against the camera frustum, refines nodes
//! close to an observer and collapses the rest, so that every visible leaf
//! owns exactly one patch.

mod bounds;
mod frustum;
mod policy;
mod tree;

pub use bounds::Aabb;
pub use frustum::{Camera, CameraView, Frustum, Visibility};
pub use policy::LodPolicy;
pub use tree::{NodeFootprint, NodeId, PatchLifecycle, QuadTree, SpatialNode, VisibilityReport};
