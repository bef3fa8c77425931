//! Arena quadtree of terrain nodes.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. Subdividing
//! allocates four slots, merging frees them for reuse. Patches are opaque to
//! the tree: a [`PatchLifecycle`] creates them for new leaves and receives
//! them back when a leaf subdivides, merges away or is culled.

use glam::{IVec2, Vec3};
use strata_field::GridLayout;

use crate::bounds::Aabb;
use crate::frustum::{CameraView, Visibility};
use crate::policy::LodPolicy;

/// Index of a node in the arena. Ids are reused after a node is freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Arena slot.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Square grid region covered by a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeFootprint {
    /// Minimum corner in grid units.
    pub position: IVec2,
    /// Side length in grid units.
    pub size: i32,
    /// Quadtree level (root = 0).
    pub level: u32,
}

impl NodeFootprint {
    /// Whether `grid` lies in the half-open footprint.
    pub fn contains(&self, grid: IVec2) -> bool {
        let rel = grid - self.position;
        rel.x >= 0 && rel.y >= 0 && rel.x < self.size && rel.y < self.size
    }
}

/// Creates patches for new leaves and takes back patches leaving the tree.
pub trait PatchLifecycle<P> {
    /// Build the patch for a leaf that needs one.
    fn create(&mut self, footprint: NodeFootprint) -> P;

    /// Accept a patch removed from the tree. Destruction may be deferred.
    fn retire(&mut self, patch: P);
}

/// A quadtree node. Holds children or a patch, never both; a culled node
/// holds neither.
#[derive(Debug)]
pub struct SpatialNode<P> {
    footprint: NodeFootprint,
    parent: Option<NodeId>,
    children: Option<[NodeId; 4]>,
    patch: Option<P>,
    bounds: Aabb,
    reported: Option<(f32, f32)>,
    culled: bool,
}

impl<P> SpatialNode<P> {
    /// Grid region covered.
    pub fn footprint(&self) -> NodeFootprint {
        self.footprint
    }

    /// Minimum corner in grid units.
    pub fn position(&self) -> IVec2 {
        self.footprint.position
    }

    /// Side length in grid units.
    pub fn size(&self) -> i32 {
        self.footprint.size
    }

    /// Quadtree level.
    pub fn level(&self) -> u32 {
        self.footprint.level
    }

    /// Children in `[(-,-), (+,-), (-,+), (+,+)]` order.
    pub fn children(&self) -> Option<[NodeId; 4]> {
        self.children
    }

    /// The owned patch, for leaves.
    pub fn patch(&self) -> Option<&P> {
        self.patch.as_ref()
    }

    /// Mutable access to the owned patch.
    pub fn patch_mut(&mut self) -> Option<&mut P> {
        self.patch.as_mut()
    }

    /// World-space bounding box used for culling and distance tests.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Height range reported by this node's patch or all of its children.
    pub fn reported_heights(&self) -> Option<(f32, f32)> {
        self.reported
    }

    /// Whether the last visibility pass culled this node.
    pub fn is_culled(&self) -> bool {
        self.culled
    }
}

/// What one visibility pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilityReport {
    /// Nodes evaluated.
    pub visited: usize,
    /// Nodes found outside the frustum.
    pub culled: usize,
    /// Nodes allocated by subdivision.
    pub nodes_created: usize,
    /// Nodes freed by merging or culling.
    pub nodes_removed: usize,
    /// Patches created for new leaves.
    pub patches_created: usize,
    /// Patches handed back to the lifecycle.
    pub patches_retired: usize,
}

impl VisibilityReport {
    /// Whether the set of active patches changed.
    pub fn changed(&self) -> bool {
        self.patches_created > 0 || self.patches_retired > 0
    }
}

struct Pass<'a, C: ?Sized, L: ?Sized> {
    camera: &'a C,
    objects: &'a [Vec3],
    policy: &'a LodPolicy,
    lifecycle: &'a mut L,
    report: VisibilityReport,
}

/// The terrain quadtree. A single root covers the whole grid.
pub struct QuadTree<P> {
    nodes: Vec<Option<SpatialNode<P>>>,
    free: Vec<u32>,
    root: NodeId,
    layout: GridLayout,
    min_height: f32,
    max_height: f32,
}

impl<P> QuadTree<P> {
    /// Create a tree with a single root leaf. New nodes assume the
    /// theoretical `[min_height, max_height]` until patches report.
    pub fn new(layout: GridLayout, min_height: f32, max_height: f32) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            layout,
            min_height,
            max_height,
        };
        let footprint = NodeFootprint {
            position: IVec2::ZERO,
            size: layout.extent(),
            level: 0,
        };
        tree.root = tree.alloc(footprint, None);
        tree
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Grid layout.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// A live node.
    pub fn node(&self, id: NodeId) -> Option<&SpatialNode<P>> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// A live node, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SpatialNode<P>> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// The patch owned by a node.
    pub fn patch(&self, id: NodeId) -> Option<&P> {
        self.node(id).and_then(SpatialNode::patch)
    }

    /// The patch owned by a node, mutably.
    pub fn patch_mut(&mut self, id: NodeId) -> Option<&mut P> {
        self.node_mut(id).and_then(SpatialNode::patch_mut)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// All live nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SpatialNode<P>)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Leaves that currently own a patch.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &SpatialNode<P>)> {
        self.iter().filter(|(_, n)| n.patch.is_some())
    }

    /// Ids of the leaves that own a patch, in arena order.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.leaves().map(|(id, _)| id).collect()
    }

    fn alloc(&mut self, footprint: NodeFootprint, parent: Option<NodeId>) -> NodeId {
        let node = SpatialNode {
            bounds: self.bounds_for(&footprint, None),
            footprint,
            parent,
            children: None,
            patch: None,
            reported: None,
            culled: false,
        };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot as usize] = Some(node);
            NodeId(slot)
        } else {
            self.nodes.push(Some(node));
            NodeId((self.nodes.len() - 1) as u32)
        }
    }

    fn bounds_for(&self, footprint: &NodeFootprint, reported: Option<(f32, f32)>) -> Aabb {
        let (lo, hi) = reported.unwrap_or((self.min_height, self.max_height));
        let min = self.layout.grid_to_world(footprint.position);
        let max = self
            .layout
            .grid_to_world(footprint.position + IVec2::splat(footprint.size));
        Aabb::new(min.extend(lo), max.extend(hi))
    }

    /// Run the visibility/subdivision pass from the root.
    ///
    /// Afterwards every visible leaf owns exactly one patch, inner nodes own
    /// none, and culled nodes have neither children nor a patch.
    pub fn update_visibility<C, L>(
        &mut self,
        camera: &C,
        objects: &[Vec3],
        policy: &LodPolicy,
        lifecycle: &mut L,
    ) -> VisibilityReport
    where
        C: CameraView + ?Sized,
        L: PatchLifecycle<P> + ?Sized,
    {
        let mut pass = Pass {
            camera,
            objects,
            policy,
            lifecycle,
            report: VisibilityReport::default(),
        };
        self.visit(self.root, Visibility::Intersect, &mut pass);
        pass.report
    }

    fn visit<C, L>(&mut self, id: NodeId, inherited: Visibility, pass: &mut Pass<'_, C, L>)
    where
        C: CameraView + ?Sized,
        L: PatchLifecycle<P> + ?Sized,
    {
        let Some(node) = self.node(id) else {
            return;
        };
        let (bounds, footprint, children) = (node.bounds, node.footprint, node.children);
        pass.report.visited += 1;

        // Only straddling parents force a test; inside/outside is inherited.
        let visibility = match inherited {
            Visibility::Intersect => pass.camera.box_visibility(&bounds),
            other => other,
        };

        if visibility == Visibility::Outside {
            self.merge(id, pass);
            self.retire_patch(id, pass);
            if let Some(node) = self.node_mut(id) {
                node.culled = true;
            }
            pass.report.culled += 1;
            return;
        }
        if let Some(node) = self.node_mut(id) {
            node.culled = false;
        }

        let required = pass.policy.required_level(
            pass.camera,
            pass.objects,
            bounds.center(),
            bounds.footprint_radius(),
        );

        if pass.policy.needs_refinement(footprint.level, required) {
            self.retire_patch(id, pass);
            let children = match children {
                Some(children) => children,
                None => self.subdivide(id, footprint, pass),
            };
            for child in children {
                self.visit(child, visibility, pass);
            }
        } else {
            self.merge(id, pass);
            if let Some(node) = self.node_mut(id)
                && node.patch.is_none()
            {
                node.patch = Some(pass.lifecycle.create(footprint));
                pass.report.patches_created += 1;
                tracing::trace!(
                    level = footprint.level,
                    x = footprint.position.x,
                    y = footprint.position.y,
                    "patch created"
                );
            }
        }
    }

    fn subdivide<C, L>(&mut self, id: NodeId, footprint: NodeFootprint, pass: &mut Pass<'_, C, L>) -> [NodeId; 4]
    where
        C: ?Sized,
        L: ?Sized,
    {
        let half = footprint.size / 2;
        let children = [0, 1, 2, 3].map(|i| {
            let child = NodeFootprint {
                position: footprint.position + IVec2::new(i & 1, i >> 1) * half,
                size: half,
                level: footprint.level + 1,
            };
            self.alloc(child, Some(id))
        });
        // The old patch's range does not bound the finer samples.
        let bounds = self.bounds_for(&footprint, None);
        if let Some(node) = self.node_mut(id) {
            node.children = Some(children);
            node.reported = None;
            node.bounds = bounds;
        }
        pass.report.nodes_created += 4;
        children
    }

    fn retire_patch<C, L>(&mut self, id: NodeId, pass: &mut Pass<'_, C, L>)
    where
        C: ?Sized,
        L: PatchLifecycle<P> + ?Sized,
    {
        if let Some(patch) = self.node_mut(id).and_then(|n| n.patch.take()) {
            pass.lifecycle.retire(patch);
            pass.report.patches_retired += 1;
        }
    }

    fn merge<C, L>(&mut self, id: NodeId, pass: &mut Pass<'_, C, L>)
    where
        C: ?Sized,
        L: PatchLifecycle<P> + ?Sized,
    {
        let Some(children) = self.node_mut(id).and_then(|n| n.children.take()) else {
            return;
        };
        for child in children {
            self.remove_subtree(child, pass);
        }
    }

    fn remove_subtree<C, L>(&mut self, id: NodeId, pass: &mut Pass<'_, C, L>)
    where
        C: ?Sized,
        L: PatchLifecycle<P> + ?Sized,
    {
        let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        self.free.push(id.0);
        pass.report.nodes_removed += 1;
        if let Some(patch) = node.patch {
            pass.lifecycle.retire(patch);
            pass.report.patches_retired += 1;
        }
        if let Some(children) = node.children {
            for child in children {
                self.remove_subtree(child, pass);
            }
        }
    }

    /// The visible leaf whose half-open footprint contains `grid`.
    ///
    /// Returns `None` outside the terrain or when the point lies in a culled
    /// region.
    pub fn find_leaf(&self, grid: IVec2) -> Option<NodeId> {
        if !self.node(self.root)?.footprint.contains(grid) {
            return None;
        }
        let mut id = self.root;
        loop {
            let node = self.node(id)?;
            if node.culled {
                return None;
            }
            match node.children {
                Some(children) => {
                    let half = node.footprint.size / 2;
                    let rel = grid - node.footprint.position;
                    let dx = usize::from(rel.x >= half);
                    let dy = usize::from(rel.y >= half);
                    id = children[dx + 2 * dy];
                }
                None => return node.patch.is_some().then_some(id),
            }
        }
    }

    /// Record the height range of a leaf's patch and tighten ancestor bounds.
    ///
    /// An ancestor adopts the union of its children's ranges once all four
    /// have reported, and keeps the theoretical range until then.
    pub fn report_heights(&mut self, id: NodeId, min: f32, max: f32) {
        let Some(footprint) = self.node(id).map(|n| n.footprint) else {
            return;
        };
        let bounds = self.bounds_for(&footprint, Some((min, max)));
        let mut current = match self.node_mut(id) {
            Some(node) => {
                node.reported = Some((min, max));
                node.bounds = bounds;
                node.parent
            }
            None => None,
        };

        while let Some(parent_id) = current {
            let Some(parent) = self.node(parent_id) else {
                break;
            };
            let Some(children) = parent.children else {
                break;
            };
            let (footprint, grandparent) = (parent.footprint, parent.parent);

            let mut range = Some((f32::INFINITY, f32::NEG_INFINITY));
            for child in children {
                match (range, self.node(child).and_then(|n| n.reported)) {
                    (Some((lo, hi)), Some((a, b))) => range = Some((lo.min(a), hi.max(b))),
                    _ => {
                        range = None;
                        break;
                    }
                }
            }

            let bounds = self.bounds_for(&footprint, range);
            if let Some(parent) = self.node_mut(parent_id) {
                parent.reported = range;
                parent.bounds = bounds;
            }
            current = grandparent;
        }
    }
}
