//! Cross-patch queries: joint levels and seam normals.
//!
//! Both run against an immutable tree and return plans that the manager
//! applies afterwards, so no patch is mutated while its neighbors are read.

use glam::{IVec2, Vec3};
use rustc_hash::FxHashMap;
use strata_lod::{NodeId, QuadTree};
use strata_mesh::stitching;
use strata_mesh::{JointLevels, Patch, PatchKey, Side};

/// Joint levels for one patch, plus the sides that had to be left unstitched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct JointPlan {
    pub joints: JointLevels,
    pub drift: [bool; 4],
}

impl JointPlan {
    pub fn has_drift(&self) -> bool {
        self.drift.iter().any(|&d| d)
    }
}

/// Grid point just outside the middle of each side, in [`Side::ALL`] order.
pub(crate) fn probe_points(origin: IVec2, size: i32) -> [IVec2; 4] {
    let half = size / 2;
    Side::ALL.map(|side| match side {
        Side::Left => IVec2::new(origin.x - 1, origin.y + half),
        Side::Right => IVec2::new(origin.x + size, origin.y + half),
        Side::Front => IVec2::new(origin.x + half, origin.y - 1),
        Side::Back => IVec2::new(origin.x + half, origin.y + size),
    })
}

/// Find the neighbor across each side and derive the joint levels.
///
/// Missing neighbors (terrain edge or culled) and same-level or finer
/// neighbors give 0. Level gaps the stitching cannot represent are reported
/// as drift and stitched as 0 for this frame.
pub(crate) fn plan_joints(tree: &QuadTree<Patch>, id: NodeId) -> Option<JointPlan> {
    let node = tree.node(id)?;
    let patch = node.patch()?;
    let level = node.level();
    let mut plan = JointPlan::default();

    for (side, probe) in Side::ALL.into_iter().zip(probe_points(node.position(), node.size())) {
        let Some(neighbor) = tree.find_leaf(probe).and_then(|n| tree.node(n)) else {
            continue;
        };
        let Some(joint) = level.checked_sub(neighbor.level()).filter(|&j| j > 0) else {
            continue;
        };
        if stitching::is_representable(joint, patch.span()) {
            plan.joints.set(side, joint);
        } else {
            tracing::warn!(
                level,
                neighbor = neighbor.level(),
                ?side,
                x = node.position().x,
                y = node.position().y,
                "joint level drift, seam left unstitched this frame"
            );
            plan.drift[side.index()] = true;
        }
    }
    Some(plan)
}

/// Normal assignments computed by the seam pass.
#[derive(Debug, Default)]
pub(crate) struct SeamPlan {
    pub updates: Vec<(NodeId, usize, Vec3)>,
    pub shared: usize,
    pub estimated: usize,
}

/// Offsets of the four unit cells around a grid point.
const CELL_PROBES: [IVec2; 4] = [
    IVec2::new(0, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
    IVec2::new(-1, -1),
];

/// Leaves whose closed footprint contains `grid`.
fn leaves_touching(tree: &QuadTree<Patch>, grid: IVec2) -> Vec<NodeId> {
    let mut found: Vec<NodeId> = Vec::with_capacity(4);
    for offset in CELL_PROBES {
        if let Some(id) = tree.find_leaf(grid + offset)
            && !found.contains(&id)
        {
            found.push(id);
        }
    }
    found
}

/// One valid copy of a lattice point.
#[derive(Clone, Copy, Debug)]
struct PointCopy {
    key: PatchKey,
    node: NodeId,
    index: usize,
    local_normal: Vec3,
    drifting: bool,
}

/// Valid copies of `grid` across all leaves, sorted by [`PatchKey`].
fn copies_at(
    tree: &QuadTree<Patch>,
    drift: &FxHashMap<NodeId, [bool; 4]>,
    grid: IVec2,
    out: &mut Vec<PointCopy>,
) {
    out.clear();
    for node in leaves_touching(tree, grid) {
        let Some(patch) = tree.patch(node) else {
            continue;
        };
        let Some(index) = patch.index_at(grid) else {
            continue;
        };
        let vertex = &patch.vertices()[index];
        if !vertex.valid {
            continue;
        }
        let drifting = drift
            .get(&node)
            .is_some_and(|sides| patch.sides_of(index).any(|side| sides[side.index()]));
        out.push(PointCopy {
            key: patch.key(),
            node,
            index,
            local_normal: vertex.local_normal,
            drifting,
        });
    }
    out.sort_by_key(|copy| copy.key);
}

/// Final normal for a lattice point and whether it came from averaging.
fn resolve_point(tree: &QuadTree<Patch>, copies: &[PointCopy]) -> Option<(Vec3, bool)> {
    let first = copies.first()?;
    if copies.len() < 2 || copies.iter().any(|c| c.drifting) {
        let estimate = tree.patch(first.node)?.estimated_normal(first.index);
        return Some((estimate, false));
    }
    let normal = copies
        .iter()
        .fold(Vec3::ZERO, |sum, c| sum + c.local_normal.normalize_or(Vec3::Z))
        .normalize_or(Vec3::Z);
    Some((normal, true))
}

/// Compute final normals for every valid boundary vertex of every leaf.
///
/// Each lattice point is resolved once and the result is written to every
/// copy. Points held by several patches get the normalized sum of the local
/// normals, summed in [`PatchKey`] order. Points held by one patch, or
/// touching a drifting side of any holder, get the corner estimate of the
/// lowest-keyed holder.
pub(crate) fn plan_seam_normals(
    tree: &QuadTree<Patch>,
    drift: &FxHashMap<NodeId, [bool; 4]>,
) -> SeamPlan {
    let mut plan = SeamPlan::default();
    let mut resolved: FxHashMap<IVec2, Option<(Vec3, bool)>> = FxHashMap::default();
    let mut copies: Vec<PointCopy> = Vec::with_capacity(4);

    for (id, node) in tree.leaves() {
        let Some(patch) = node.patch() else {
            continue;
        };
        for index in patch.boundary_indices() {
            let vertex = &patch.vertices()[index];
            if !vertex.valid {
                continue;
            }
            let point = *resolved.entry(vertex.grid_pos).or_insert_with(|| {
                copies_at(tree, drift, vertex.grid_pos, &mut copies);
                resolve_point(tree, &copies)
            });
            let Some((normal, shared)) = point else {
                continue;
            };
            if shared {
                plan.shared += 1;
            } else {
                plan.estimated += 1;
            }
            plan.updates.push((id, index, normal));
        }
    }
    plan
}
