//! The mesh generator for one quadtree leaf.

use glam::{IVec2, Vec3};
use strata_field::SampleSource;

use crate::column::BoundaryColumn;
use crate::mesh::{ColliderMesh, PatchMesh, TerrainVertex};
use crate::normals::{accumulate_normals, estimate_normal};
use crate::side::{JointLevels, Side};
use crate::stitching;
use crate::vertex::Vertex;

/// Identifies a patch independently of where it is stored.
///
/// Ordered by level, then origin x, then origin y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatchKey {
    /// Quadtree level of the owning node.
    pub level: u32,
    /// Grid position of the patch's minimum corner.
    pub origin: IVec2,
}

impl Ord for PatchKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.level, self.origin.x, self.origin.y).cmp(&(other.level, other.origin.x, other.origin.y))
    }
}

impl PartialOrd for PatchKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Vertex grid, boundary columns and emitted mesh for one leaf footprint.
///
/// Topology is identical at every level: `n x n` vertices, `n - 2` squared
/// of them interior. Only the grid spacing differs.
pub struct Patch {
    key: PatchKey,
    spacing: i32,
    n: usize,
    area_weighted: bool,
    vertices: Vec<Vertex>,
    columns: [BoundaryColumn; 4],
    joints: Option<JointLevels>,
    mesh: Option<PatchMesh>,
    min_height: f32,
    max_height: f32,
    rebuilds: u32,
}

impl Patch {
    /// Create an empty patch. Vertices are sampled on the first rebuild.
    pub fn new(key: PatchKey, spacing: i32, vertices_per_side: usize, area_weighted: bool) -> Self {
        debug_assert!(vertices_per_side >= 3);
        let n = vertices_per_side;
        Self {
            key,
            spacing,
            n,
            area_weighted,
            vertices: Vec::new(),
            columns: Side::ALL.map(|side| BoundaryColumn::new(side, n)),
            joints: None,
            mesh: None,
            min_height: 0.0,
            max_height: 0.0,
            rebuilds: 0,
        }
    }

    /// Identity of this patch.
    pub fn key(&self) -> PatchKey {
        self.key
    }

    /// Quadtree level.
    pub fn level(&self) -> u32 {
        self.key.level
    }

    /// Grid units between adjacent vertices.
    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    /// Grid steps per side.
    pub fn span(&self) -> i32 {
        self.n as i32 - 1
    }

    /// Side length in grid units.
    pub fn size(&self) -> i32 {
        self.span() * self.spacing
    }

    /// Vertices per side.
    pub fn vertices_per_side(&self) -> usize {
        self.n
    }

    /// All vertices, row-major (`index = j * n + i`). Empty before the first rebuild.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Boundary column on one side.
    pub fn column(&self, side: Side) -> &BoundaryColumn {
        &self.columns[side.index()]
    }

    /// Joint levels used by the last rebuild.
    pub fn joints(&self) -> Option<JointLevels> {
        self.joints
    }

    /// The emitted mesh, once built.
    pub fn mesh(&self) -> Option<&PatchMesh> {
        self.mesh.as_ref()
    }

    /// How many times this patch has been rebuilt.
    pub fn rebuild_count(&self) -> u32 {
        self.rebuilds
    }

    /// Lowest and highest sampled height.
    pub fn height_range(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    /// Collision geometry for the current mesh.
    pub fn collider_mesh(&self) -> Option<ColliderMesh> {
        self.mesh.as_ref().map(ColliderMesh::from)
    }

    /// Patch-local lattice coordinate of a vertex index.
    pub fn local(&self, index: usize) -> IVec2 {
        IVec2::new((index % self.n) as i32, (index / self.n) as i32)
    }

    fn index(&self, local: IVec2) -> usize {
        local.y as usize * self.n + local.x as usize
    }

    /// Vertex index of a terrain grid position, if this patch has a vertex there.
    pub fn index_at(&self, grid: IVec2) -> Option<usize> {
        let rel = grid - self.key.origin;
        let size = self.size();
        if rel.x < 0 || rel.y < 0 || rel.x > size || rel.y > size {
            return None;
        }
        if rel.x % self.spacing != 0 || rel.y % self.spacing != 0 {
            return None;
        }
        Some(self.index(rel / self.spacing))
    }

    /// The vertex at a terrain grid position, if this patch has one there.
    pub fn vertex_at(&self, grid: IVec2) -> Option<&Vertex> {
        self.index_at(grid).and_then(|i| self.vertices.get(i))
    }

    /// Indices of vertices on the patch border, each listed once.
    pub fn boundary_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let span = self.span();
        (0..self.n * self.n).filter(move |&i| {
            let p = IVec2::new((i % self.n) as i32, (i / self.n) as i32);
            p.x == 0 || p.y == 0 || p.x == span || p.y == span
        })
    }

    /// Sides a vertex index lies on (two for corners, none for interior).
    pub fn sides_of(&self, index: usize) -> impl Iterator<Item = Side> {
        let local = self.local(index);
        let span = self.span();
        Side::ALL
            .into_iter()
            .filter(move |side| side.contains(local, span))
    }

    /// Positions of the four lattice neighbors `[+X, +Y, -X, -Y]` held by this patch.
    pub fn quad_corners(&self, index: usize) -> [Option<Vec3>; 4] {
        let local = self.local(index);
        let span = self.span();
        [IVec2::X, IVec2::Y, IVec2::NEG_X, IVec2::NEG_Y].map(|d| {
            let p = local + d;
            let inside = p.x >= 0 && p.y >= 0 && p.x <= span && p.y <= span;
            inside.then(|| self.vertices[self.index(p)].position())
        })
    }

    /// Rebuild if the mesh is missing or the joint levels changed.
    ///
    /// Returns `true` when a rebuild happened.
    pub fn update<S: SampleSource + ?Sized>(&mut self, joints: JointLevels, source: &mut S) -> bool {
        if self.mesh.is_some() && self.joints == Some(joints) {
            return false;
        }
        self.rebuild(joints, source);
        true
    }

    /// Unconditionally rebuild vertices validity, triangles, normals and buffers.
    pub fn rebuild<S: SampleSource + ?Sized>(&mut self, joints: JointLevels, source: &mut S) {
        if self.vertices.is_empty() {
            self.sample_vertices(source);
        }
        self.elide(&joints);
        let triangles = self.triangulate();
        self.compute_local_normals(&triangles);
        self.mesh = Some(self.build_mesh(&triangles));
        self.joints = Some(joints);
        self.rebuilds += 1;
        tracing::trace!(
            level = self.key.level,
            x = self.key.origin.x,
            y = self.key.origin.y,
            ?joints,
            rebuilds = self.rebuilds,
            "patch rebuilt"
        );
    }

    fn sample_vertices<S: SampleSource + ?Sized>(&mut self, source: &mut S) {
        let mut vertices = Vec::with_capacity(self.n * self.n);
        let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
        for j in 0..self.n as i32 {
            for i in 0..self.n as i32 {
                let grid = self.key.origin + IVec2::new(i, j) * self.spacing;
                let sample = source.sample(grid);
                min = min.min(sample.height);
                max = max.max(sample.height);
                vertices.push(Vertex::new(sample, grid));
            }
        }
        self.vertices = vertices;
        self.min_height = min;
        self.max_height = max;
    }

    /// Mark external vertices a coarser neighbor cannot match as invalid.
    pub fn elide(&mut self, joints: &JointLevels) {
        for vertex in &mut self.vertices {
            vertex.valid = true;
        }
        for column in &self.columns {
            let joint = joints.get(column.side());
            if joint == 0 {
                continue;
            }
            for (k, &index) in column.external().iter().enumerate() {
                if !stitching::keeps_vertex(k, joint) {
                    self.vertices[index].valid = false;
                }
            }
        }
    }

    /// Triangles over valid vertices, counter-clockwise seen from +Z.
    fn triangulate(&self) -> Vec<[usize; 3]> {
        let span = self.span();
        let mut triangles = Vec::with_capacity((span * span * 2) as usize);

        // Interior grid: two triangles per cell.
        for j in 1..span - 1 {
            for i in 1..span - 1 {
                let v00 = self.index(IVec2::new(i, j));
                let v10 = self.index(IVec2::new(i + 1, j));
                let v01 = self.index(IVec2::new(i, j + 1));
                let v11 = self.index(IVec2::new(i + 1, j + 1));
                triangles.push([v00, v10, v11]);
                triangles.push([v00, v11, v01]);
            }
        }

        // Boundary strips, one per side, meeting on the corner diagonals.
        for column in &self.columns {
            let outer: Vec<(i32, usize)> = column
                .valid_external(&self.vertices)
                .map(|(k, index)| (k as i32, index))
                .collect();
            let inner: Vec<(i32, usize)> = column
                .internal()
                .iter()
                .enumerate()
                .map(|(m, &index)| (m as i32 + 1, index))
                .collect();
            stitching::zip_strip(&outer, &inner, &mut triangles);
        }

        for triangle in &mut triangles {
            if self.signed_area(triangle) < 0 {
                triangle.swap(1, 2);
            }
        }
        triangles
    }

    fn signed_area(&self, &[a, b, c]: &[usize; 3]) -> i64 {
        let (a, b, c) = (self.local(a), self.local(b), self.local(c));
        let ab = (b - a).as_i64vec2();
        let ac = (c - a).as_i64vec2();
        ab.x * ac.y - ab.y * ac.x
    }

    fn compute_local_normals(&mut self, triangles: &[[usize; 3]]) {
        let positions: Vec<Vec3> = self.vertices.iter().map(Vertex::position).collect();
        let normals = accumulate_normals(&positions, triangles, self.area_weighted);
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.local_normal = normal;
            vertex.normal = normal;
        }
    }

    fn build_mesh(&mut self, triangles: &[[usize; 3]]) -> PatchMesh {
        let span = self.span() as f32;
        let n = self.n;
        let mut mesh = PatchMesh::default();
        for (index, vertex) in self.vertices.iter_mut().enumerate() {
            if !vertex.valid {
                vertex.mesh_index = None;
                continue;
            }
            vertex.mesh_index = Some(mesh.vertices.len() as u32);
            let (i, j) = (index % n, index / n);
            mesh.vertices.push(TerrainVertex {
                position: vertex.position().to_array(),
                normal: vertex.normal.to_array(),
                uv: [i as f32 / span, j as f32 / span],
                color: vertex.sample.color.to_array(),
            });
        }
        for triangle in triangles {
            let mapped = triangle.map(|index| self.vertices[index].mesh_index);
            if let [Some(a), Some(b), Some(c)] = mapped {
                mesh.indices.extend_from_slice(&[a, b, c]);
            }
        }
        mesh
    }

    /// Assign the final normal of a vertex, in both the record and the mesh.
    pub fn set_normal(&mut self, index: usize, normal: Vec3) {
        let Some(vertex) = self.vertices.get_mut(index) else {
            return;
        };
        vertex.normal = normal;
        if let (Some(mesh_index), Some(mesh)) = (vertex.mesh_index, self.mesh.as_mut()) {
            mesh.vertices[mesh_index as usize].normal = normal.to_array();
        }
    }

    /// The reduced-corner normal estimate for a vertex, using this patch's lattice.
    pub fn estimated_normal(&self, index: usize) -> Vec3 {
        estimate_normal(self.vertices[index].position(), self.quad_corners(index))
    }
}
