//! GPU-ready and collider-ready mesh buffers emitted by a patch.

use glam::Vec3;

/// Interleaved vertex uploaded to the renderer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// World position (Z up).
    pub position: [f32; 3],
    /// Unit normal.
    pub normal: [f32; 3],
    /// Patch-local texture coordinates in `[0, 1]`.
    pub uv: [f32; 2],
    /// Linear RGB color.
    pub color: [f32; 3],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 44]);

/// Triangle-list mesh for one patch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchMesh {
    /// Vertex buffer.
    pub vertices: Vec<TerrainVertex>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
}

impl PatchMesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Static collision geometry for one patch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColliderMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangles indexing `positions`.
    pub triangles: Vec<[u32; 3]>,
}

impl From<&PatchMesh> for ColliderMesh {
    fn from(mesh: &PatchMesh) -> Self {
        Self {
            positions: mesh
                .vertices
                .iter()
                .map(|v| Vec3::from_array(v.position))
                .collect(),
            triangles: mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn test_vertex_bytes_length() {
        let mesh = PatchMesh {
            vertices: vec![TerrainVertex::zeroed(); 3],
            indices: vec![0, 1, 2],
        };
        assert_eq!(mesh.vertex_bytes().len(), 3 * 44);
        assert_eq!(mesh.index_bytes().len(), 12);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_collider_from_mesh() {
        let mut v = TerrainVertex::zeroed();
        v.position = [1.0, 2.0, 3.0];
        let mesh = PatchMesh {
            vertices: vec![v; 3],
            indices: vec![0, 2, 1],
        };
        let collider = ColliderMesh::from(&mesh);
        assert_eq!(collider.positions[0], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(collider.triangles, vec![[0, 2, 1]]);
    }
}
