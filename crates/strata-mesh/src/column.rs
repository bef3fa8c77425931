//! Boundary columns: the external row on one side plus the row just inside it.

use crate::side::Side;
use crate::vertex::Vertex;

/// Vertex indices along one patch side.
///
/// `external` holds the `N` vertices on the side itself, corners included,
/// ordered by increasing coordinate along the side. `internal` holds the
/// `N - 2` vertices one step inward, aligned with `external[1..N-1]`.
#[derive(Clone, Debug)]
pub struct BoundaryColumn {
    side: Side,
    external: Vec<usize>,
    internal: Vec<usize>,
}

impl BoundaryColumn {
    /// Build the column for `side` of an `n x n` grid stored row-major.
    pub fn new(side: Side, n: usize) -> Self {
        let span = n as i32 - 1;
        let index = |p: glam::IVec2| (p.y * n as i32 + p.x) as usize;
        let external = (0..=span).map(|k| index(side.external(k, span))).collect();
        let internal = (1..span).map(|k| index(side.internal(k, span))).collect();
        Self {
            side,
            external,
            internal,
        }
    }

    /// Which side this column runs along.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Indices of the vertices on the side, corners included.
    pub fn external(&self) -> &[usize] {
        &self.external
    }

    /// Indices of the vertices one step inward.
    pub fn internal(&self) -> &[usize] {
        &self.internal
    }

    /// `(k, index)` of every external vertex that is still valid.
    pub fn valid_external<'a>(
        &'a self,
        vertices: &'a [Vertex],
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.external
            .iter()
            .copied()
            .enumerate()
            .filter(move |&(_, i)| vertices[i].valid)
    }
}
