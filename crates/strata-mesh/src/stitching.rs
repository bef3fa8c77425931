//! Seam elision and boundary-strip triangulation.
//!
//! A patch whose neighbor is `J` levels coarser keeps only every `2^J`-th
//! external vertex on that side, so its boundary carries exactly the
//! neighbor's vertices. The strip between the (possibly thinned) external
//! row and the full internal row is then zipped into triangles: fans where
//! vertices were elided, regular quads where none were.

/// Deepest joint level the elision pattern can represent.
pub const MAX_JOINT_LEVEL: u32 = 2;

/// Whether external vertex `k` survives against a neighbor `joint` levels coarser.
pub fn keeps_vertex(k: usize, joint: u32) -> bool {
    joint == 0 || k % (1usize << joint) == 0
}

/// Whether a joint level can be stitched on a patch with `span` grid steps per side.
pub fn is_representable(joint: u32, span: i32) -> bool {
    joint <= MAX_JOINT_LEVEL && (1i32 << joint) <= span
}

/// Triangulate the strip between two parallel vertex chains.
///
/// `outer` and `inner` are `(coordinate along the side, vertex index)` pairs
/// in increasing coordinate order. The first and last outer entries are the
/// patch corners; the inner chain is the row one step inward. Every step
/// advances whichever chain has the nearer next vertex, so the emitted
/// triangles tile the strip without overlap. Winding is left to the caller.
pub fn zip_strip(outer: &[(i32, usize)], inner: &[(i32, usize)], out: &mut Vec<[usize; 3]>) {
    if outer.is_empty() || inner.is_empty() {
        return;
    }
    let (mut a, mut b) = (0, 0);
    while a + 1 < outer.len() || b + 1 < inner.len() {
        let advance_outer = if a + 1 >= outer.len() {
            false
        } else if b + 1 >= inner.len() {
            true
        } else {
            outer[a + 1].0 <= inner[b + 1].0
        };

        if advance_outer {
            out.push([outer[a].1, inner[b].1, outer[a + 1].1]);
            a += 1;
        } else {
            out.push([outer[a].1, inner[b].1, inner[b + 1].1]);
            b += 1;
        }
    }
}
