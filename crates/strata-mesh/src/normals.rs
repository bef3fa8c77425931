//! Vertex normal accumulation and the reduced-corner normal estimate.

use glam::Vec3;

/// Accumulate face normals of `triangles` into per-vertex unit normals.
///
/// With `area_weighted`, larger triangles contribute proportionally more.
/// Vertices touched by no triangle, or whose contributions cancel, get `+Z`.
pub fn accumulate_normals(
    positions: &[Vec3],
    triangles: &[[usize; 3]],
    area_weighted: bool,
) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    for &[a, b, c] in triangles {
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        let face = if area_weighted {
            face
        } else {
            face.normalize_or_zero()
        };
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    sums.into_iter().map(|n| n.normalize_or(Vec3::Z)).collect()
}

/// Estimate a normal from the four lattice neighbors of `center`.
///
/// `corners` are ordered `[+X, +Y, -X, -Y]`. With all four present the
/// quad's diagonals are crossed. With two or three present, missing ones
/// are replaced by the center and the surrounding triangle normals are
/// summed. Fewer than two, or a degenerate result, gives `+Z`.
pub fn estimate_normal(center: Vec3, corners: [Option<Vec3>; 4]) -> Vec3 {
    let available = corners.iter().filter(|c| c.is_some()).count();
    let normal = match corners {
        [Some(px), Some(py), Some(nx), Some(ny)] => (px - nx).cross(py - ny),
        _ if available >= 2 => {
            let arms = corners.map(|c| c.unwrap_or(center) - center);
            (0..4).map(|i| arms[i].cross(arms[(i + 1) % 4])).sum()
        }
        _ => return Vec3::Z,
    };
    facing_up(normal)
}

fn facing_up(normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        Vec3::Z
    } else if n.z < 0.0 {
        -n
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    /// A flat quad yields +Z regardless of weighting.
    #[test]
    fn test_flat_quad_normals() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let tris = [[0, 1, 2], [0, 2, 3]];
        for weighted in [true, false] {
            for n in accumulate_normals(&positions, &tris, weighted) {
                assert!(approx(n, Vec3::Z));
            }
        }
    }

    /// Area weighting biases toward the larger face.
    #[test]
    fn test_area_weighting() {
        // Two triangles sharing vertex 0: a large one tilted toward +X, a small flat one.
        let positions = [
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 4.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(-0.1, 0.0, 0.0),
            Vec3::new(0.0, -0.1, 0.0),
        ];
        let tris = [[0, 1, 2], [0, 3, 4]];
        let weighted = accumulate_normals(&positions, &tris, true)[0];
        let plain = accumulate_normals(&positions, &tris, false)[0];
        assert!(weighted.x.abs() > plain.x.abs());
    }

    #[test]
    fn test_untouched_vertex_is_up() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::splat(5.0)];
        let normals = accumulate_normals(&positions, &[[0, 1, 2]], true);
        assert_eq!(normals[3], Vec3::Z);
    }

    /// Four corners on a slope give the slope normal.
    #[test]
    fn test_estimate_with_four_corners() {
        let h = |x: f32, _y: f32| x * 0.5;
        let c = Vec3::new(0.0, 0.0, h(0.0, 0.0));
        let corners = [
            Some(Vec3::new(1.0, 0.0, h(1.0, 0.0))),
            Some(Vec3::new(0.0, 1.0, h(0.0, 1.0))),
            Some(Vec3::new(-1.0, 0.0, h(-1.0, 0.0))),
            Some(Vec3::new(0.0, -1.0, h(0.0, -1.0))),
        ];
        let expected = Vec3::new(-0.5, 0.0, 1.0).normalize();
        assert!(approx(estimate_normal(c, corners), expected));
    }

    /// Three corners still give the plane normal on a planar slope.
    #[test]
    fn test_estimate_with_three_corners() {
        let c = Vec3::ZERO;
        let corners = [
            Some(Vec3::new(1.0, 0.0, 0.5)),
            Some(Vec3::new(0.0, 1.0, 0.0)),
            None,
            Some(Vec3::new(0.0, -1.0, 0.0)),
        ];
        let expected = Vec3::new(-0.5, 0.0, 1.0).normalize();
        assert!(approx(estimate_normal(c, corners), expected));
    }

    /// Two adjacent corners form one triangle.
    #[test]
    fn test_estimate_with_two_adjacent_corners() {
        let corners = [Some(Vec3::X), Some(Vec3::Y), None, None];
        assert!(approx(estimate_normal(Vec3::ZERO, corners), Vec3::Z));
    }

    /// Two opposite corners are degenerate and fall back to +Z.
    #[test]
    fn test_estimate_with_opposite_corners_is_flat() {
        let corners = [Some(Vec3::new(1.0, 0.0, 3.0)), None, Some(Vec3::new(-1.0, 0.0, -3.0)), None];
        assert_eq!(estimate_normal(Vec3::ZERO, corners), Vec3::Z);
    }

    /// Fewer than two corners falls back to +Z.
    #[test]
    fn test_estimate_with_one_corner_is_flat() {
        let corners = [Some(Vec3::new(1.0, 0.0, 9.0)), None, None, None];
        assert_eq!(estimate_normal(Vec3::new(0.0, 0.0, 2.0), corners), Vec3::Z);
    }
}
