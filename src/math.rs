use glam::{Mat3, Vec3};

/// Unit normal of the plane through `p1`, `p2`, `p3` with CCW winding, or
/// zero if the points are colinear.
pub(crate) fn plane_norm(p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    (p2 - p1).cross(p3 - p2).normalize_or_zero()
}

/// Orthonormal in-plane basis `(x, y)` for a unit normal, picked stably: the
/// seed vector swaps the largest and smallest components of the normal with
/// flipped signs, so nearby normals get nearby bases.
pub(crate) fn basis_vectors(norm: Vec3) -> (Vec3, Vec3) {
    let mut yy = norm;
    let (mut min, mut max) = (0usize, 0usize);
    let mut min_val = norm.x.abs();
    let mut max_val = min_val;
    let abs_y = norm.y.abs();
    if abs_y < min_val {
        min = 1;
        min_val = abs_y;
    }
    if abs_y >= max_val {
        max = 1;
        max_val = abs_y;
    }
    let abs_z = norm.z.abs();
    if abs_z < min_val {
        min = 2;
    }
    if abs_z >= max_val {
        max = 2;
    }
    if max == min {
        min = (max + 1) % 3;
    }
    yy[min] = norm[max].copysign(-norm[min]);
    yy[max] = norm[min].copysign(-norm[max]);
    let x = yy.cross(norm).normalize_or_zero();
    let y = norm.cross(x).normalize_or_zero();
    (x, y)
}

/// Solve `m * x = b` for a symmetric-or-not 3x3 system. `None` when the
/// matrix is singular.
pub(crate) fn solve3x3(m: Mat3, b: Vec3) -> Option<Vec3> {
    let det = m.determinant();
    if det == 0.0 {
        return None;
    }
    Some(m.inverse() * b)
}
