//! Triangle and dihedral primitives shared by the mesh metrics, the cell
//! view and the membrane force laws.
//!
//! Orientation convention: triangles are wound counter-clockwise seen from
//! outside, so `(x2 − x1) × (x3 − x1)` points outward and the signed
//! tetrahedron volume `x1 · (x2 × x3) / 6` sums to the enclosed volume.

use glam::DVec3;

/// Area-weighted normal, `(x2 − x1) × (x3 − x1)` (length is twice the area)
#[inline]
pub fn area_normal(x1: DVec3, x2: DVec3, x3: DVec3) -> DVec3 {
    (x2 - x1).cross(x3 - x1)
}

/// Triangle area
#[inline]
pub fn triangle_area(x1: DVec3, x2: DVec3, x3: DVec3) -> f64 {
    0.5 * area_normal(x1, x2, x3).length()
}

/// Unit outward normal, zero for a collapsed triangle
#[inline]
pub fn triangle_normal(x1: DVec3, x2: DVec3, x3: DVec3) -> DVec3 {
    area_normal(x1, x2, x3).normalize_or_zero()
}

/// Signed volume of the tetrahedron spanned by the triangle and the origin
#[inline]
pub fn signed_volume(x1: DVec3, x2: DVec3, x3: DVec3) -> f64 {
    x1.dot(x2.cross(x3)) / 6.0
}

/// Gradient of the triangle area with respect to each corner
///
/// ∂A/∂x1 = ½ n̂ × (x3 − x2), cyclic in (1, 2, 3).
pub fn area_gradient(x1: DVec3, x2: DVec3, x3: DVec3) -> [DVec3; 3] {
    let n = triangle_normal(x1, x2, x3);
    [
        0.5 * n.cross(x3 - x2),
        0.5 * n.cross(x1 - x3),
        0.5 * n.cross(x2 - x1),
    ]
}

/// Gradient of the signed tetrahedron volume with respect to each corner
///
/// ∂V/∂x1 = (x2 × x3) / 6, cyclic in (1, 2, 3).
pub fn volume_gradient(x1: DVec3, x2: DVec3, x3: DVec3) -> [DVec3; 3] {
    [x2.cross(x3) / 6.0, x3.cross(x1) / 6.0, x1.cross(x2) / 6.0]
}

/// Signed dihedral angle across edge (a, b)
///
/// `k` is the opposite vertex of the triangle traversing a→b, `l` the one of
/// the triangle traversing b→a. The angle is between the two outward normals:
/// zero for a flat hinge, positive where the surface is convex.
pub fn dihedral_angle(a: DVec3, b: DVec3, k: DVec3, l: DVec3) -> f64 {
    let e = (b - a).normalize_or_zero();
    let n1 = (b - a).cross(k - a);
    let n2 = (a - b).cross(l - b);
    n1.cross(n2).dot(e).atan2(n1.dot(n2))
}

/// Gradient of [`dihedral_angle`] with respect to (a, b, k, l)
///
/// Returns `None` for a hinge with a collapsed triangle.
///
/// Reference: Bridson, Marino & Fedkiw, "Simulation of clothing with folds
/// and wrinkles", SCA 2003.
pub fn dihedral_gradient(a: DVec3, b: DVec3, k: DVec3, l: DVec3) -> Option<[DVec3; 4]> {
    let edge = b - a;
    let edge_length = edge.length();
    let n1 = edge.cross(k - a);
    let n2 = (a - b).cross(l - b);
    let n1_sq = n1.length_squared();
    let n2_sq = n2.length_squared();
    if edge_length <= f64::EPSILON || n1_sq <= f64::EPSILON || n2_sq <= f64::EPSILON {
        return None;
    }

    let grad_k = -edge_length * n1 / n1_sq;
    let grad_l = -edge_length * n2 / n2_sq;

    // Projection of the opposite vertices onto the hinge, as a fraction of its length
    let t_k = (k - a).dot(edge) / (edge_length * edge_length);
    let t_l = (l - a).dot(edge) / (edge_length * edge_length);

    let grad_a = -(1.0 - t_k) * grad_k - (1.0 - t_l) * grad_l;
    let grad_b = -t_k * grad_k - t_l * grad_l;

    Some([grad_a, grad_b, grad_k, grad_l])
}
