//! Reference surfaces for diagnostics and tests.
//!
//! Production meshes come from the mesh-loading collaborator through
//! [`ReferenceMesh::new`]; these builders cover the spherical and biconcave
//! shapes the diagnostics need.

use std::collections::HashMap;

use glam::DVec3;

use super::{FungTong, ReferenceMesh};
use crate::error::Result;

/// Regular icosahedron of unit circumradius, outward counter-clockwise faces
fn icosahedron() -> (Vec<DVec3>, Vec<[usize; 3]>) {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let vertices = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| DVec3::new(x, y, z).normalize())
    .collect();

    let triangles = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (vertices, triangles)
}

/// Unit sphere triangulated by repeated midpoint subdivision of an icosahedron
///
/// Level n has 10·4ⁿ + 2 vertices; level 3 gives the 642-vertex RBC resolution.
fn unit_icosphere(subdivisions: u32) -> (Vec<DVec3>, Vec<[usize; 3]>) {
    let (mut vertices, mut triangles) = icosahedron();

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut refined = Vec::with_capacity(triangles.len() * 4);

        let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<DVec3>| -> usize {
            *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
                vertices.push(((vertices[a] + vertices[b]) * 0.5).normalize());
                vertices.len() - 1
            })
        };

        for &[i, j, k] in &triangles {
            let ij = midpoint(i, j, &mut vertices);
            let jk = midpoint(j, k, &mut vertices);
            let ki = midpoint(k, i, &mut vertices);
            refined.push([i, ij, ki]);
            refined.push([j, jk, ij]);
            refined.push([k, ki, jk]);
            refined.push([ij, jk, ki]);
        }
        triangles = refined;
    }

    (vertices, triangles)
}

/// Sphere of the given radius centred on the origin
pub fn icosphere(subdivisions: u32, radius: f64) -> Result<ReferenceMesh> {
    let (vertices, triangles) = unit_icosphere(subdivisions);
    ReferenceMesh::new(vertices.into_iter().map(|v| v * radius).collect(), triangles)
}

/// Biconcave red blood cell of the given rim radius centred on the origin
pub fn red_blood_cell(subdivisions: u32, radius: f64) -> Result<ReferenceMesh> {
    let profile = FungTong::with_radius(radius);
    let (vertices, triangles) = unit_icosphere(subdivisions);
    ReferenceMesh::new(
        vertices.into_iter().map(|v| profile.map_unit_sphere(v)).collect(),
        triangles,
    )
}

/// Translate a mesh so its vertices can seed a cell at `center`
pub fn positions_at(mesh: &ReferenceMesh, center: DVec3) -> Vec<DVec3> {
    mesh.vertices().iter().map(|&v| v + center).collect()
}
