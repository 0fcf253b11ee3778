//! Reference triangulated surface shared by all cells of a species.
//!
//! The mesh stores vertices, counter-clockwise triangles and undirected edges
//! linked to their two adjacent triangles. Each edge keeps the direction in
//! which its first triangle traverses it, so the opposite vertices `k` (of the
//! a→b triangle) and `l` (of the b→a triangle) define a consistently signed
//! dihedral angle.

use std::collections::HashMap;

use glam::DVec3;

use super::primitives;
use crate::error::{FicsionError, Result};

/// An undirected mesh edge with its adjacent triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshEdge {
    /// First vertex; the first triangle traverses a→b
    pub a: usize,
    /// Second vertex
    pub b: usize,
    /// Triangles traversing a→b and b→a
    pub triangles: [Option<usize>; 2],
    /// Vertex opposite the edge in each of those triangles
    pub opposite: [Option<usize>; 2],
}

impl MeshEdge {
    /// Both adjacent triangles are present
    pub fn is_interior(&self) -> bool {
        self.opposite[0].is_some() && self.opposite[1].is_some()
    }
}

/// Immutable triangulated surface topology with reference positions
#[derive(Debug, Clone)]
pub struct ReferenceMesh {
    vertices: Vec<DVec3>,
    triangles: Vec<[usize; 3]>,
    edges: Vec<MeshEdge>,
    edge_lookup: HashMap<(usize, usize), usize>,
    /// Triangles whose first corner is the vertex
    owned_triangles: Vec<Vec<usize>>,
    /// Edges whose `a` end is the vertex
    owned_edges: Vec<Vec<usize>>,
}

impl ReferenceMesh {
    /// Build the edge structure from vertices and counter-clockwise triangles
    pub fn new(vertices: Vec<DVec3>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if vertices.is_empty() || triangles.is_empty() {
            return Err(FicsionError::DegenerateMesh {
                reason: format!(
                    "{} vertices and {} triangles",
                    vertices.len(),
                    triangles.len()
                ),
            });
        }

        let mut edges: Vec<MeshEdge> = Vec::with_capacity(triangles.len() * 3 / 2);
        let mut edge_lookup = HashMap::with_capacity(triangles.len() * 3 / 2);
        let mut owned_triangles = vec![Vec::new(); vertices.len()];

        for (t, tri) in triangles.iter().enumerate() {
            if tri.iter().any(|&v| v >= vertices.len()) {
                return Err(FicsionError::DegenerateMesh {
                    reason: format!("triangle {} references a missing vertex: {:?}", t, tri),
                });
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
                return Err(FicsionError::DegenerateMesh {
                    reason: format!("triangle {} repeats a vertex: {:?}", t, tri),
                });
            }
            owned_triangles[tri[0]].push(t);

            for corner in 0..3 {
                let from = tri[corner];
                let to = tri[(corner + 1) % 3];
                let opposite = tri[(corner + 2) % 3];
                let key = (from.min(to), from.max(to));

                match edge_lookup.get(&key) {
                    None => {
                        edge_lookup.insert(key, edges.len());
                        edges.push(MeshEdge {
                            a: from,
                            b: to,
                            triangles: [Some(t), None],
                            opposite: [Some(opposite), None],
                        });
                    }
                    Some(&index) => {
                        let edge = &mut edges[index];
                        // Second triangle must traverse the edge the other way
                        if edge.a != to || edge.triangles[1].is_some() {
                            return Err(FicsionError::NonManifoldEdge {
                                a: from,
                                b: to,
                                triangle: t,
                            });
                        }
                        edge.triangles[1] = Some(t);
                        edge.opposite[1] = Some(opposite);
                    }
                }
            }
        }

        let mut owned_edges = vec![Vec::new(); vertices.len()];
        for (index, edge) in edges.iter().enumerate() {
            owned_edges[edge.a].push(index);
        }

        Ok(Self {
            vertices,
            triangles,
            edges,
            edge_lookup,
            owned_triangles,
            owned_edges,
        })
    }

    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn edges(&self) -> &[MeshEdge] {
        &self.edges
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Index of the edge joining two vertices, in either order
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&(a.min(b), a.max(b))).copied()
    }

    /// Triangles attributed to a vertex for partitioned reductions
    pub fn triangles_owned_by(&self, vertex: usize) -> &[usize] {
        &self.owned_triangles[vertex]
    }

    /// Edges attributed to a vertex for partitioned reductions
    pub fn edges_owned_by(&self, vertex: usize) -> &[usize] {
        &self.owned_edges[vertex]
    }

    /// Every edge has two adjacent triangles
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(MeshEdge::is_interior)
    }

    /// Reference dihedral angle across an interior edge
    pub fn reference_angle(&self, edge: usize) -> Option<f64> {
        let e = &self.edges[edge];
        let (k, l) = (e.opposite[0]?, e.opposite[1]?);
        let v = &self.vertices;
        Some(primitives::dihedral_angle(v[e.a], v[e.b], v[k], v[l]))
    }

    /// Reference length of an edge
    pub fn reference_length(&self, edge: usize) -> f64 {
        let e = &self.edges[edge];
        self.vertices[e.a].distance(self.vertices[e.b])
    }

    /// Reference area of a triangle
    pub fn reference_area(&self, triangle: usize) -> f64 {
        let [i, j, k] = self.triangles[triangle];
        primitives::triangle_area(self.vertices[i], self.vertices[j], self.vertices[k])
    }

    /// Copy of the mesh with every vertex mapped through `f`
    pub fn map_vertices(&self, f: impl Fn(DVec3) -> DVec3) -> Self {
        Self {
            vertices: self.vertices.iter().map(|&v| f(v)).collect(),
            ..self.clone()
        }
    }
}
