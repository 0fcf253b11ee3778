//! Static geometric properties of a reference mesh.
//!
//! Computed once per species and used to derive rest quantities:
//! V = Σ x₁·(x₂×x₃)/6 over all triangles (divergence theorem)
//! S = Σ ½|(x₂−x₁)×(x₃−x₁)|

use glam::DVec3;

use super::{primitives, ReferenceMesh};
use crate::error::{FicsionError, Result};

/// Geometric summary of an undeformed reference mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshMetrics {
    pub num_vertices: usize,
    pub num_triangles: usize,
    pub num_edges: usize,
    /// Largest distance from the vertex centroid
    pub radius: f64,
    /// Mean distance from the vertex centroid
    pub mean_radius: f64,
    pub mean_edge_length: f64,
    pub min_edge_length: f64,
    pub max_edge_length: f64,
    pub mean_triangle_area: f64,
    /// Enclosed volume (signed; positive for outward winding)
    pub volume: f64,
    pub surface: f64,
}

impl MeshMetrics {
    /// Measure a reference mesh
    ///
    /// Fails on a mesh that encloses no volume or has no area, which usually
    /// means inward triangle winding.
    pub fn new(mesh: &ReferenceMesh) -> Result<Self> {
        let vertices = mesh.vertices();
        if mesh.num_vertices() == 0 || mesh.num_triangles() == 0 {
            return Err(FicsionError::DegenerateMesh {
                reason: "mesh has no vertices or triangles".to_string(),
            });
        }

        let centroid = vertices.iter().copied().sum::<DVec3>() / vertices.len() as f64;
        let (radius, radius_sum) = vertices
            .iter()
            .map(|v| v.distance(centroid))
            .fold((0.0_f64, 0.0), |(max, sum), d| (max.max(d), sum + d));

        let mut min_edge = f64::MAX;
        let mut max_edge = 0.0_f64;
        let mut edge_sum = 0.0;
        for edge in 0..mesh.num_edges() {
            let length = mesh.reference_length(edge);
            min_edge = min_edge.min(length);
            max_edge = max_edge.max(length);
            edge_sum += length;
        }

        let mut volume = 0.0;
        let mut surface = 0.0;
        for &[i, j, k] in mesh.triangles() {
            volume += primitives::signed_volume(vertices[i], vertices[j], vertices[k]);
            surface += primitives::triangle_area(vertices[i], vertices[j], vertices[k]);
        }

        if !(volume > 0.0) || !(surface > 0.0) {
            return Err(FicsionError::DegenerateMesh {
                reason: format!(
                    "reference mesh encloses volume {:e} with surface {:e}, check triangle winding",
                    volume, surface
                ),
            });
        }

        Ok(Self {
            num_vertices: mesh.num_vertices(),
            num_triangles: mesh.num_triangles(),
            num_edges: mesh.num_edges(),
            radius,
            mean_radius: radius_sum / vertices.len() as f64,
            mean_edge_length: edge_sum / mesh.num_edges() as f64,
            min_edge_length: min_edge,
            max_edge_length: max_edge,
            mean_triangle_area: surface / mesh.num_triangles() as f64,
            volume,
            surface,
        })
    }
}
