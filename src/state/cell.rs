//! Transient per-cell views over a partition's particle arena.
//!
//! Particles stay owned by the partition container; each pipeline pass
//! rebuilds a [`CellIndex`] mapping cell id to the arena slot of every vertex
//! index. Slot vectors are pooled between passes so rebuilding does not
//! allocate once the cell population is stable.

use std::collections::BTreeMap;

use glam::DVec3;

use super::particle::{CellId, VertexParticle};
use crate::geometry::{primitives, MeshEdge, ReferenceMesh};

/// Arena slots of one cell, indexed by vertex index
#[derive(Debug, Clone, Default)]
pub struct CellSlots {
    slots: Vec<Option<usize>>,
    live: usize,
    owned: usize,
}

impl CellSlots {
    /// Slot of a vertex, if it is visible in this partition
    pub fn slot(&self, vertex: usize) -> Option<usize> {
        self.slots[vertex]
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    /// Number of vertices present
    pub fn live(&self) -> usize {
        self.live
    }

    /// Number of present vertices owned by this partition
    pub fn owned(&self) -> usize {
        self.owned
    }

    /// Every vertex index has a particle
    pub fn is_complete(&self) -> bool {
        self.live == self.slots.len()
    }
}

/// Pooled index from cell id to vertex slots
#[derive(Debug, Default)]
pub struct CellIndex {
    cells: BTreeMap<CellId, CellSlots>,
    pool: Vec<CellSlots>,
}

impl CellIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the arena; slots below `owned_count` are owned particles
    ///
    /// A vertex seen twice keeps its first (owned) slot.
    pub fn rebuild(&mut self, particles: &[VertexParticle], owned_count: usize, vertices_per_cell: usize) {
        let pool = &mut self.pool;
        pool.extend(std::mem::take(&mut self.cells).into_values());

        for (slot, particle) in particles.iter().enumerate() {
            if particle.vertex_index >= vertices_per_cell {
                log::warn!(
                    "particle {} has vertex index {} beyond the mesh ({} vertices), ignored",
                    particle.tag,
                    particle.vertex_index,
                    vertices_per_cell
                );
                continue;
            }
            let entry = self.cells.entry(particle.cell_id).or_insert_with(|| {
                let mut slots = pool.pop().unwrap_or_default();
                slots.slots.clear();
                slots.slots.resize(vertices_per_cell, None);
                slots.live = 0;
                slots.owned = 0;
                slots
            });
            if entry.slots[particle.vertex_index].is_none() {
                entry.slots[particle.vertex_index] = Some(slot);
                entry.live += 1;
                if slot < owned_count {
                    entry.owned += 1;
                }
            }
        }
    }

    pub fn get(&self, cell_id: CellId) -> Option<&CellSlots> {
        self.cells.get(&cell_id)
    }

    /// Cells in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &CellSlots)> {
        self.cells.iter().map(|(&id, slots)| (id, slots))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Arena slot of the particle with the given tag
    pub fn find_tag(&self, tag: u64, vertices_per_cell: usize) -> Option<usize> {
        let cell_id = CellId::try_from(tag / vertices_per_cell as u64).ok()?;
        let vertex = (tag % vertices_per_cell as u64) as usize;
        self.cells.get(&cell_id)?.slot(vertex)
    }
}

/// Dihedral angle across an edge with its opposite vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedAngle {
    pub angle: f64,
    /// Opposite vertex of the triangle traversing the edge forwards
    pub k: usize,
    /// Opposite vertex of the triangle traversing the edge backwards
    pub l: usize,
}

/// One cell's live vertices seen through the reference topology
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a> {
    pub cell_id: CellId,
    mesh: &'a ReferenceMesh,
    slots: &'a CellSlots,
    particles: &'a [VertexParticle],
}

impl<'a> CellView<'a> {
    pub fn new(
        cell_id: CellId,
        mesh: &'a ReferenceMesh,
        slots: &'a CellSlots,
        particles: &'a [VertexParticle],
    ) -> Self {
        Self {
            cell_id,
            mesh,
            slots,
            particles,
        }
    }

    pub fn mesh(&self) -> &'a ReferenceMesh {
        self.mesh
    }

    pub fn slots(&self) -> &'a CellSlots {
        self.slots
    }

    /// Fewer live vertices than the reference mesh
    pub fn is_incomplete(&self) -> bool {
        !self.slots.is_complete()
    }

    /// Particle of a vertex index, if present
    pub fn particle(&self, vertex: usize) -> Option<&'a VertexParticle> {
        self.slots.slot(vertex).map(|slot| &self.particles[slot])
    }

    /// Position of a vertex; missing vertices read as the origin
    ///
    /// Geometric queries are only meaningful on complete cells.
    pub fn vertex(&self, vertex: usize) -> DVec3 {
        self.particle(vertex).map_or(DVec3::ZERO, |p| p.position)
    }

    pub fn velocity(&self, vertex: usize) -> DVec3 {
        self.particle(vertex).map_or(DVec3::ZERO, |p| p.velocity)
    }

    pub fn triangles(&self) -> &'a [[usize; 3]] {
        self.mesh.triangles()
    }

    pub fn edges(&self) -> &'a [MeshEdge] {
        self.mesh.edges()
    }

    /// Vertex indices present in this view
    pub fn vertices(&self) -> impl Iterator<Item = usize> + 'a {
        let slots = self.slots;
        (0..slots.slots().len()).filter(move |&v| slots.slot(v).is_some())
    }

    /// Corner positions of a triangle
    pub fn triangle_corners(&self, triangle: usize) -> [DVec3; 3] {
        let [i, j, k] = self.mesh.triangles()[triangle];
        [self.vertex(i), self.vertex(j), self.vertex(k)]
    }

    /// All three corners are present
    pub fn has_triangle(&self, triangle: usize) -> bool {
        self.mesh.triangles()[triangle]
            .iter()
            .all(|&v| self.slots.slot(v).is_some())
    }

    pub fn triangle_area(&self, triangle: usize) -> f64 {
        let [x1, x2, x3] = self.triangle_corners(triangle);
        primitives::triangle_area(x1, x2, x3)
    }

    pub fn triangle_normal(&self, triangle: usize) -> DVec3 {
        let [x1, x2, x3] = self.triangle_corners(triangle);
        primitives::triangle_normal(x1, x2, x3)
    }

    /// Dihedral angle across edge (a, b)
    ///
    /// Returns `None` when the edge does not exist or has fewer than two
    /// adjacent triangles. Swapping `a` and `b` swaps `k` and `l` and keeps
    /// the angle.
    pub fn compute_signed_angle(&self, a: usize, b: usize) -> Option<SignedAngle> {
        let edge = &self.mesh.edges()[self.mesh.edge_between(a, b)?];
        let (mut k, mut l) = (edge.opposite[0]?, edge.opposite[1]?);
        if edge.a != a {
            std::mem::swap(&mut k, &mut l);
        }
        let angle = primitives::dihedral_angle(self.vertex(a), self.vertex(b), self.vertex(k), self.vertex(l));
        Some(SignedAngle { angle, k, l })
    }

    /// Enclosed volume, summed over all triangles
    pub fn volume(&self) -> f64 {
        (0..self.mesh.num_triangles())
            .map(|t| {
                let [x1, x2, x3] = self.triangle_corners(t);
                primitives::signed_volume(x1, x2, x3)
            })
            .sum()
    }

    /// Total membrane surface
    pub fn surface(&self) -> f64 {
        (0..self.mesh.num_triangles()).map(|t| self.triangle_area(t)).sum()
    }

    /// Mean position of the live vertices
    pub fn centroid(&self) -> DVec3 {
        let (sum, count) = self
            .vertices()
            .fold((DVec3::ZERO, 0usize), |(sum, n), v| (sum + self.vertex(v), n + 1));
        if count == 0 {
            DVec3::ZERO
        } else {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{shapes, MeshMetrics};

    fn particles_for(mesh: &ReferenceMesh, cell_id: CellId, offset: DVec3) -> Vec<VertexParticle> {
        mesh.vertices()
            .iter()
            .enumerate()
            .map(|(v, &x)| VertexParticle::new(cell_id, v, mesh.num_vertices(), x + offset))
            .collect()
    }

    #[test]
    fn test_index_groups_by_cell() {
        let mesh = shapes::icosphere(1, 3.0).unwrap();
        let mut particles = particles_for(&mesh, 7, DVec3::ZERO);
        particles.extend(particles_for(&mesh, 2, DVec3::splat(10.0)));

        let mut index = CellIndex::new();
        index.rebuild(&particles, particles.len(), mesh.num_vertices());

        assert_eq!(index.len(), 2);
        let ids: Vec<CellId> = index.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 7]);
        assert!(index.get(7).unwrap().is_complete());
        assert_eq!(index.get(2).unwrap().owned(), mesh.num_vertices());
    }

    #[test]
    fn test_view_matches_reference_metrics() {
        let mesh = shapes::icosphere(2, 4.0).unwrap();
        let metrics = MeshMetrics::new(&mesh).unwrap();
        let particles = particles_for(&mesh, 0, DVec3::new(5.0, -2.0, 1.0));
        let mut index = CellIndex::new();
        index.rebuild(&particles, particles.len(), mesh.num_vertices());

        let view = CellView::new(0, &mesh, index.get(0).unwrap(), &particles);
        // Volume is translation invariant for a closed surface
        assert!((view.volume() - metrics.volume).abs() < 1e-9);
        assert!((view.surface() - metrics.surface).abs() < 1e-9);
        assert!((view.centroid() - DVec3::new(5.0, -2.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn test_missing_vertex_marks_incomplete() {
        let mesh = shapes::icosphere(1, 3.0).unwrap();
        let mut particles = particles_for(&mesh, 1, DVec3::ZERO);
        particles.remove(5);
        let mut index = CellIndex::new();
        index.rebuild(&particles, particles.len(), mesh.num_vertices());

        let view = CellView::new(1, &mesh, index.get(1).unwrap(), &particles);
        assert!(view.is_incomplete());
        assert_eq!(view.slots().live(), mesh.num_vertices() - 1);
    }

    #[test]
    fn test_signed_angle_symmetric_in_edge_direction() {
        let mesh = shapes::icosphere(1, 3.0).unwrap();
        let particles = particles_for(&mesh, 0, DVec3::ZERO);
        let mut index = CellIndex::new();
        index.rebuild(&particles, particles.len(), mesh.num_vertices());
        let view = CellView::new(0, &mesh, index.get(0).unwrap(), &particles);

        let edge = mesh.edges()[0];
        let forward = view.compute_signed_angle(edge.a, edge.b).unwrap();
        let backward = view.compute_signed_angle(edge.b, edge.a).unwrap();
        assert!(forward.angle > 0.0, "sphere edges are convex");
        assert!((forward.angle - backward.angle).abs() < 1e-12);
        assert_eq!(forward.k, backward.l);
        assert!(view.compute_signed_angle(0, 0).is_none());
    }

    #[test]
    fn test_find_tag() {
        let mesh = shapes::icosphere(0, 1.0).unwrap();
        let particles = particles_for(&mesh, 3, DVec3::ZERO);
        let mut index = CellIndex::new();
        index.rebuild(&particles, particles.len(), 12);
        assert_eq!(index.find_tag(3 * 12 + 4, 12), Some(4));
        assert_eq!(index.find_tag(99 * 12, 12), None);
    }

    #[test]
    fn test_rebuild_reuses_pool() {
        let mesh = shapes::icosphere(0, 1.0).unwrap();
        let particles = particles_for(&mesh, 3, DVec3::ZERO);
        let mut index = CellIndex::new();
        index.rebuild(&particles, particles.len(), 12);
        index.rebuild(&particles[..6], 6, 12);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(3).unwrap().live(), 6);
        assert!(!index.get(3).unwrap().is_complete());
    }
}
