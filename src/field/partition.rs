//! Spatial partitions of the lattice and their particle arenas.
//!
//! A partition owns the particles whose nearest lattice node lies in its
//! bulk. It also holds read-only ghost copies of neighbours' particles that
//! fall inside its envelope (bulk enlarged by the envelope width). The arena
//! stores owned particles first, ghosts after `owned_count`.
//!
//! ```text
//!  ┌───────────────────────────┐
//!  │ envelope (ghosts)         │
//!  │   ┌───────────────────┐   │
//!  │   │ bulk (owned)      │   │
//!  │   └───────────────────┘   │
//!  └───────────────────────────┘
//! ```

use std::collections::BTreeSet;

use glam::IVec3;

use crate::coupling::{FluidBlock, ImmersedBoundary, LatticeBox};
use crate::error::{FicsionError, Result};
use crate::geometry::ReferenceMesh;
use crate::physics::{CellForces, MembraneModel};
use crate::reduction::{reduce_cell, ReductionParticle, ReductionType};
use crate::state::{Breakdown, CellId, CellIndex, CellView, Stencil, VertexParticle};

/// Hard limit on the number of neighbours of one partition
pub const MAX_NEIGHBOURS: usize = 30;

/// Neighbours of an interior partition in a regular 3D decomposition
pub const TYPICAL_NEIGHBOURS: usize = 26;

/// One spatial block of the domain and the particles it sees
#[derive(Debug)]
pub struct Partition {
    pub id: usize,
    /// Lattice nodes owned by this partition
    pub bulk: LatticeBox,
    /// Envelope width in lattice nodes
    pub envelope: i32,
    particles: Vec<VertexParticle>,
    owned_count: usize,
    neighbours: Vec<usize>,
    cell_index: CellIndex,
    scratch: Stencil,
}

impl Partition {
    pub fn new(id: usize, bulk: LatticeBox, envelope: i32) -> Self {
        Self {
            id,
            bulk,
            envelope,
            particles: Vec::new(),
            owned_count: 0,
            neighbours: Vec::new(),
            cell_index: CellIndex::new(),
            scratch: Stencil::default(),
        }
    }

    /// Bulk plus envelope: the nodes a fluid block of this partition covers
    pub fn domain(&self) -> LatticeBox {
        self.bulk.enlarge(self.envelope)
    }

    /// Owned particles followed by ghosts
    pub fn particles(&self) -> &[VertexParticle] {
        &self.particles
    }

    pub fn owned(&self) -> &[VertexParticle] {
        &self.particles[..self.owned_count]
    }

    pub fn owned_mut(&mut self) -> &mut [VertexParticle] {
        &mut self.particles[..self.owned_count]
    }

    pub fn ghosts(&self) -> &[VertexParticle] {
        &self.particles[self.owned_count..]
    }

    pub fn owned_count(&self) -> usize {
        self.owned_count
    }

    /// Ids of partitions whose envelope overlaps this bulk
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    pub fn cell_index(&self) -> &CellIndex {
        &self.cell_index
    }

    /// View of one cell over this partition's arena
    pub fn cell<'a>(&'a self, cell_id: CellId, mesh: &'a ReferenceMesh) -> Option<CellView<'a>> {
        let slots = self.cell_index.get(cell_id)?;
        Some(CellView::new(cell_id, mesh, slots, &self.particles))
    }

    /// Cells with at least one owned vertex
    pub fn owned_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cell_index
            .iter()
            .filter(|(_, slots)| slots.owned() > 0)
            .map(|(id, _)| id)
    }

    /// Owned particle with the given tag
    pub fn owned_by_tag_mut(&mut self, tag: u64, vertices_per_cell: usize) -> Option<&mut VertexParticle> {
        let slot = self.cell_index.find_tag(tag, vertices_per_cell)?;
        if slot < self.owned_count {
            self.particles.get_mut(slot)
        } else {
            None
        }
    }

    pub(crate) fn drop_ghosts(&mut self) {
        self.particles.truncate(self.owned_count);
    }

    /// Add an owned particle; ghosts must have been dropped first
    pub(crate) fn push_owned(&mut self, particle: VertexParticle) {
        debug_assert_eq!(self.particles.len(), self.owned_count);
        self.particles.push(particle);
        self.owned_count += 1;
    }

    /// Remove owned particles that left the bulk and return them
    pub(crate) fn take_emigrants(&mut self) -> Vec<VertexParticle> {
        self.drop_ghosts();
        let bulk = self.bulk;
        let (stay, leave): (Vec<_>, Vec<_>) = self
            .particles
            .drain(..)
            .partition(|p| bulk.contains_point(p.position));
        self.particles = stay;
        self.owned_count = self.particles.len();
        leave
    }

    /// Remove every owned particle of the given cells
    pub(crate) fn remove_cells(&mut self, cells: &BTreeSet<CellId>) -> usize {
        self.drop_ghosts();
        let before = self.particles.len();
        self.particles.retain(|p| !cells.contains(&p.cell_id));
        self.owned_count = self.particles.len();
        before - self.owned_count
    }

    pub(crate) fn set_ghosts(&mut self, ghosts: Vec<VertexParticle>, vertices_per_cell: usize) {
        self.drop_ghosts();
        self.particles.extend(ghosts);
        self.rebuild_index(vertices_per_cell);
    }

    pub(crate) fn rebuild_index(&mut self, vertices_per_cell: usize) {
        self.cell_index
            .rebuild(&self.particles, self.owned_count, vertices_per_cell);
    }

    /// Compute membrane forces for every complete cell with owned vertices
    ///
    /// Forces and energies of owned particles are reset first. Returns the
    /// cells that could not be computed because vertices are missing.
    pub(crate) fn apply_model(&mut self, model: &MembraneModel, mesh: &ReferenceMesh) -> Result<BTreeSet<CellId>> {
        let record = model.records_breakdown();
        for particle in &mut self.particles[..self.owned_count] {
            particle.force = glam::DVec3::ZERO;
            particle.energy = 0.0;
            particle.breakdown = record.then(Box::default);
        }

        let mut incomplete = BTreeSet::new();
        let mut forces = CellForces::new(mesh.num_vertices(), record);
        for (cell_id, slots) in self.cell_index.iter() {
            if slots.owned() == 0 {
                continue;
            }
            if !slots.is_complete() {
                incomplete.insert(cell_id);
                continue;
            }

            let view = CellView::new(cell_id, mesh, slots, &self.particles);
            model.compute_cell_force(&view, self.id, &mut forces)?;

            for (vertex, slot) in slots.slots().iter().enumerate() {
                let Some(slot) = *slot else { continue };
                if slot >= self.owned_count {
                    continue;
                }
                let particle = &mut self.particles[slot];
                particle.force += forces.force[vertex];
                particle.energy += forces.energy[vertex];
                if let (Some(target), Some(source)) = (&mut particle.breakdown, &forces.breakdown) {
                    **target = Breakdown::clone(&source[vertex]);
                }
            }
        }

        if !incomplete.is_empty() {
            log::debug!(
                "partition {}: {} incomplete cells skipped",
                self.id,
                incomplete.len()
            );
        }
        Ok(incomplete)
    }

    /// Scatter the forces of every visible particle into the bulk of `fluid`
    pub(crate) fn spread_force<B: FluidBlock + ?Sized>(&mut self, ibm: &ImmersedBoundary, fluid: &mut B) {
        ibm.spread_force(&self.particles, fluid, &self.bulk, &mut self.scratch);
    }

    /// Gather fluid velocity at every owned particle
    pub(crate) fn interpolate_velocity<B: FluidBlock + ?Sized>(&mut self, ibm: &ImmersedBoundary, fluid: &B) -> Result<()> {
        ibm.interpolate_velocity(&mut self.particles[..self.owned_count], fluid, self.id)
    }

    /// Phase 1 reduction of every cell with owned vertices
    pub(crate) fn reduce(&self, mesh: &ReferenceMesh, types: &BTreeSet<ReductionType>) -> Vec<ReductionParticle> {
        self.cell_index
            .iter()
            .filter(|(_, slots)| slots.owned() > 0)
            .map(|(cell_id, slots)| {
                let view = CellView::new(cell_id, mesh, slots, &self.particles);
                reduce_cell(&view, self.owned_count, self.id, types)
            })
            .collect()
    }
}

/// Split `global` into `splits[0] × splits[1] × splits[2]` partitions
///
/// Neighbours are partitions whose envelope-enlarged bulk intersects the
/// bulk. More than [`MAX_NEIGHBOURS`] neighbours is an error.
pub fn decompose(global: LatticeBox, splits: [i32; 3], envelope: i32) -> Result<Vec<Partition>> {
    let extent = global.extent();
    for axis in 0..3 {
        if splits[axis] < 1 || splits[axis] > extent[axis] {
            return Err(FicsionError::invalid(
                "splits",
                format!("{} parts along axis {} of a {}-node domain", splits[axis], axis, extent[axis]),
            ));
        }
    }
    if envelope < 1 {
        return Err(FicsionError::invalid("envelope", format!("width {} below 1", envelope)));
    }

    let bound = |axis: usize, i: i32| global.min[axis] + i * extent[axis] / splits[axis];
    let mut partitions = Vec::new();
    for k in 0..splits[2] {
        for j in 0..splits[1] {
            for i in 0..splits[0] {
                let min = IVec3::new(bound(0, i), bound(1, j), bound(2, k));
                let max = IVec3::new(bound(0, i + 1), bound(1, j + 1), bound(2, k + 1)) - IVec3::ONE;
                let id = partitions.len();
                partitions.push(Partition::new(id, LatticeBox::new(min, max), envelope));
            }
        }
    }

    let boxes: Vec<(LatticeBox, LatticeBox)> = partitions.iter().map(|p| (p.bulk, p.domain())).collect();
    for partition in &mut partitions {
        partition.neighbours = boxes
            .iter()
            .enumerate()
            .filter(|&(j, (_, domain))| j != partition.id && domain.intersects(&partition.bulk))
            .map(|(j, _)| j)
            .collect();

        let count = partition.neighbours.len();
        if count > MAX_NEIGHBOURS {
            log::error!(
                "partition {} has {} neighbours, maximum is {}",
                partition.id,
                count,
                MAX_NEIGHBOURS
            );
            return Err(FicsionError::TooManyNeighbours {
                partition: partition.id,
                count,
                max: MAX_NEIGHBOURS,
            });
        }
        if count > TYPICAL_NEIGHBOURS {
            log::warn!(
                "partition {} has {} neighbours, more than the usual {}",
                partition.id,
                count,
                TYPICAL_NEIGHBOURS
            );
        }
    }

    log::info!(
        "decomposed {:?}..{:?} into {} partitions with envelope {}",
        global.min,
        global.max,
        partitions.len(),
        envelope
    );
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_decompose_covers_domain() {
        let global = LatticeBox::new(IVec3::ZERO, IVec3::new(31, 15, 15));
        let partitions = decompose(global, [2, 1, 1], 4).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].bulk.max.x, 15);
        assert_eq!(partitions[1].bulk.min.x, 16);
        let total: usize = partitions.iter().map(|p| p.bulk.num_nodes()).sum();
        assert_eq!(total, global.num_nodes());
        assert_eq!(partitions[0].neighbours(), &[1]);
        assert_eq!(partitions[1].neighbours(), &[0]);
    }

    #[test]
    fn test_decompose_rejects_bad_splits() {
        let global = LatticeBox::new(IVec3::ZERO, IVec3::splat(3));
        assert!(decompose(global, [0, 1, 1], 2).is_err());
        assert!(decompose(global, [5, 1, 1], 2).is_err());
        assert!(decompose(global, [1, 1, 1], 0).is_err());
    }

    #[test]
    fn test_too_many_neighbours() {
        // Wide envelope on a 4×4×4 split: every partition sees all 63 others
        let global = LatticeBox::new(IVec3::ZERO, IVec3::splat(15));
        let result = decompose(global, [4, 4, 4], 25);
        assert!(matches!(
            result,
            Err(FicsionError::TooManyNeighbours { max: MAX_NEIGHBOURS, .. })
        ));
    }

    #[test]
    fn test_emigrants_leave_bulk() {
        let mut p = Partition::new(0, LatticeBox::new(IVec3::ZERO, IVec3::splat(9)), 3);
        p.push_owned(VertexParticle::new(0, 0, 2, DVec3::splat(2.0)));
        p.push_owned(VertexParticle::new(0, 1, 2, DVec3::new(9.6, 2.0, 2.0)));
        let leaving = p.take_emigrants();
        assert_eq!(leaving.len(), 1);
        assert_eq!(leaving[0].vertex_index, 1);
        assert_eq!(p.owned_count(), 1);
    }
}
