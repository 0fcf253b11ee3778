//! Orchestration of one cell species over all partitions.
//!
//! ## Step
//! ```text
//! apply_constitutive_model   forces on owned vertices, ghosts refreshed
//!          │
//! spread_force_ibm           particle forces → fluid bulk nodes
//!          │
//!   (fluid solver advances)
//!          │
//! interpolate_velocity_ibm   fluid velocity → owned particles
//!          │
//! advance_particles          positions, migration, ghost rebuild
//!          │
//! synchronize_cell_quantities
//! ```
//!
//! Partition work runs in parallel; ghost and reduction-particle exchange
//! happen sequentially between the parallel phases.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::DVec3;
use rayon::prelude::*;

use super::partition::Partition;
use crate::config::{CouplingParameters, SpeciesParameters, UnitScaling};
use crate::coupling::{FluidBlock, ImmersedBoundary, InterpolationKernel};
use crate::error::{FicsionError, Result};
use crate::geometry::ReferenceMesh;
use crate::physics::{MembraneModel, ParticleIntegrator};
use crate::reduction::{self, CellQuantities, ReductionParticle, ReductionType};
use crate::state::{CellId, VertexParticle};

/// All cells of one species
#[derive(Debug)]
pub struct CellField {
    mesh: Arc<ReferenceMesh>,
    model: MembraneModel,
    ibm: ImmersedBoundary,
    integrator: ParticleIntegrator,
    partitions: Vec<Partition>,
    incomplete: BTreeSet<CellId>,
    quantities: BTreeMap<CellId, CellQuantities>,
}

impl CellField {
    /// Build a field on an existing decomposition
    ///
    /// `mesh` is the reference shape in lattice units.
    pub fn new(
        species: &SpeciesParameters,
        units: &UnitScaling,
        coupling: &CouplingParameters,
        mesh: Arc<ReferenceMesh>,
        partitions: Vec<Partition>,
    ) -> Result<Self> {
        coupling.validate()?;
        species.validate()?;
        let kernel = InterpolationKernel::from_selector(coupling.ibm_kernel)?;
        let model = MembraneModel::new(species, units, &mesh)?.with_breakdown(coupling.record_breakdown);

        log::info!(
            "{} field: {} vertices per cell, {:?} kernel, {} partitions",
            species.name,
            mesh.num_vertices(),
            kernel,
            partitions.len()
        );

        Ok(Self {
            mesh,
            model,
            ibm: ImmersedBoundary::new(kernel),
            integrator: ParticleIntegrator::new(coupling.update_scheme, coupling.particle_time_step),
            partitions,
            incomplete: BTreeSet::new(),
            quantities: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn mesh(&self) -> &ReferenceMesh {
        &self.mesh
    }

    pub fn model(&self) -> &MembraneModel {
        &self.model
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Cells flagged by the last constitutive-model pass
    pub fn incomplete_cells(&self) -> &BTreeSet<CellId> {
        &self.incomplete
    }

    /// Ids of every cell with at least one owned particle
    pub fn cell_ids(&self) -> BTreeSet<CellId> {
        self.partitions.iter().flat_map(|p| p.owned_cells()).collect()
    }

    pub fn num_particles(&self) -> usize {
        self.partitions.iter().map(Partition::owned_count).sum()
    }

    /// Place a new cell; particles outside every partition are dropped
    pub fn add_cell(&mut self, cell_id: CellId, positions: &[DVec3]) -> Result<()> {
        let nv = self.mesh.num_vertices();
        if positions.len() != nv {
            return Err(FicsionError::VertexCountMismatch {
                cell_id,
                expected: nv,
                provided: positions.len(),
            });
        }

        for partition in &mut self.partitions {
            partition.drop_ghosts();
        }
        let mut dropped = 0;
        for (vertex, &position) in positions.iter().enumerate() {
            let particle = VertexParticle::new(cell_id, vertex, nv, position);
            match self.owner_of(position) {
                Some(owner) => self.partitions[owner].push_owned(particle),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::warn!("cell {}: {} vertices outside the domain were not placed", cell_id, dropped);
        }

        self.sync_envelopes();
        Ok(())
    }

    fn owner_of(&self, position: DVec3) -> Option<usize> {
        self.partitions.iter().position(|p| p.bulk.contains_point(position))
    }

    /// Migrate owned particles to the partition containing them and rebuild
    /// every ghost layer
    pub fn sync_envelopes(&mut self) {
        let mut migrants = Vec::new();
        for partition in &mut self.partitions {
            migrants.extend(partition.take_emigrants());
        }
        for particle in migrants {
            match self.owner_of(particle.position) {
                Some(owner) => self.partitions[owner].push_owned(particle),
                None => log::warn!(
                    "particle {} of cell {} left the domain at {:?}, removed",
                    particle.tag,
                    particle.cell_id,
                    particle.position
                ),
            }
        }
        self.refresh_ghosts();
    }

    /// Copy owned particles into the envelopes of neighbouring partitions
    pub fn refresh_ghosts(&mut self) {
        let nv = self.mesh.num_vertices();
        let ghosts: Vec<Vec<VertexParticle>> = self
            .partitions
            .iter()
            .map(|target| {
                let domain = target.domain();
                target
                    .neighbours()
                    .iter()
                    .flat_map(|&n| self.partitions[n].owned())
                    .filter(|p| domain.contains_point(p.position))
                    .cloned()
                    .collect()
            })
            .collect();

        for (partition, ghosts) in self.partitions.iter_mut().zip(ghosts) {
            partition.set_ghosts(ghosts, nv);
        }
    }

    /// Compute membrane forces on every owned particle
    ///
    /// Cells missing vertices in a partition that owns part of them are
    /// returned and remembered; they receive no membrane force this step.
    pub fn apply_constitutive_model(&mut self) -> Result<BTreeSet<CellId>> {
        let model = &self.model;
        let mesh = &*self.mesh;
        let results: Vec<Result<BTreeSet<CellId>>> = self
            .partitions
            .par_iter_mut()
            .map(|partition| partition.apply_model(model, mesh))
            .collect();

        let mut incomplete = BTreeSet::new();
        for result in results {
            incomplete.extend(result?);
        }
        self.refresh_ghosts();

        if !incomplete.is_empty() {
            log::debug!("{}: {} incomplete cells", self.name(), incomplete.len());
        }
        self.incomplete = incomplete.clone();
        Ok(incomplete)
    }

    /// Remove every cell flagged incomplete by the last force pass
    pub fn delete_incomplete_cells(&mut self) -> usize {
        if self.incomplete.is_empty() {
            return 0;
        }
        for cell_id in &self.incomplete {
            log::warn!("{}: deleting incomplete cell {}", self.model.name(), cell_id);
        }
        let incomplete = std::mem::take(&mut self.incomplete);
        let removed: usize = self
            .partitions
            .iter_mut()
            .map(|p| p.remove_cells(&incomplete))
            .sum();
        for cell_id in &incomplete {
            self.quantities.remove(cell_id);
        }
        self.refresh_ghosts();
        removed
    }

    fn check_blocks(&self, blocks: usize) -> Result<()> {
        if blocks != self.partitions.len() {
            log::error!("{} fluid blocks for {} partitions", blocks, self.partitions.len());
            return Err(FicsionError::MismatchedFluidBlocks {
                partitions: self.partitions.len(),
                blocks,
            });
        }
        Ok(())
    }

    /// Add particle forces to the fluid; `blocks[i]` belongs to partition i
    pub fn spread_force_ibm<B: FluidBlock + Send>(&mut self, blocks: &mut [B]) -> Result<()> {
        self.check_blocks(blocks.len())?;
        let ibm = self.ibm;
        self.partitions
            .par_iter_mut()
            .zip(blocks.par_iter_mut())
            .for_each(|(partition, block)| partition.spread_force(&ibm, block));
        Ok(())
    }

    /// Set owned particle velocities from the fluid
    pub fn interpolate_velocity_ibm<B: FluidBlock + Sync>(&mut self, blocks: &[B]) -> Result<()> {
        self.check_blocks(blocks.len())?;
        let ibm = self.ibm;
        self.partitions
            .par_iter_mut()
            .zip(blocks.par_iter())
            .map(|(partition, block)| partition.interpolate_velocity(&ibm, block))
            .collect::<Result<Vec<()>>>()?;
        Ok(())
    }

    /// Move owned particles with their velocity, then migrate and rebuild ghosts
    pub fn advance_particles(&mut self) {
        let integrator = self.integrator;
        self.partitions
            .par_iter_mut()
            .for_each(|partition| integrator.advance_all(partition.owned_mut()));
        self.sync_envelopes();
    }

    /// Reduce the requested quantities of every cell
    ///
    /// Phase 1 runs per partition; each partition then merges the reduction
    /// particles of itself and its neighbours for the cells it owns vertices
    /// of. Where several partitions merge the same cell, the result covering
    /// the most particles is kept.
    pub fn synchronize_cell_quantities(&mut self, requested: &[ReductionType]) -> &BTreeMap<CellId, CellQuantities> {
        let types = reduction::required_types(requested);
        let mesh = &*self.mesh;

        let local: Vec<Vec<ReductionParticle>> = self
            .partitions
            .par_iter()
            .map(|partition| partition.reduce(mesh, &types))
            .collect();

        let requested: Vec<ReductionType> = types.iter().copied().collect();
        let merged: Vec<BTreeMap<CellId, CellQuantities>> = self
            .partitions
            .par_iter()
            .map(|site| {
                let visible = std::iter::once(site.id)
                    .chain(site.neighbours().iter().copied())
                    .flat_map(|p| local[p].iter());
                let cells: BTreeSet<CellId> = site.owned_cells().collect();
                reduction::merge(visible, &cells, &requested)
            })
            .collect();

        self.quantities.clear();
        for site in merged {
            for (cell_id, quantities) in site {
                let keep = self
                    .quantities
                    .get(&cell_id)
                    .map_or(true, |current| quantities.n_particles > current.n_particles);
                if keep {
                    self.quantities.insert(cell_id, quantities);
                }
            }
        }
        &self.quantities
    }

    /// Quantities of one cell from the last synchronisation
    pub fn cell_quantities(&self, cell_id: CellId) -> Option<&CellQuantities> {
        self.quantities.get(&cell_id)
    }

    pub fn all_cell_quantities(&self) -> &BTreeMap<CellId, CellQuantities> {
        &self.quantities
    }

    /// Owned particle with the given tag, in whichever partition holds it
    pub fn particle_mut(&mut self, tag: u64) -> Option<&mut VertexParticle> {
        let nv = self.mesh.num_vertices();
        self.partitions
            .iter_mut()
            .find_map(|p| p.owned_by_tag_mut(tag, nv))
    }

    /// Owned particles of one cell, over all partitions
    pub fn cell_particles(&self, cell_id: CellId) -> impl Iterator<Item = &VertexParticle> {
        self.partitions
            .iter()
            .flat_map(|p| p.owned())
            .filter(move |p| p.cell_id == cell_id)
    }

    /// All owned particles
    pub fn particles(&self) -> impl Iterator<Item = &VertexParticle> {
        self.partitions.iter().flat_map(|p| p.owned())
    }
}

/// Several species sharing one set of fluid blocks
#[derive(Debug, Default)]
pub struct CellFields {
    fields: Vec<CellField>,
}

impl CellFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: CellField) {
        self.fields.push(field);
    }

    pub fn get(&self, name: &str) -> Option<&CellField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CellField> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Incomplete cells per field, in field order
    pub fn apply_constitutive_model(&mut self) -> Result<Vec<BTreeSet<CellId>>> {
        self.fields
            .iter_mut()
            .map(CellField::apply_constitutive_model)
            .collect()
    }

    pub fn delete_incomplete_cells(&mut self) -> usize {
        self.fields.iter_mut().map(CellField::delete_incomplete_cells).sum()
    }

    pub fn spread_force_ibm<B: FluidBlock + Send>(&mut self, blocks: &mut [B]) -> Result<()> {
        for field in &mut self.fields {
            field.spread_force_ibm(blocks)?;
        }
        Ok(())
    }

    pub fn interpolate_velocity_ibm<B: FluidBlock + Sync>(&mut self, blocks: &[B]) -> Result<()> {
        for field in &mut self.fields {
            field.interpolate_velocity_ibm(blocks)?;
        }
        Ok(())
    }

    pub fn advance_particles(&mut self) {
        for field in &mut self.fields {
            field.advance_particles();
        }
    }

    pub fn synchronize_cell_quantities(&mut self, requested: &[ReductionType]) {
        for field in &mut self.fields {
            field.synchronize_cell_quantities(requested);
        }
    }
}
