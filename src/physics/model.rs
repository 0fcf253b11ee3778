//! Constitutive model: per-vertex membrane forces for one complete cell.

use glam::DVec3;

use super::{membrane, Equilibrium};
use crate::config::{SpeciesParameters, UnitScaling};
use crate::error::{FicsionError, Result};
use crate::geometry::{MeshMetrics, ReferenceMesh};
use crate::state::{Breakdown, CellView, ForceLaw};

/// Per-vertex output of one force computation, reused across cells
#[derive(Debug, Clone, Default)]
pub struct CellForces {
    /// Force per vertex index
    pub force: Vec<DVec3>,
    /// Potential energy per vertex index
    pub energy: Vec<f64>,
    /// Per-law contributions when recording is enabled
    pub breakdown: Option<Vec<Breakdown>>,
    /// Cell volume at the time of computation
    pub volume: f64,
    /// Cell surface at the time of computation
    pub surface: f64,
}

impl CellForces {
    pub fn new(num_vertices: usize, record_breakdown: bool) -> Self {
        let mut forces = Self::default();
        forces.reset(num_vertices, record_breakdown);
        forces
    }

    /// Zero every accumulator
    pub fn reset(&mut self, num_vertices: usize, record_breakdown: bool) {
        self.force.clear();
        self.force.resize(num_vertices, DVec3::ZERO);
        self.energy.clear();
        self.energy.resize(num_vertices, 0.0);
        if record_breakdown {
            let breakdown = self.breakdown.get_or_insert_with(Vec::new);
            breakdown.clear();
            breakdown.resize(num_vertices, Breakdown::default());
        } else {
            self.breakdown = None;
        }
        self.volume = 0.0;
        self.surface = 0.0;
    }

    /// Add a force and an energy share to one vertex
    #[inline]
    pub fn add(&mut self, vertex: usize, law: ForceLaw, force: DVec3, energy: f64) {
        self.force[vertex] += force;
        self.energy[vertex] += energy;
        if let Some(breakdown) = &mut self.breakdown {
            *breakdown[vertex].force.get_mut(law) += force;
            *breakdown[vertex].energy.get_mut(law) += energy;
        }
    }

    /// Split a cell-wide energy evenly over all vertices
    pub fn spread_energy(&mut self, law: ForceLaw, energy: f64) {
        let share = energy / self.energy.len() as f64;
        for v in 0..self.energy.len() {
            self.add(v, law, DVec3::ZERO, share);
        }
    }

    pub fn total_energy(&self) -> f64 {
        self.energy.iter().sum()
    }

    pub fn net_force(&self) -> DVec3 {
        membrane::net_force(&self.force)
    }
}

/// Membrane constitutive model of one species
#[derive(Debug, Clone)]
pub struct MembraneModel {
    name: String,
    metrics: MeshMetrics,
    equilibrium: Equilibrium,
    record_breakdown: bool,
}

impl MembraneModel {
    /// Build the model for a reference mesh given in lattice units
    pub fn new(species: &SpeciesParameters, units: &UnitScaling, mesh: &ReferenceMesh) -> Result<Self> {
        let metrics = MeshMetrics::new(mesh)?;
        let equilibrium = Equilibrium::from_metrics(species, units, mesh, &metrics)?;
        Ok(Self {
            name: species.name.clone(),
            metrics,
            equilibrium,
            record_breakdown: false,
        })
    }

    /// Keep per-law force and energy contributions
    pub fn with_breakdown(mut self, record: bool) -> Self {
        self.record_breakdown = record;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &MeshMetrics {
        &self.metrics
    }

    pub fn equilibrium(&self) -> &Equilibrium {
        &self.equilibrium
    }

    pub fn records_breakdown(&self) -> bool {
        self.record_breakdown
    }

    /// Compute per-vertex forces of a complete cell into `out`
    ///
    /// `out` is reset first. Laws are accumulated in a fixed order: rest,
    /// in-plane, dissipation, bending, local area, surface, volume. Stretch
    /// stiffness contributes no force.
    ///
    /// Fails when the cell volume or surface is not strictly positive.
    pub fn compute_cell_force(&self, cell: &CellView, partition: usize, out: &mut CellForces) -> Result<()> {
        let num_vertices = cell.mesh().num_vertices();
        out.reset(num_vertices, self.record_breakdown);

        let volume = cell.volume();
        let surface = cell.surface();
        if !(volume > 0.0 && surface > 0.0) {
            log::error!(
                "{} cell {} on partition {}: volume {:e}, surface {:e}",
                self.name,
                cell.cell_id,
                partition,
                volume,
                surface
            );
            return Err(FicsionError::NonPositiveCellGeometry {
                cell_id: cell.cell_id,
                partition,
                volume,
                surface,
            });
        }
        out.volume = volume;
        out.surface = surface;

        let eq = &self.equilibrium;
        membrane::rest_force(cell, eq, out);
        membrane::in_plane_force(cell, eq, out);
        membrane::dissipative_force(cell, eq, out);
        membrane::bending_force(cell, eq, out);
        membrane::local_area_force(cell, eq, out);
        membrane::surface_force(cell, eq, surface, out);
        membrane::volume_force(cell, eq, volume, out);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EquilibriumMode;
    use crate::geometry::shapes;
    use crate::state::{CellIndex, CellId, VertexParticle};

    fn particles(mesh: &ReferenceMesh, cell_id: CellId, f: impl Fn(DVec3) -> DVec3) -> Vec<VertexParticle> {
        mesh.vertices()
            .iter()
            .enumerate()
            .map(|(v, &x)| VertexParticle::new(cell_id, v, mesh.num_vertices(), f(x)))
            .collect()
    }

    fn forces_for(model: &MembraneModel, mesh: &ReferenceMesh, particles: &[VertexParticle]) -> Result<CellForces> {
        let mut index = CellIndex::new();
        index.rebuild(particles, particles.len(), mesh.num_vertices());
        let view = CellView::new(0, mesh, index.get(0).unwrap(), particles);
        let mut out = CellForces::default();
        model.compute_cell_force(&view, 0, &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_rest_shape_is_force_free() {
        let mesh = shapes::red_blood_cell(2, 7.82).unwrap();
        let model = MembraneModel::new(&SpeciesParameters::default(), &UnitScaling::default(), &mesh).unwrap();
        let out = forces_for(&model, &mesh, &particles(&mesh, 0, |x| x)).unwrap();

        let scale = model.equilibrium().k_in_plane;
        for f in &out.force {
            assert!(f.length() < 1e-9 * scale.max(1.0), "residual force {:?}", f);
        }
    }

    #[test]
    fn test_inflated_sphere_pushes_inward() {
        let mesh = shapes::icosphere(2, 5.0).unwrap();
        let model = MembraneModel::new(&SpeciesParameters::default(), &UnitScaling::default(), &mesh).unwrap();
        let out = forces_for(&model, &mesh, &particles(&mesh, 0, |x| x * 1.1)).unwrap();

        for (v, f) in out.force.iter().enumerate() {
            assert!(f.dot(mesh.vertices()[v]) < 0.0, "vertex {} not pulled inward", v);
        }
        assert!(out.net_force().length() < 1e-12);
        assert!(out.total_energy() > 0.0);
    }

    #[test]
    fn test_inverted_cell_is_fatal() {
        let mesh = shapes::icosphere(1, 5.0).unwrap();
        let model = MembraneModel::new(&SpeciesParameters::default(), &UnitScaling::default(), &mesh).unwrap();
        let mirrored = particles(&mesh, 0, |x| DVec3::new(-x.x, x.y, x.z));
        let result = forces_for(&model, &mesh, &mirrored);
        assert!(matches!(
            result,
            Err(FicsionError::NonPositiveCellGeometry { cell_id: 0, partition: 0, .. })
        ));
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let mesh = shapes::icosphere(2, 5.0).unwrap();
        let species = SpeciesParameters {
            eta_m: 1e-6,
            equilibrium: EquilibriumMode::ShapeMemory,
            ..SpeciesParameters::default()
        };
        let model = MembraneModel::new(&species, &UnitScaling::default(), &mesh)
            .unwrap()
            .with_breakdown(true);
        let mut cell = particles(&mesh, 0, |x| DVec3::new(1.2 * x.x, x.y, 0.9 * x.z));
        for (i, p) in cell.iter_mut().enumerate() {
            p.velocity = DVec3::new(0.01 * (i % 3) as f64, 0.0, -0.005);
        }
        let out = forces_for(&model, &mesh, &cell).unwrap();

        let breakdown = out.breakdown.as_ref().unwrap();
        for v in 0..mesh.num_vertices() {
            assert!((breakdown[v].force.total() - out.force[v]).length() < 1e-12);
            assert!((breakdown[v].energy.total() - out.energy[v]).abs() < 1e-12);
        }
        assert!(breakdown.iter().any(|b| b.force.dissipation.length() > 0.0));
        assert!(breakdown.iter().all(|b| b.force.rest == DVec3::ZERO));
    }
}
