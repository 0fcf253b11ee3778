//! Optical-tweezers style stretching of a single cell.
//!
//! The `n` vertices with the smallest coordinate along the stretch axis are
//! pulled with −F/n each, the `n` with the largest with +F/n, so the net
//! force on the cell is zero. Applied after the constitutive model and before
//! force spreading.
//!
//! Reference: Mills et al., "Nonlinear elastic and viscoelastic deformation of
//! the human red blood cell with optical tweezers", Mech Chem Biosyst 2004

use glam::DVec3;

use super::CellField;
use crate::state::CellId;

/// Axial and transverse diameters of a stretched cell (lattice units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchMeasurement {
    /// Distance between the centres of the two pulled vertex groups
    pub axial: f64,
    /// Largest extent of the cell perpendicular to the stretch axis
    pub transverse: f64,
}

/// Opposite forces on the two lateral vertex groups of one cell
#[derive(Debug, Clone)]
pub struct StretchingForce {
    pub cell_id: CellId,
    /// Axis index (0: x, 1: y, 2: z)
    pub axis: usize,
    /// Total force on each side (lattice units)
    pub force: f64,
    left_tags: Vec<u64>,
    right_tags: Vec<u64>,
}

impl StretchingForce {
    /// Tag the `per_side` outermost vertices of a cell on each side
    pub fn new(field: &CellField, cell_id: CellId, axis: usize, per_side: usize, force: f64) -> Self {
        let axis = axis.min(2);
        let mut particles: Vec<(f64, u64)> = field
            .cell_particles(cell_id)
            .map(|p| (p.position[axis], p.tag))
            .collect();
        particles.sort_by(|a, b| a.0.total_cmp(&b.0));

        let per_side = per_side.min(particles.len() / 2);
        let left_tags = particles[..per_side].iter().map(|&(_, tag)| tag).collect();
        let right_tags = particles[particles.len() - per_side..]
            .iter()
            .rev()
            .map(|&(_, tag)| tag)
            .collect();

        log::info!(
            "stretching cell {} along axis {} with {} vertices per side",
            cell_id,
            axis,
            per_side
        );
        Self {
            cell_id,
            axis,
            force,
            left_tags,
            right_tags,
        }
    }

    pub fn left_tags(&self) -> &[u64] {
        &self.left_tags
    }

    pub fn right_tags(&self) -> &[u64] {
        &self.right_tags
    }

    fn direction(&self) -> DVec3 {
        DVec3::AXES[self.axis]
    }

    /// Add the stretching forces; returns the number of particles pulled
    ///
    /// Tags not found among owned particles are skipped with a warning.
    pub fn apply(&self, field: &mut CellField) -> usize {
        let mut applied = 0;
        for (tags, sign) in [(&self.left_tags, -1.0), (&self.right_tags, 1.0)] {
            if tags.is_empty() {
                continue;
            }
            let share = sign * self.force / tags.len() as f64 * self.direction();
            for &tag in tags.iter() {
                match field.particle_mut(tag) {
                    Some(particle) => {
                        particle.force += share;
                        applied += 1;
                    }
                    None => log::warn!("stretching: particle {} of cell {} not found", tag, self.cell_id),
                }
            }
        }
        field.refresh_ghosts();
        applied
    }

    /// Measure the cell along and across the stretch axis
    pub fn measure(&self, field: &CellField) -> Option<StretchMeasurement> {
        let mut left = (DVec3::ZERO, 0usize);
        let mut right = (DVec3::ZERO, 0usize);
        let mut low = DVec3::splat(f64::INFINITY);
        let mut high = DVec3::splat(f64::NEG_INFINITY);

        for particle in field.cell_particles(self.cell_id) {
            if self.left_tags.contains(&particle.tag) {
                left.0 += particle.position;
                left.1 += 1;
            }
            if self.right_tags.contains(&particle.tag) {
                right.0 += particle.position;
                right.1 += 1;
            }
            low = low.min(particle.position);
            high = high.max(particle.position);
        }
        if left.1 == 0 || right.1 == 0 {
            return None;
        }

        let mut extent = high - low;
        extent[self.axis] = 0.0;
        Some(StretchMeasurement {
            axial: (right.0 / right.1 as f64 - left.0 / left.1 as f64).length(),
            transverse: extent.max_element(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{CouplingParameters, SpeciesParameters, UnitScaling};
    use crate::coupling::LatticeBox;
    use crate::field::decompose;
    use crate::geometry::shapes;
    use glam::IVec3;

    fn field_with_sphere() -> CellField {
        let global = LatticeBox::new(IVec3::ZERO, IVec3::splat(23));
        let partitions = decompose(global, [1, 1, 1], 12).unwrap();
        let mesh = Arc::new(shapes::icosphere(2, 5.0).unwrap());
        let mut field = CellField::new(
            &SpeciesParameters::default(),
            &UnitScaling::default(),
            &CouplingParameters::default(),
            mesh,
            partitions,
        )
        .unwrap();
        let positions = shapes::positions_at(field.mesh(), DVec3::splat(12.0));
        field.add_cell(0, &positions).unwrap();
        field
    }

    #[test]
    fn test_stretch_has_zero_net_force() {
        let mut field = field_with_sphere();
        let stretch = StretchingForce::new(&field, 0, 0, 8, 2.0);
        assert_eq!(stretch.left_tags().len(), 8);
        assert_eq!(stretch.apply(&mut field), 16);

        let net: DVec3 = field.particles().map(|p| p.force).sum();
        assert!(net.length() < 1e-12);
        let pulled_right: f64 = field
            .particles()
            .filter(|p| stretch.right_tags().contains(&p.tag))
            .map(|p| p.force.x)
            .sum();
        assert!((pulled_right - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_tags_are_skipped() {
        let mut field = field_with_sphere();
        let mut stretch = StretchingForce::new(&field, 0, 1, 4, 1.0);
        stretch.right_tags.push(1_000_000);
        assert_eq!(stretch.apply(&mut field), 8);
    }

    #[test]
    fn test_measure_sphere() {
        let field = field_with_sphere();
        let stretch = StretchingForce::new(&field, 0, 2, 1, 1.0);
        let m = stretch.measure(&field).unwrap();
        assert!((m.axial - 10.0).abs() < 1e-9);
        assert!((m.transverse - 10.0).abs() < 1e-9);
    }
}
