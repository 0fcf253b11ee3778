//! Synchronised per-cell quantities after the global merge.

use std::collections::BTreeMap;

use glam::{DMat3, DVec3};

use super::ellipsoid::EllipsoidFit;
use super::statistics::{Partial, ReducedValue, MOMENT_COMPONENTS};
use super::types::{Quantity, ReductionType};
use crate::state::CellId;

/// Reduced quantities of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellQuantities {
    pub cell_id: CellId,
    /// Owned particles that contributed, over all partitions
    pub n_particles: usize,
    values: BTreeMap<ReductionType, ReducedValue>,
    ellipsoid: Option<EllipsoidFit>,
}

impl CellQuantities {
    /// Finalise merged partials: shift inertia and torque to the cell
    /// centre and evaluate the ellipsoid-derived outputs
    pub(crate) fn finalize(
        cell_id: CellId,
        n_particles: usize,
        partials: BTreeMap<ReductionType, Partial>,
        requested: &[ReductionType],
    ) -> Self {
        let mut values: BTreeMap<ReductionType, ReducedValue> =
            partials.into_iter().map(|(ty, p)| (ty, p.value)).collect();

        let volume = values.get(&ReductionType::VOLUME).and_then(ReducedValue::as_scalar);

        if let (Some(ReducedValue::Tensor(raw)), Some(volume)) = (values.get(&ReductionType::INERTIA), volume) {
            let shifted = centroidal_inertia(raw, volume);
            values.insert(ReductionType::INERTIA, ReducedValue::Tensor(shifted));
        }

        let center = values
            .get(&ReductionType::POSITION_MEAN)
            .and_then(ReducedValue::as_vector);
        let force = values.get(&ReductionType::FORCE).and_then(ReducedValue::as_vector);
        if let (Some(ReducedValue::Vector(torque)), Some(center), Some(force)) =
            (values.get(&ReductionType::TORQUE), center, force)
        {
            let shifted = *torque - center.cross(force);
            values.insert(ReductionType::TORQUE, ReducedValue::Vector(shifted));
        }

        let mut quantities = Self {
            cell_id,
            n_particles,
            values,
            ellipsoid: None,
        };

        if requested.iter().any(ReductionType::is_derived) {
            if let (Some(inertia), Some(volume)) = (quantities.inertia(), volume) {
                quantities.ellipsoid = EllipsoidFit::from_inertia(inertia, volume);
            }
            if let Some(fit) = quantities.ellipsoid {
                for ty in requested.iter().filter(|ty| ty.is_derived()) {
                    let value = match ty.quantity {
                        Quantity::TumblingAngles => ReducedValue::Vector(fit.tumbling_angles()),
                        Quantity::Diameters => ReducedValue::Vector(fit.diameters()),
                        Quantity::SymmetryDeviation => ReducedValue::Scalar(fit.symmetry_deviation()),
                        Quantity::TaylorIndex => ReducedValue::Scalar(fit.taylor_index()),
                        _ => continue,
                    };
                    quantities.values.insert(*ty, value);
                }
            } else {
                log::warn!("cell {}: no ellipsoid fit, derived quantities omitted", cell_id);
            }
        }

        quantities
    }

    pub fn get(&self, ty: ReductionType) -> Option<&ReducedValue> {
        self.values.get(&ty)
    }

    pub fn scalar(&self, ty: ReductionType) -> Option<f64> {
        self.get(ty).and_then(ReducedValue::as_scalar)
    }

    pub fn vector(&self, ty: ReductionType) -> Option<DVec3> {
        self.get(ty).and_then(ReducedValue::as_vector)
    }

    /// All available quantities in code order
    pub fn iter(&self) -> impl Iterator<Item = (&ReductionType, &ReducedValue)> {
        self.values.iter()
    }

    pub fn volume(&self) -> Option<f64> {
        self.scalar(ReductionType::VOLUME)
    }

    pub fn surface(&self) -> Option<f64> {
        self.scalar(ReductionType::SURFACE)
    }

    pub fn position(&self) -> Option<DVec3> {
        self.vector(ReductionType::POSITION_MEAN)
    }

    pub fn velocity(&self) -> Option<DVec3> {
        self.vector(ReductionType::VELOCITY_MEAN)
    }

    pub fn energy(&self) -> Option<f64> {
        self.scalar(ReductionType::ENERGY)
    }

    /// Inertia tensor about the centroid of the enclosed volume
    pub fn inertia(&self) -> Option<DMat3> {
        let t = self.get(ReductionType::INERTIA)?.as_tensor()?;
        Some(DMat3::from_cols_array(&[t[0], t[3], t[6], t[1], t[4], t[7], t[2], t[5], t[8]]))
    }

    /// Centroid of the enclosed volume
    pub fn volume_centroid(&self) -> Option<DVec3> {
        let t = self.get(ReductionType::INERTIA)?.as_tensor()?;
        Some(DVec3::new(t[9], t[10], t[11]))
    }

    pub fn ellipsoid(&self) -> Option<&EllipsoidFit> {
        self.ellipsoid.as_ref()
    }

    pub fn taylor_index(&self) -> Option<f64> {
        self.scalar(ReductionType::TAYLOR_INDEX)
    }

    pub fn tumbling_angles(&self) -> Option<DVec3> {
        self.vector(ReductionType::TUMBLING_ANGLES)
    }

    pub fn diameters(&self) -> Option<DVec3> {
        self.vector(ReductionType::DIAMETERS)
    }
}

/// Turn origin-based volume moments into the inertia tensor about the centroid
///
/// Input: C = ∫x xᵀ dV (row-major) and M = ∫x dV. Output: I = tr(C_c)·1 − C_c
/// with C_c = C − V c cᵀ and c = M/V, followed by c.
fn centroidal_inertia(raw: &[f64; MOMENT_COMPONENTS], volume: f64) -> [f64; MOMENT_COMPONENTS] {
    let first = DVec3::new(raw[9], raw[10], raw[11]);
    let c = if volume != 0.0 { first / volume } else { DVec3::ZERO };

    let mut out = [0.0; MOMENT_COMPONENTS];
    let mut second = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            second[i][j] = raw[3 * i + j] - volume * c[i] * c[j];
        }
    }
    let trace = second[0][0] + second[1][1] + second[2][2];
    for i in 0..3 {
        for j in 0..3 {
            let delta = if i == j { trace } else { 0.0 };
            out[3 * i + j] = delta - second[i][j];
        }
    }
    out[9] = c.x;
    out[10] = c.y;
    out[11] = c.z;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduction::types::Statistic;

    #[test]
    fn test_centroidal_shift_of_point_mass_pair() {
        // Two unit volumes at (±1, 0, 0) offset by (5, 0, 0)
        let mut raw = [0.0; MOMENT_COMPONENTS];
        raw[0] = 2.0 * 25.0 + 2.0;
        raw[9] = 10.0;
        let out = centroidal_inertia(&raw, 2.0);
        assert!((out[0]).abs() < 1e-12);
        assert!((out[4] - 2.0).abs() < 1e-12);
        assert!((out[8] - 2.0).abs() < 1e-12);
        assert!((out[9] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_torque_shifted_to_center() {
        let mut partials = BTreeMap::new();
        let mut push = |ty: ReductionType, value: ReducedValue| {
            let mut p = Partial::new(ty);
            p.push(ty.statistic, value);
            partials.insert(ty, p);
        };
        let center = DVec3::new(1.0, 0.0, 0.0);
        let force = DVec3::new(0.0, 2.0, 0.0);
        push(ReductionType::POSITION_MEAN, center.into());
        push(ReductionType::FORCE, force.into());
        // A force through the centre has no torque about it
        push(ReductionType::TORQUE, center.cross(force).into());

        let q = CellQuantities::finalize(4, 1, partials, &[ReductionType::TORQUE]);
        assert!(q.vector(ReductionType::TORQUE).unwrap().length() < 1e-12);
        assert_eq!(ReductionType::TORQUE.statistic, Statistic::Sum);
    }
}
