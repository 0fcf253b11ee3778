//! Equivalent-ellipsoid fit from the inertia tensor of a cell.
//!
//! A uniform solid ellipsoid with semi-axes (a, b, c) and volume V has
//! principal moments
//!
//!   I₁ = V(b² + c²)/5,  I₂ = V(a² + c²)/5,  I₃ = V(a² + b²)/5
//!
//! With fᵢ = 5Iᵢ/V the semi-axes follow as a² = (f₂ + f₃ − f₁)/2 (cyclic).
//! Principal directions are matched to the coordinate axes they are closest
//! to, so an undeformed, unrotated cell reports zero tumbling angles. The
//! semi-axes themselves are reported in ascending order and do not depend on
//! the orientation of the cell.
//!
//! Derived outputs:
//! - tumbling angles: XYZ Euler angles of the principal frame (radians)
//! - diameters: 2·semi-axes, ascending
//! - Taylor deformation index: (D_max − D_min)/(D_max + D_min)
//! - symmetry deviation: smallest gap between sorted principal moments
//!   relative to the largest moment (0 for an axisymmetric shape)

use glam::{DMat3, DQuat, DVec3, EulerRot};
use nalgebra::Matrix3;

/// Ellipsoid with the same volume and inertia as a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsoidFit {
    /// Semi-axes in ascending order
    pub semi_axes: DVec3,
    /// Principal directions as columns, matched to the x, y, z axes
    pub axes: DMat3,
    /// Principal moments along the columns of `axes`
    pub moments: DVec3,
}

impl EllipsoidFit {
    /// Fit from the inertia tensor about the centroid
    ///
    /// Returns `None` for a non-positive volume or a non-finite tensor.
    pub fn from_inertia(inertia: DMat3, volume: f64) -> Option<Self> {
        if volume <= 0.0 || !inertia.is_finite() {
            return None;
        }

        let c = |i: usize, j: usize| inertia.col(j)[i];
        let m = Matrix3::new(
            c(0, 0), c(0, 1), c(0, 2),
            c(1, 0), c(1, 1), c(1, 2),
            c(2, 0), c(2, 1), c(2, 2),
        );
        let eigen = m.symmetric_eigen();
        let vectors: [DVec3; 3] = std::array::from_fn(|k| {
            let v = eigen.eigenvectors.column(k);
            DVec3::new(v[0], v[1], v[2])
        });
        let values: [f64; 3] = std::array::from_fn(|k| eigen.eigenvalues[k]);

        // Greedy matching of principal directions to coordinate axes
        let mut used = [false; 3];
        let mut order = [0usize; 3];
        for axis in 0..3 {
            let mut best = None;
            for (k, v) in vectors.iter().enumerate() {
                if used[k] {
                    continue;
                }
                let score = v[axis].abs();
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((k, score));
                }
            }
            let (k, _) = best?;
            used[k] = true;
            order[axis] = k;
        }

        let mut columns: [DVec3; 3] = std::array::from_fn(|axis| {
            let v = vectors[order[axis]];
            if v[axis] < 0.0 {
                -v
            } else {
                v
            }
        });
        if DMat3::from_cols(columns[0], columns[1], columns[2]).determinant() < 0.0 {
            columns[2] = -columns[2];
        }

        let moments = DVec3::new(values[order[0]], values[order[1]], values[order[2]]);
        let f = moments * 5.0 / volume;
        let mut semi_axes = [
            (0.5 * (f.y + f.z - f.x)).max(0.0).sqrt(),
            (0.5 * (f.x + f.z - f.y)).max(0.0).sqrt(),
            (0.5 * (f.x + f.y - f.z)).max(0.0).sqrt(),
        ];
        semi_axes.sort_by(f64::total_cmp);

        Some(Self {
            semi_axes: DVec3::from_array(semi_axes),
            axes: DMat3::from_cols(columns[0], columns[1], columns[2]),
            moments,
        })
    }

    pub fn diameters(&self) -> DVec3 {
        2.0 * self.semi_axes
    }

    /// XYZ Euler angles of the principal frame
    pub fn tumbling_angles(&self) -> DVec3 {
        let (x, y, z) = DQuat::from_mat3(&self.axes).to_euler(EulerRot::XYZ);
        DVec3::new(x, y, z)
    }

    pub fn taylor_index(&self) -> f64 {
        let d = self.diameters();
        let (max, min) = (d.max_element(), d.min_element());
        if max + min > 0.0 {
            (max - min) / (max + min)
        } else {
            0.0
        }
    }

    pub fn symmetry_deviation(&self) -> f64 {
        let mut m = self.moments.to_array();
        m.sort_by(f64::total_cmp);
        if m[2] <= 0.0 {
            return 0.0;
        }
        (m[1] - m[0]).min(m[2] - m[1]) / m[2]
    }
}
