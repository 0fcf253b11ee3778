//! Evans-Fung parametric profile of the biconcave red blood cell.
//!
//! The full thickness at normalised radius ρ = r/R is
//! D(ρ) = R · √(1 − ρ²) · (C₀ + C₂ρ² + C₄ρ⁴)
//!
//! Reference: Evans E, Fung YC. "Improved measurements of the erythrocyte
//! geometry." Microvasc Res, 1972.
//!
//! Parameters for a normal human RBC:
//! - R = 3.91 μm (cell radius)
//! - C₀ = 0.207, C₂ = 2.003, C₄ = −1.123 (dimensionless)

use glam::DVec3;

/// Biconcave disc profile
#[derive(Debug, Clone, Copy)]
pub struct FungTong {
    /// Cell radius, in whatever length unit the mesh is built in
    pub radius: f64,
    /// C₀ coefficient (dimensionless)
    pub c0: f64,
    /// C₂ coefficient (dimensionless)
    pub c2: f64,
    /// C₄ coefficient (dimensionless)
    pub c4: f64,
}

impl FungTong {
    /// Normal human RBC scaled to the given radius
    pub fn with_radius(radius: f64) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Half-thickness at radial distance r (zero at and beyond the rim)
    pub fn half_thickness(&self, r: f64) -> f64 {
        if r >= self.radius {
            return 0.0;
        }
        let rho2 = (r / self.radius).powi(2);
        0.5 * self.radius * (1.0 - rho2).sqrt() * (self.c0 + self.c2 * rho2 + self.c4 * rho2 * rho2)
    }

    /// Map a point of the unit sphere onto the biconcave surface
    ///
    /// The in-plane coordinates scale with the radius; the height follows the
    /// profile on the side of the sphere the point came from, which preserves
    /// triangle winding.
    pub fn map_unit_sphere(&self, p: DVec3) -> DVec3 {
        let rho2 = (p.x * p.x + p.y * p.y).min(1.0);
        let profile = 0.5 * (1.0 - rho2).sqrt() * (self.c0 + self.c2 * rho2 + self.c4 * rho2 * rho2);
        DVec3::new(
            self.radius * p.x,
            self.radius * p.y,
            self.radius * profile * p.z.signum(),
        )
    }

    /// Radial position of maximum thickness, by sampling
    pub fn radius_of_max_thickness(&self) -> f64 {
        let steps = 200;
        (0..=steps)
            .map(|i| i as f64 / steps as f64 * self.radius)
            .fold((0.0, 0.0), |(best_r, best_z), r| {
                let z = self.half_thickness(r);
                if z > best_z {
                    (r, z)
                } else {
                    (best_r, best_z)
                }
            })
            .0
    }
}

impl Default for FungTong {
    fn default() -> Self {
        Self {
            // Evans & Fung, Microvasc Res 1972
            radius: 3.91,
            c0: 0.207_161,
            c2: 2.002_558,
            c4: -1.122_762,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_thickness() {
        let ft = FungTong::default();
        // Dimple thickness about 0.81 μm
        let full = 2.0 * ft.half_thickness(0.0);
        assert!((full - 0.81).abs() < 0.01, "center thickness {}", full);
    }

    #[test]
    fn test_edge_thickness() {
        let ft = FungTong::default();
        assert!(ft.half_thickness(ft.radius).abs() < 1e-12);
    }

    #[test]
    fn test_biconcave_shape() {
        let ft = FungTong::default();
        let r_max = ft.radius_of_max_thickness();
        let ratio = r_max / ft.radius;
        assert!(ratio > 0.5 && ratio < 0.9, "Max thickness at unexpected location: {}", ratio);
        assert!(ft.half_thickness(r_max) > ft.half_thickness(0.0));
    }

    #[test]
    fn test_sphere_mapping_keeps_side() {
        let ft = FungTong::with_radius(2.0);
        let top = ft.map_unit_sphere(DVec3::new(0.0, 0.0, 1.0));
        let bottom = ft.map_unit_sphere(DVec3::new(0.0, 0.0, -1.0));
        assert!(top.z > 0.0 && bottom.z < 0.0);
        assert!((top.z + bottom.z).abs() < 1e-12);
    }
}
