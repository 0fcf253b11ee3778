//! Viscous membrane dissipation along mesh edges.
//!
//! For an edge with unit direction ê and relative velocity v_ij = v_i − v_j:
//!
//! F_i = −γ_T · v_ij − γ_C · (v_ij · ê) ê,   F_j = −F_i
//!
//! Both coefficients derive from the membrane viscosity η_m:
//! γ_T = 12 η_m / (13√3),  γ_C = γ_T / 3
//!
//! Reference: Fedosov, Caswell & Karniadakis, Biophys J 2010 (eq. 14)
//! Reference: Español & Warren, Europhys Lett 1995

use glam::DVec3;

/// Dissipation coefficients in lattice units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dissipation {
    /// Translational coefficient γ_T
    pub gamma_t: f64,
    /// Central (edge-aligned) coefficient γ_C
    pub gamma_c: f64,
}

impl Dissipation {
    /// Coefficients from a membrane viscosity in lattice units
    pub fn from_viscosity(eta_m: f64) -> Self {
        let gamma_t = eta_m * 12.0 / (13.0 * 3.0_f64.sqrt());
        Self {
            gamma_t,
            gamma_c: gamma_t / 3.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.gamma_t > 0.0
    }

    /// Force on the first endpoint; the second receives the negation
    pub fn force_on_first(&self, xi: DVec3, xj: DVec3, vi: DVec3, vj: DVec3) -> DVec3 {
        let e = (xj - xi).normalize_or_zero();
        let v_ij = vi - vj;
        -self.gamma_t * v_ij - self.gamma_c * v_ij.dot(e) * e
    }
}
