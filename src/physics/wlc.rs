//! Worm-like chain link with a power-law repulsion.
//!
//! Each mesh edge is a coarse-grained spectrin link. With x = r/L_max:
//!
//! F_WLC = k · x(4x² − 9x + 6)/(1 − x)²        (attractive)
//! F_rep = k_rep / r²                           (repulsive)
//! k_rep = k · L_max² · x₀³(6 − 9x₀ + 4x₀²)/(1 − x₀)²,  x₀ = L₀/L_max
//!
//! k_rep is chosen so both terms cancel at the rest length. The matching
//! potential is U = k · L_max · (3x² − 2x³)/(1 − x) + k_rep/r.
//!
//! Reference: Fedosov, Caswell & Karniadakis, "A multiscale red blood cell
//! model with accurate mechanics, rheology, and dynamics", Biophys J 2010.
//! Reference: Marko & Siggia, Macromolecules 1995

use glam::DVec3;

/// Extension ratio beyond which the chain force stops growing
///
/// The WLC term diverges at x = 1; capping keeps forces finite for
/// transiently overstretched links. Past the cap the chain potential grows
/// linearly with the capped force, so energy and force stay consistent.
pub const MAX_RELATIVE_EXTENSION: f64 = 0.99;

/// Rest geometry of one link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WlcLink {
    /// Rest length L₀ (lattice units)
    pub rest_length: f64,
    /// Maximum extension L_max = L₀ · ratio (lattice units)
    pub max_length: f64,
    /// Repulsion coefficient k_rep (lattice force × length²)
    pub repulsion: f64,
}

impl WlcLink {
    /// Link balanced at `rest_length` for a chain of stiffness `k_in_plane`
    pub fn new(rest_length: f64, eq_length_ratio: f64, k_in_plane: f64) -> Self {
        let max_length = rest_length * eq_length_ratio;
        let x0 = 1.0 / eq_length_ratio;
        let repulsion = k_in_plane * max_length * max_length * x0.powi(3) * (6.0 - 9.0 * x0 + 4.0 * x0 * x0)
            / ((1.0 - x0) * (1.0 - x0));
        Self {
            rest_length,
            max_length,
            repulsion,
        }
    }

    fn chain_force(k_in_plane: f64, x: f64) -> f64 {
        k_in_plane * x * (4.0 * x * x - 9.0 * x + 6.0) / ((1.0 - x) * (1.0 - x))
    }

    fn chain_potential(&self, k_in_plane: f64, x: f64) -> f64 {
        k_in_plane * self.max_length * (3.0 * x * x - 2.0 * x * x * x) / (1.0 - x)
    }

    /// Scalar attractive force minus repulsion at length r (positive pulls together)
    pub fn tension(&self, k_in_plane: f64, r: f64) -> f64 {
        let x = (r / self.max_length).min(MAX_RELATIVE_EXTENSION);
        Self::chain_force(k_in_plane, x) - self.repulsion / (r * r)
    }

    /// Link potential at length r
    pub fn potential(&self, k_in_plane: f64, r: f64) -> f64 {
        let x = r / self.max_length;
        let chain = if x > MAX_RELATIVE_EXTENSION {
            let overshoot = r - MAX_RELATIVE_EXTENSION * self.max_length;
            self.chain_potential(k_in_plane, MAX_RELATIVE_EXTENSION)
                + Self::chain_force(k_in_plane, MAX_RELATIVE_EXTENSION) * overshoot
        } else {
            self.chain_potential(k_in_plane, x)
        };
        chain + self.repulsion / r
    }

    /// Force on the first endpoint and the link potential
    ///
    /// The second endpoint receives the negated force. Coincident endpoints
    /// produce no force.
    pub fn force_on_first(&self, k_in_plane: f64, xi: DVec3, xj: DVec3) -> (DVec3, f64) {
        let d = xj - xi;
        let r = d.length();
        if r <= f64::EPSILON {
            return (DVec3::ZERO, 0.0);
        }
        (self.tension(k_in_plane, r) * d / r, self.potential(k_in_plane, r))
    }
}
