//! Membrane force laws accumulated per cell.
//!
//! Each law loops over the elements of one complete cell and adds into
//! [`CellForces`]. Pairwise and per-triangle laws are translation invariant,
//! so their forces sum to zero over a closed cell.
//!
//! Energies:
//! - rest:    ½ k_rest |x − x_anchor|²
//! - bending: ½ k_bend (θ − θ₀)²            per interior edge
//! - area:    ½ (k_shear/Ā₀) (A − A₀)²       per triangle
//! - surface: ½ k_surface (S − S₀)²/S₀       per cell
//! - volume:  ½ k_volume (V − V₀)²/V₀        per cell
//!
//! References:
//! - Helfrich, Z Naturforsch 1973
//! - Fedosov, Caswell & Karniadakis, Biophys J 2010
//! - Závodszky et al., Front Physiol 2017

use glam::DVec3;

use super::model::CellForces;
use super::Equilibrium;
use crate::geometry::primitives;
use crate::state::{CellView, ForceLaw};

/// Anchor spring with velocity damping, only when k_rest is non-zero
pub fn rest_force(cell: &CellView, eq: &Equilibrium, out: &mut CellForces) {
    if eq.k_rest == 0.0 {
        return;
    }
    for v in 0..cell.mesh().num_vertices() {
        let Some(p) = cell.particle(v) else { continue };
        let offset = p.position - p.anchor;
        let force = -eq.k_rest * offset - eq.dissipation.gamma_t * p.velocity;
        out.add(v, ForceLaw::Rest, force, 0.5 * eq.k_rest * offset.length_squared());
    }
}

/// Worm-like chain plus repulsion along every edge
pub fn in_plane_force(cell: &CellView, eq: &Equilibrium, out: &mut CellForces) {
    for (e, edge) in cell.edges().iter().enumerate() {
        let (force, potential) = eq.links[e].force_on_first(eq.k_in_plane, cell.vertex(edge.a), cell.vertex(edge.b));
        out.add(edge.a, ForceLaw::InPlane, force, 0.5 * potential);
        out.add(edge.b, ForceLaw::InPlane, -force, 0.5 * potential);
    }
}

/// Viscous edge friction, only when γ_T is positive
pub fn dissipative_force(cell: &CellView, eq: &Equilibrium, out: &mut CellForces) {
    if !eq.dissipation.is_active() {
        return;
    }
    for edge in cell.edges() {
        let force = eq.dissipation.force_on_first(
            cell.vertex(edge.a),
            cell.vertex(edge.b),
            cell.velocity(edge.a),
            cell.velocity(edge.b),
        );
        out.add(edge.a, ForceLaw::Dissipation, force, 0.0);
        out.add(edge.b, ForceLaw::Dissipation, -force, 0.0);
    }
}

/// Dihedral bending across every interior edge
///
/// Boundary edges have no second triangle and contribute nothing.
pub fn bending_force(cell: &CellView, eq: &Equilibrium, out: &mut CellForces) {
    if eq.k_bend == 0.0 {
        return;
    }
    for (e, edge) in cell.edges().iter().enumerate() {
        let Some(signed) = cell.compute_signed_angle(edge.a, edge.b) else {
            continue;
        };
        let corners = [edge.a, edge.b, signed.k, signed.l];
        let Some(gradient) = primitives::dihedral_gradient(
            cell.vertex(edge.a),
            cell.vertex(edge.b),
            cell.vertex(signed.k),
            cell.vertex(signed.l),
        ) else {
            continue;
        };

        let deviation = signed.angle - eq.edge_angles[e];
        let energy = 0.5 * eq.k_bend * deviation * deviation;
        for (&v, g) in corners.iter().zip(gradient) {
            out.add(v, ForceLaw::Bending, -eq.k_bend * deviation * g, 0.25 * energy);
        }
    }
}

/// Per-triangle area conservation
pub fn local_area_force(cell: &CellView, eq: &Equilibrium, out: &mut CellForces) {
    if eq.k_area == 0.0 {
        return;
    }
    for (t, &tri) in cell.triangles().iter().enumerate() {
        let [x1, x2, x3] = cell.triangle_corners(t);
        let deviation = primitives::triangle_area(x1, x2, x3) - eq.triangle_areas[t];
        let energy = 0.5 * eq.k_area * deviation * deviation;
        for (&v, g) in tri.iter().zip(primitives::area_gradient(x1, x2, x3)) {
            out.add(v, ForceLaw::Area, -eq.k_area * deviation * g, energy / 3.0);
        }
    }
}

/// Global surface conservation distributed through each triangle's area gradient
pub fn surface_force(cell: &CellView, eq: &Equilibrium, surface: f64, out: &mut CellForces) {
    if eq.k_surface == 0.0 {
        return;
    }
    let relative = (surface - eq.rest_surface) / eq.rest_surface;
    for (t, &tri) in cell.triangles().iter().enumerate() {
        let [x1, x2, x3] = cell.triangle_corners(t);
        for (&v, g) in tri.iter().zip(primitives::area_gradient(x1, x2, x3)) {
            out.add(v, ForceLaw::Surface, -eq.k_surface * relative * g, 0.0);
        }
    }
    let energy = 0.5 * eq.k_surface * relative * (surface - eq.rest_surface);
    out.spread_energy(ForceLaw::Surface, energy);
}

/// Global volume conservation through each triangle's signed-volume gradient
pub fn volume_force(cell: &CellView, eq: &Equilibrium, volume: f64, out: &mut CellForces) {
    if eq.k_volume == 0.0 {
        return;
    }
    let relative = (volume - eq.rest_volume) / eq.rest_volume;
    for (t, &tri) in cell.triangles().iter().enumerate() {
        let [x1, x2, x3] = cell.triangle_corners(t);
        for (&v, g) in tri.iter().zip(primitives::volume_gradient(x1, x2, x3)) {
            out.add(v, ForceLaw::Volume, -eq.k_volume * relative * g, 0.0);
        }
    }
    let energy = 0.5 * eq.k_volume * relative * (volume - eq.rest_volume);
    out.spread_energy(ForceLaw::Volume, energy);
}

/// Net force over a cell, used by diagnostics and tests
pub fn net_force(forces: &[DVec3]) -> DVec3 {
    forces.iter().copied().sum()
}
