//! Rest quantities and lattice-unit stiffness coefficients of a species.
//!
//! Computed once from the reference mesh and the dimensional input
//! parameters; never modified during a run.
//!
//! Unit conversion (kBT_p = 4.100531391e-21 J, L₀ = mean rest edge length):
//! - kBT = kBT_p / (dm·dx²/dt²)
//! - k_volume · kBT/L₀³, k_surface · kBT/L₀², k_shear · kBT/L₀², k_bend · kBT
//! - p = p_fine/dx · √((N − 2)/(23867 − 2)), k_inPlane = k_WLC · kBT/(4p)
//! - η_m / (dN·dt/dx), k_stretch / dN, k_rest / (dN/dx), dN = dm·dx/dt²
//!
//! The rest dihedral angle of a closed mesh with N vertices follows from
//! θ₀ = acos((√3(N − 2) − 5π)/(√3(N − 2) − 3π)).
//!
//! Reference: Fedosov, Caswell & Karniadakis, Biophys J 2010
//! Reference: Závodszky et al., Front Physiol 2017

use std::f64::consts::PI;

use crate::config::{EquilibriumMode, SpeciesParameters, UnitScaling};
use crate::error::{FicsionError, Result};
use crate::geometry::{MeshMetrics, ReferenceMesh};

use super::dissipation::Dissipation;
use super::wlc::WlcLink;

/// Vertex count of the full-resolution spectrin network the persistence
/// length was measured on
const FINE_SPECTRIN_VERTICES: f64 = 23867.0;

/// Analytic rest dihedral angle of a closed triangulated sphere with `n` vertices
pub fn equilibrium_angle(num_vertices: usize) -> f64 {
    let s = 3.0_f64.sqrt() * (num_vertices as f64 - 2.0);
    ((s - 5.0 * PI) / (s - 3.0 * PI)).acos()
}

/// Persistence length rescaled to a coarser mesh (lattice units)
pub fn coarse_persistence_length(persistence_length_fine_m: f64, dx_m: f64, num_vertices: usize) -> f64 {
    persistence_length_fine_m / dx_m * ((num_vertices as f64 - 2.0) / (FINE_SPECTRIN_VERTICES - 2.0)).sqrt()
}

/// Species constants in lattice units
#[derive(Debug, Clone)]
pub struct Equilibrium {
    pub mode: EquilibriumMode,
    /// Thermal energy in lattice units
    pub kbt: f64,
    /// Mean rest edge length L₀
    pub rest_length: f64,
    /// Analytic rest dihedral angle θ₀
    pub rest_angle: f64,
    /// Mean rest triangle area
    pub rest_area: f64,
    pub rest_volume: f64,
    pub rest_surface: f64,
    /// Coarse-grained persistence length
    pub persistence_length: f64,
    pub eq_length_ratio: f64,
    pub k_in_plane: f64,
    pub k_bend: f64,
    /// Local area stiffness divided by the mean rest area
    pub k_area: f64,
    pub k_surface: f64,
    pub k_volume: f64,
    pub k_rest: f64,
    /// Converted for completeness; contributes no force
    pub k_stretch: f64,
    pub dissipation: Dissipation,
    /// Rest link per mesh edge
    pub links: Vec<WlcLink>,
    /// Rest dihedral angle per mesh edge (zero on boundary edges)
    pub edge_angles: Vec<f64>,
    /// Rest area per triangle
    pub triangle_areas: Vec<f64>,
}

impl Equilibrium {
    /// Derive rest quantities for a mesh given in lattice units
    pub fn new(species: &SpeciesParameters, units: &UnitScaling, mesh: &ReferenceMesh) -> Result<Self> {
        let metrics = MeshMetrics::new(mesh)?;
        Self::from_metrics(species, units, mesh, &metrics)
    }

    pub fn from_metrics(
        species: &SpeciesParameters,
        units: &UnitScaling,
        mesh: &ReferenceMesh,
        metrics: &MeshMetrics,
    ) -> Result<Self> {
        if metrics.num_vertices < 4 {
            return Err(FicsionError::DegenerateMesh {
                reason: format!("{} vertices cannot enclose a volume", metrics.num_vertices),
            });
        }

        let kbt = units.kbt_lattice();
        let force_unit = units.force_unit_N();
        let l0 = metrics.mean_edge_length;

        let persistence_length =
            coarse_persistence_length(species.persistence_length_fine_m, units.dx_m, metrics.num_vertices);
        let k_in_plane = species.k_wlc * kbt / (4.0 * persistence_length);
        let eta_m = species.eta_m / (force_unit * units.dt_s / units.dx_m);

        let rest_angle = equilibrium_angle(metrics.num_vertices);
        if !rest_angle.is_finite() {
            return Err(FicsionError::DegenerateMesh {
                reason: format!("no equilibrium angle for {} vertices", metrics.num_vertices),
            });
        }

        let (links, edge_angles, triangle_areas) = match species.equilibrium {
            EquilibriumMode::MeanMetric => (
                vec![WlcLink::new(l0, species.eq_length_ratio, k_in_plane); mesh.num_edges()],
                mesh.edges()
                    .iter()
                    .map(|e| if e.is_interior() { rest_angle } else { 0.0 })
                    .collect(),
                vec![metrics.mean_triangle_area; mesh.num_triangles()],
            ),
            EquilibriumMode::ShapeMemory => (
                (0..mesh.num_edges())
                    .map(|e| WlcLink::new(mesh.reference_length(e), species.eq_length_ratio, k_in_plane))
                    .collect(),
                (0..mesh.num_edges())
                    .map(|e| mesh.reference_angle(e).unwrap_or(0.0))
                    .collect(),
                (0..mesh.num_triangles()).map(|t| mesh.reference_area(t)).collect(),
            ),
        };

        let equilibrium = Self {
            mode: species.equilibrium,
            kbt,
            rest_length: l0,
            rest_angle,
            rest_area: metrics.mean_triangle_area,
            rest_volume: metrics.volume,
            rest_surface: metrics.surface,
            persistence_length,
            eq_length_ratio: species.eq_length_ratio,
            k_in_plane,
            k_bend: species.k_bend * kbt,
            k_area: species.k_shear * kbt / (l0 * l0) / metrics.mean_triangle_area,
            k_surface: species.k_surface * kbt / (l0 * l0),
            k_volume: species.k_volume * kbt / (l0 * l0 * l0),
            k_rest: species.k_rest / (force_unit / units.dx_m),
            k_stretch: species.k_stretch / force_unit,
            dissipation: Dissipation::from_viscosity(eta_m),
            links,
            edge_angles,
            triangle_areas,
        };

        log::info!(
            "{} model: {} vertices, L0 = {:.4}, θ0 = {:.4} rad, V0 = {:.3}, S0 = {:.3} ({:?})",
            species.name,
            metrics.num_vertices,
            l0,
            rest_angle,
            metrics.volume,
            metrics.surface,
            species.equilibrium
        );
        log::debug!(
            "{} lattice coefficients: kBT {:e}, p {:e}, k_inPlane {:e}, k_bend {:e}, k_area {:e}, k_surface {:e}, k_volume {:e}, k_rest {:e}, γ_T {:e}",
            species.name,
            kbt,
            persistence_length,
            equilibrium.k_in_plane,
            equilibrium.k_bend,
            equilibrium.k_area,
            equilibrium.k_surface,
            equilibrium.k_volume,
            equilibrium.k_rest,
            equilibrium.dissipation.gamma_t
        );

        Ok(equilibrium)
    }
}
