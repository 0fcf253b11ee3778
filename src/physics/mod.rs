//! Membrane mechanics.
//!
//! This module implements:
//! - Rest-quantity calibration and lattice-unit conversion
//! - Worm-like chain in-plane elasticity with repulsion
//! - Dihedral bending, area, surface and volume conservation
//! - Viscous edge dissipation
//! - Particle position updates
//!
//! References:
//! - Fedosov, Caswell & Karniadakis, Biophys J 2010
//! - Závodszky et al., Front Physiol 2017
//! - Marko & Siggia, Macromolecules 1995

pub mod dissipation;
pub mod equilibrium;
pub mod integrator;
pub mod membrane;
pub mod model;
pub mod wlc;

pub use dissipation::Dissipation;
pub use equilibrium::{coarse_persistence_length, equilibrium_angle, Equilibrium};
pub use integrator::ParticleIntegrator;
pub use model::{CellForces, MembraneModel};
pub use wlc::WlcLink;
