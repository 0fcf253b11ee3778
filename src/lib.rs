//! Ficsion - cell membrane mechanics and immersed-boundary coupling
//!
//! This library computes membrane forces of deformable blood cells,
//! exchanges forces and velocities with a lattice fluid through the
//! immersed-boundary method, and reduces per-cell quantities across spatial
//! partitions.

pub mod config;
pub mod coupling;
pub mod error;
pub mod field;
pub mod geometry;
pub mod physics;
pub mod reduction;
pub mod state;

pub use config::{CouplingParameters, Parameters, SpeciesParameters, UnitScaling};
pub use coupling::{DenseFluidBlock, FluidBlock, ImmersedBoundary, InterpolationKernel, LatticeBox};
pub use error::{FicsionError, Result};
pub use field::{decompose, CellField, CellFields, Partition, StretchingForce};
pub use geometry::{MeshMetrics, ReferenceMesh};
pub use physics::{Equilibrium, MembraneModel};
pub use reduction::{CellQuantities, EllipsoidFit, ReductionType};
pub use state::{CellId, CellView, VertexParticle};
