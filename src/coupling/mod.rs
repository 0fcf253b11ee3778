//! Immersed-boundary coupling between membrane particles and the fluid lattice.
//!
//! ## Data Flow
//! ```text
//! Membrane forces                         Fluid lattice
//!        │                                       ▲
//!        ▼            spread_force               │
//! ┌──────────────┐ ─────────────────────► ┌──────────────┐
//! │  Particles   │   w(n) · F per node    │ FluidBlock   │
//! │  x, v, F     │                        │ u(n), f(n)   │
//! └──────────────┘ ◄───────────────────── └──────────────┘
//!                   interpolate_velocity
//!                   v = Σ w(n) · u(n)
//! ```
//!
//! ## References
//! - Peskin, Acta Numerica 2002
//! - Roma, Peskin & Berger, J Comput Phys 1999

pub mod fluid;
pub mod ibm;
pub mod kernel;

pub use fluid::{DenseFluidBlock, FluidBlock, LatticeBox};
pub use ibm::ImmersedBoundary;
pub use kernel::InterpolationKernel;
