//! Runtime state of the membrane particles.
//!
//! Vertex particles are owned by partition arenas; cells are transient views
//! rebuilt from the arena every pass.

mod cell;
mod particle;

pub use cell::{CellIndex, CellSlots, CellView, SignedAngle};
pub use particle::{Breakdown, CellId, EnergyBreakdown, ForceBreakdown, ForceLaw, Stencil, VertexParticle};
