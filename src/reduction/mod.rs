//! Per-cell quantity reduction over partitioned particles.
//!
//! ## Pipeline
//! ```text
//! partition 0 ─┐  reduce_cell     ┌──────────────────┐  merge      ┌────────────────┐
//! partition 1 ─┼────────────────► │ ReductionParticle│ ──────────► │ CellQuantities │
//! partition n ─┘  (owned only)    │ per (proc, cell) │  dedup key  │ + ellipsoid    │
//!                                 └──────────────────┘ (proc,cell) └────────────────┘
//! ```

pub mod ellipsoid;
pub mod pipeline;
pub mod quantities;
pub mod statistics;
pub mod types;

pub use ellipsoid::EllipsoidFit;
pub use pipeline::{merge, reduce_cell, required_types, ReductionParticle};
pub use quantities::CellQuantities;
pub use statistics::{Partial, ReducedValue};
pub use types::{Dimension, Quantity, ReductionType, Statistic};
