//! Cell fields: species-level orchestration over spatial partitions.

mod cell_field;
mod partition;
mod stretching;

pub use cell_field::{CellField, CellFields};
pub use partition::{decompose, Partition, MAX_NEIGHBOURS, TYPICAL_NEIGHBOURS};
pub use stretching::{StretchMeasurement, StretchingForce};
