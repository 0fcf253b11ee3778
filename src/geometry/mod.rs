//! Geometry module for the reference membrane meshes.
//!
//! Contains the immutable triangulated topology shared by all cells of a
//! species, its static metrics, the triangle/dihedral primitives used by the
//! force laws, and the Evans-Fung biconcave profile.

mod fung_tong;
mod mesh;
mod metrics;
pub mod primitives;
pub mod shapes;

pub use fung_tong::FungTong;
pub use mesh::{MeshEdge, ReferenceMesh};
pub use metrics::MeshMetrics;
