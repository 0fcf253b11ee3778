//! Error types for the membrane mechanics and coupling core.
//!
//! Fatal conditions (degenerate geometry, broken partition structure, stencil
//! access outside the fluid block) are returned as `Err` from the orchestration
//! operations. Recoverable conditions such as incomplete cells or missing
//! particle tags are reported through return values and the log instead.

use glam::IVec3;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, FicsionError>;

/// Errors raised by the membrane core
#[derive(Error, Debug)]
pub enum FicsionError {
    /// Reference mesh is empty or encloses no volume
    #[error("degenerate reference mesh: {reason}")]
    DegenerateMesh { reason: String },

    /// An edge shared by more than two triangles, or by two triangles with the same winding
    #[error("non-manifold edge ({a}, {b}) at triangle {triangle}")]
    NonManifoldEdge { a: usize, b: usize, triangle: usize },

    /// Cell volume or surface collapsed during force computation
    #[error(
        "cell {cell_id} on partition {partition} has non-positive geometry: volume {volume:e}, surface {surface:e}"
    )]
    NonPositiveCellGeometry {
        cell_id: u32,
        partition: usize,
        volume: f64,
        surface: f64,
    },

    /// Interpolation stencil reaches outside the allocated fluid block
    #[error("stencil of particle {tag} reaches node {node} outside the fluid block of partition {partition}")]
    StencilOutOfBounds {
        tag: u64,
        node: IVec3,
        partition: usize,
    },

    /// Neighbour count above the architectural maximum
    #[error("partition {partition} has {count} neighbours, maximum is {max}")]
    TooManyNeighbours {
        partition: usize,
        count: usize,
        max: usize,
    },

    /// Interpolation kernel selector outside 1-4
    #[error("unknown interpolation kernel {0}, expected 1-4")]
    InvalidKernel(u8),

    /// Configuration value rejected by validation
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Fluid blocks do not line up with partitions
    #[error("{blocks} fluid blocks supplied for {partitions} partitions")]
    MismatchedFluidBlocks { partitions: usize, blocks: usize },

    /// Cell data does not match the reference mesh
    #[error("cell {cell_id}: expected {expected} vertices, got {provided}")]
    VertexCountMismatch {
        cell_id: u32,
        expected: usize,
        provided: usize,
    },

    /// Reading a configuration file failed
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a configuration file failed
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl FicsionError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
