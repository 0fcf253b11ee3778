//! Vertex particles: one mesh vertex embedded in the fluid lattice.
//!
//! Positions and velocities are in lattice units; forces are in lattice force
//! units (dm·dx/dt²). The vertex index and cell id are fixed at creation.

use glam::{DVec3, IVec3};

/// Identifier of one logical cell
pub type CellId = u32;

/// Membrane force laws, in the order they are accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceLaw {
    Rest,
    InPlane,
    Dissipation,
    Bending,
    Area,
    Surface,
    Volume,
}

/// Per-force-law accumulators, kept only when breakdown recording is enabled
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceBreakdown<T> {
    pub rest: T,
    pub in_plane: T,
    pub dissipation: T,
    pub bending: T,
    pub area: T,
    pub surface: T,
    pub volume: T,
}

impl<T> ForceBreakdown<T> {
    pub fn get_mut(&mut self, law: ForceLaw) -> &mut T {
        match law {
            ForceLaw::Rest => &mut self.rest,
            ForceLaw::InPlane => &mut self.in_plane,
            ForceLaw::Dissipation => &mut self.dissipation,
            ForceLaw::Bending => &mut self.bending,
            ForceLaw::Area => &mut self.area,
            ForceLaw::Surface => &mut self.surface,
            ForceLaw::Volume => &mut self.volume,
        }
    }
}

impl ForceBreakdown<f64> {
    pub fn total(&self) -> f64 {
        self.rest + self.in_plane + self.dissipation + self.bending + self.area + self.surface + self.volume
    }
}

impl ForceBreakdown<DVec3> {
    pub fn total(&self) -> DVec3 {
        self.rest + self.in_plane + self.dissipation + self.bending + self.area + self.surface + self.volume
    }
}

/// Per-law energy accumulators
pub type EnergyBreakdown = ForceBreakdown<f64>;

/// Interpolation stencil: lattice nodes and their kernel weights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stencil {
    pub nodes: Vec<IVec3>,
    pub weights: Vec<f64>,
}

impl Stencil {
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, f64)> + '_ {
        self.nodes.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.weights.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Debug accumulators for one particle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdown {
    pub force: ForceBreakdown<DVec3>,
    pub energy: EnergyBreakdown,
}

/// One mesh vertex tracked as a Lagrangian point
#[derive(Debug, Clone, PartialEq)]
pub struct VertexParticle {
    /// Globally unique tag, `cell_id · vertices_per_cell + vertex_index`
    pub tag: u64,
    pub cell_id: CellId,
    /// Position within the cell's reference topology
    pub vertex_index: usize,
    /// Position (lattice units)
    pub position: DVec3,
    /// Velocity (lattice units per step)
    pub velocity: DVec3,
    /// Velocity of the previous step, for multistep updates
    pub velocity_previous: DVec3,
    /// Accumulated force for the current step
    pub force: DVec3,
    /// Position the rest spring pulls towards
    pub anchor: DVec3,
    /// Potential energy attributed to this vertex
    pub energy: f64,
    /// Interpolation stencil under the current position; empty when stale
    pub stencil: Stencil,
    pub breakdown: Option<Box<Breakdown>>,
}

impl VertexParticle {
    pub fn new(cell_id: CellId, vertex_index: usize, vertices_per_cell: usize, position: DVec3) -> Self {
        Self {
            tag: cell_id as u64 * vertices_per_cell as u64 + vertex_index as u64,
            cell_id,
            vertex_index,
            position,
            velocity: DVec3::ZERO,
            velocity_previous: DVec3::ZERO,
            force: DVec3::ZERO,
            anchor: position,
            energy: 0.0,
            stencil: Stencil::default(),
            breakdown: None,
        }
    }

    /// Lattice node closest to the particle
    pub fn nearest_node(&self) -> IVec3 {
        self.position.round().as_ivec3()
    }

    /// Move the particle, invalidating its cached stencil
    pub fn displace(&mut self, displacement: DVec3) {
        self.position += displacement;
        self.stencil.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_unique_per_vertex() {
        let a = VertexParticle::new(3, 5, 12, DVec3::ZERO);
        let b = VertexParticle::new(3, 6, 12, DVec3::ZERO);
        let c = VertexParticle::new(4, 5, 12, DVec3::ZERO);
        assert_eq!(a.tag, 41);
        assert_ne!(a.tag, b.tag);
        assert_ne!(a.tag, c.tag);
    }

    #[test]
    fn test_displace_invalidates_stencil() {
        let mut p = VertexParticle::new(0, 0, 1, DVec3::new(1.2, 2.6, 3.5));
        p.stencil.nodes.push(IVec3::new(1, 3, 4));
        p.stencil.weights.push(1.0);
        p.displace(DVec3::X);
        assert!(p.stencil.is_empty());
        assert_eq!(p.nearest_node(), IVec3::new(2, 3, 4));
    }
}
