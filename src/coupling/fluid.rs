//! Fluid-side interface of the immersed-boundary coupling.
//!
//! The lattice-Boltzmann solver is an external collaborator. The core only
//! reads velocities and adds into the external-force accumulator of lattice
//! nodes, through the [`FluidBlock`] trait. One block covers a partition's
//! bulk plus its envelope.

use glam::{DVec3, IVec3};

/// Inclusive box of lattice nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeBox {
    pub min: IVec3,
    pub max: IVec3,
}

impl LatticeBox {
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Number of nodes along each axis
    pub fn extent(&self) -> IVec3 {
        (self.max - self.min + IVec3::ONE).max(IVec3::ZERO)
    }

    pub fn num_nodes(&self) -> usize {
        let e = self.extent();
        e.x as usize * e.y as usize * e.z as usize
    }

    pub fn contains(&self, node: IVec3) -> bool {
        node.cmpge(self.min).all() && node.cmple(self.max).all()
    }

    /// The nearest node of a position lies in the box
    pub fn contains_point(&self, position: DVec3) -> bool {
        self.contains(position.round().as_ivec3())
    }

    /// Box grown by `width` nodes on every side
    pub fn enlarge(&self, width: i32) -> Self {
        Self {
            min: self.min - IVec3::splat(width),
            max: self.max + IVec3::splat(width),
        }
    }

    pub fn intersects(&self, other: &LatticeBox) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Linear index of a node inside the box, x fastest
    pub fn index(&self, node: IVec3) -> Option<usize> {
        if !self.contains(node) {
            return None;
        }
        let e = self.extent();
        let d = node - self.min;
        Some(d.x as usize + e.x as usize * (d.y as usize + e.y as usize * d.z as usize))
    }
}

/// Lattice fluid data visible to one partition
pub trait FluidBlock {
    /// Nodes the block has storage for (bulk plus envelope)
    fn bounds(&self) -> LatticeBox;

    /// Fluid velocity at a node inside `bounds`
    fn velocity(&self, node: IVec3) -> DVec3;

    /// Add into the external-force accumulator of a node inside `bounds`
    fn add_force(&mut self, node: IVec3, force: DVec3);
}

/// Block storing velocities and forces in flat arrays
///
/// Used by the diagnostics to prescribe a flow field and by tests; a
/// lattice-Boltzmann solver implements [`FluidBlock`] on its own storage.
#[derive(Debug, Clone)]
pub struct DenseFluidBlock {
    bounds: LatticeBox,
    velocity: Vec<DVec3>,
    force: Vec<DVec3>,
}

impl DenseFluidBlock {
    pub fn new(bounds: LatticeBox) -> Self {
        let n = bounds.num_nodes();
        Self {
            bounds,
            velocity: vec![DVec3::ZERO; n],
            force: vec![DVec3::ZERO; n],
        }
    }

    /// Set every node's velocity from a function of its coordinates
    pub fn set_velocity_field(&mut self, field: impl Fn(IVec3) -> DVec3) {
        let b = self.bounds;
        for z in b.min.z..=b.max.z {
            for y in b.min.y..=b.max.y {
                for x in b.min.x..=b.max.x {
                    let node = IVec3::new(x, y, z);
                    if let Some(i) = b.index(node) {
                        self.velocity[i] = field(node);
                    }
                }
            }
        }
    }

    pub fn force(&self, node: IVec3) -> DVec3 {
        self.bounds.index(node).map_or(DVec3::ZERO, |i| self.force[i])
    }

    /// Sum of all accumulated forces
    pub fn total_force(&self) -> DVec3 {
        self.force.iter().copied().sum()
    }

    /// Zero the force accumulator, as the fluid solver does after collision
    pub fn clear_forces(&mut self) {
        self.force.fill(DVec3::ZERO);
    }
}

impl FluidBlock for DenseFluidBlock {
    fn bounds(&self) -> LatticeBox {
        self.bounds
    }

    fn velocity(&self, node: IVec3) -> DVec3 {
        self.bounds.index(node).map_or(DVec3::ZERO, |i| self.velocity[i])
    }

    fn add_force(&mut self, node: IVec3, force: DVec3) {
        if let Some(i) = self.bounds.index(node) {
            self.force[i] += force;
        }
    }
}
