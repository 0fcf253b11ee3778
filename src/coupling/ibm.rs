//! Velocity gather and force scatter between particles and the lattice.
//!
//! Gather (fluid → particle): v = Σ w(n) · u(n) over the particle's stencil.
//! The stencil is cached on the particle and reused until the particle moves.
//!
//! Scatter (particle → fluid): f(n) += w(n) · F for every stencil node. The
//! stencil is always recomputed. Each partition scatters every particle it
//! can see, owned or ghost, but only writes nodes inside its own bulk, so a
//! node receives each particle's contribution exactly once.
//!
//! Reference: Peskin, "The immersed boundary method", Acta Numerica 2002

use glam::DVec3;

use super::{FluidBlock, InterpolationKernel, LatticeBox};
use crate::error::{FicsionError, Result};
use crate::state::{Stencil, VertexParticle};

/// Immersed-boundary exchange with a fixed kernel
#[derive(Debug, Clone, Copy)]
pub struct ImmersedBoundary {
    pub kernel: InterpolationKernel,
}

impl ImmersedBoundary {
    pub fn new(kernel: InterpolationKernel) -> Self {
        Self { kernel }
    }

    /// Set each particle's velocity from the fluid, keeping the previous one
    ///
    /// Fails if a stencil node lies outside the block's storage.
    pub fn interpolate_velocity<B: FluidBlock + ?Sized>(
        &self,
        particles: &mut [VertexParticle],
        fluid: &B,
        partition: usize,
    ) -> Result<()> {
        let bounds = fluid.bounds();
        for particle in particles.iter_mut() {
            if particle.stencil.is_empty() {
                self.kernel.stencil_into(particle.position, &mut particle.stencil);
            }

            let mut velocity = DVec3::ZERO;
            for (node, weight) in particle.stencil.iter() {
                if !bounds.contains(node) {
                    log::error!(
                        "particle {} at {:?} interpolates outside partition {}",
                        particle.tag,
                        particle.position,
                        partition
                    );
                    return Err(FicsionError::StencilOutOfBounds {
                        tag: particle.tag,
                        node,
                        partition,
                    });
                }
                velocity += weight * fluid.velocity(node);
            }

            particle.velocity_previous = particle.velocity;
            particle.velocity = velocity;
        }
        Ok(())
    }

    /// Add each particle's weighted force into the nodes of `region`
    ///
    /// `scratch` holds the recomputed stencil between particles.
    pub fn spread_force<B: FluidBlock + ?Sized>(
        &self,
        particles: &[VertexParticle],
        fluid: &mut B,
        region: &LatticeBox,
        scratch: &mut Stencil,
    ) {
        for particle in particles {
            if particle.force == DVec3::ZERO {
                continue;
            }
            self.kernel.stencil_into(particle.position, scratch);
            for (node, weight) in scratch.iter() {
                if region.contains(node) {
                    fluid.add_force(node, weight * particle.force);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::DenseFluidBlock;
    use glam::IVec3;

    fn block() -> DenseFluidBlock {
        DenseFluidBlock::new(LatticeBox::new(IVec3::ZERO, IVec3::splat(15)))
    }

    #[test]
    fn test_gather_reproduces_linear_field() {
        let mut fluid = block();
        fluid.set_velocity_field(|n| DVec3::new(0.01 * n.y as f64, 0.0, 0.0));
        let ibm = ImmersedBoundary::new(InterpolationKernel::Peskin4);

        let mut particles = vec![VertexParticle::new(0, 0, 1, DVec3::new(7.3, 6.6, 8.1))];
        ibm.interpolate_velocity(&mut particles, &fluid, 0).unwrap();
        assert!((particles[0].velocity.x - 0.066).abs() < 1e-12);
        assert!(!particles[0].stencil.is_empty());
    }

    #[test]
    fn test_gather_keeps_previous_velocity() {
        let mut fluid = block();
        fluid.set_velocity_field(|_| DVec3::Y);
        let ibm = ImmersedBoundary::new(InterpolationKernel::Cosine);
        let mut particles = vec![VertexParticle::new(0, 0, 1, DVec3::splat(7.5))];
        particles[0].velocity = DVec3::X;
        ibm.interpolate_velocity(&mut particles, &fluid, 0).unwrap();
        assert_eq!(particles[0].velocity_previous, DVec3::X);
        assert!((particles[0].velocity - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_gather_out_of_bounds_is_error() {
        let fluid = block();
        let ibm = ImmersedBoundary::new(InterpolationKernel::Peskin4);
        let mut particles = vec![VertexParticle::new(2, 1, 4, DVec3::new(0.5, 7.0, 7.0))];
        let result = ibm.interpolate_velocity(&mut particles, &fluid, 3);
        assert!(matches!(result, Err(FicsionError::StencilOutOfBounds { tag: 9, partition: 3, .. })));
    }

    #[test]
    fn test_scatter_restricted_to_region() {
        let mut fluid = block();
        let ibm = ImmersedBoundary::new(InterpolationKernel::Linear);
        let mut p = VertexParticle::new(0, 0, 1, DVec3::new(7.5, 7.5, 7.5));
        p.force = DVec3::new(0.0, 0.0, 8.0);

        // Only the x ≤ 7 half of the stencil is inside the region
        let region = LatticeBox::new(IVec3::ZERO, IVec3::new(7, 15, 15));
        let mut scratch = Stencil::default();
        ibm.spread_force(std::slice::from_ref(&p), &mut fluid, &region, &mut scratch);
        assert!((fluid.total_force().z - 4.0).abs() < 1e-12);
    }
}
