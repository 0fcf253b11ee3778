//! Particle position update.
//!
//! Vertex particles follow the interpolated fluid velocity (no inertia):
//!
//! Euler:            x(t + Δt) = x(t) + Δt · v(t)
//! Adams-Bashforth:  x(t + Δt) = x(t) + Δt · (1.5 v(t) − 0.5 v(t − Δt))
//!
//! Δt is the number of fluid steps covered by one particle update.

use crate::config::UpdateScheme;
use crate::state::VertexParticle;

/// Advances particle positions from their velocities
#[derive(Debug, Clone, Copy)]
pub struct ParticleIntegrator {
    pub scheme: UpdateScheme,
    /// Fluid steps per particle update
    pub time_step: f64,
}

impl ParticleIntegrator {
    pub fn new(scheme: UpdateScheme, time_step: f64) -> Self {
        Self { scheme, time_step }
    }

    /// Move one particle and invalidate its stencil
    pub fn advance(&self, particle: &mut VertexParticle) {
        let velocity = match self.scheme {
            UpdateScheme::Euler => particle.velocity,
            UpdateScheme::AdamsBashforth => 1.5 * particle.velocity - 0.5 * particle.velocity_previous,
        };
        particle.displace(velocity * self.time_step);
    }

    /// Move a batch of particles
    pub fn advance_all(&self, particles: &mut [VertexParticle]) {
        for particle in particles {
            self.advance(particle);
        }
    }
}

impl Default for ParticleIntegrator {
    fn default() -> Self {
        Self::new(UpdateScheme::Euler, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_euler_step() {
        let mut p = VertexParticle::new(0, 0, 1, DVec3::ZERO);
        p.velocity = DVec3::new(0.1, 0.0, -0.2);
        ParticleIntegrator::new(UpdateScheme::Euler, 2.0).advance(&mut p);
        assert!((p.position - DVec3::new(0.2, 0.0, -0.4)).length() < 1e-15);
    }

    #[test]
    fn test_adams_bashforth_step() {
        let mut p = VertexParticle::new(0, 0, 1, DVec3::ZERO);
        p.velocity = DVec3::new(0.2, 0.0, 0.0);
        p.velocity_previous = DVec3::new(0.1, 0.0, 0.0);
        ParticleIntegrator::new(UpdateScheme::AdamsBashforth, 1.0).advance(&mut p);
        assert!((p.position.x - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_advance_clears_stencil() {
        let mut p = VertexParticle::new(0, 0, 1, DVec3::ZERO);
        p.stencil.nodes.push(glam::IVec3::ZERO);
        p.stencil.weights.push(1.0);
        ParticleIntegrator::default().advance_all(std::slice::from_mut(&mut p));
        assert!(p.stencil.is_empty());
    }
}
