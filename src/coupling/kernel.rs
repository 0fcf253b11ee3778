//! Immersed-boundary interpolation kernels.
//!
//! The 3D weight of lattice node n for a particle at x is the product of
//! one-dimensional weights φ(xₐ − nₐ) over the three axes. Every kernel is
//! normalised: the weights of a stencil sum to one.
//!
//! | Selector | Kernel            | Nodes/axis | φ(r)                                       |
//! |----------|-------------------|------------|--------------------------------------------|
//! | 1        | linear            | 2          | 1 − \|r\|                                  |
//! | 2        | cosine            | 4          | ¼(1 + cos(πr/2))                           |
//! | 3        | Roma 3-point      | 3          | (1 + √(1 − 3r²))/3, (5 − 3\|r\| − √(1 − 3(1 − \|r\|)²))/6 |
//! | 4        | Peskin 4-point    | 4          | (3 − 2\|r\| + √(1 + 4\|r\| − 4r²))/8, (5 − 2\|r\| − √(−7 + 12\|r\| − 4r²))/8 |
//!
//! References:
//! - Peskin, "The immersed boundary method", Acta Numerica 2002
//! - Roma, Peskin & Berger, J Comput Phys 1999

use std::f64::consts::PI;

use glam::{DVec3, IVec3};

use crate::error::{FicsionError, Result};
use crate::state::Stencil;

/// Weight function and support of the particle–lattice interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationKernel {
    Linear,
    Cosine,
    Roma3,
    Peskin4,
}

impl InterpolationKernel {
    /// Kernel from its configuration selector (1–4)
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(Self::Linear),
            2 => Ok(Self::Cosine),
            3 => Ok(Self::Roma3),
            4 => Ok(Self::Peskin4),
            other => Err(FicsionError::InvalidKernel(other)),
        }
    }

    pub fn selector(&self) -> u8 {
        match self {
            Self::Linear => 1,
            Self::Cosine => 2,
            Self::Roma3 => 3,
            Self::Peskin4 => 4,
        }
    }

    /// Nodes per axis
    pub fn width(&self) -> usize {
        match self {
            Self::Linear => 2,
            Self::Roma3 => 3,
            Self::Cosine | Self::Peskin4 => 4,
        }
    }

    /// Largest distance from a particle to a node of its stencil, in nodes
    pub fn reach(&self) -> i32 {
        match self {
            Self::Linear | Self::Roma3 => 1,
            Self::Cosine | Self::Peskin4 => 2,
        }
    }

    /// One-dimensional weight at signed distance r
    pub fn weight(&self, r: f64) -> f64 {
        let r = r.abs();
        match self {
            Self::Linear => (1.0 - r).max(0.0),
            Self::Cosine => {
                if r <= 2.0 {
                    0.25 * (1.0 + (PI * r / 2.0).cos())
                } else {
                    0.0
                }
            }
            Self::Roma3 => {
                if r <= 0.5 {
                    (1.0 + (1.0 - 3.0 * r * r).sqrt()) / 3.0
                } else if r <= 1.5 {
                    let s = 1.0 - r;
                    (5.0 - 3.0 * r - (1.0 - 3.0 * s * s).max(0.0).sqrt()) / 6.0
                } else {
                    0.0
                }
            }
            Self::Peskin4 => {
                if r <= 1.0 {
                    (3.0 - 2.0 * r + (1.0 + 4.0 * r - 4.0 * r * r).sqrt()) / 8.0
                } else if r <= 2.0 {
                    (5.0 - 2.0 * r - (-7.0 + 12.0 * r - 4.0 * r * r).max(0.0).sqrt()) / 8.0
                } else {
                    0.0
                }
            }
        }
    }

    /// First node and weights along one axis
    fn axis(&self, x: f64) -> (i32, [f64; 4]) {
        let first = match self {
            Self::Linear => x.floor() as i32,
            Self::Roma3 => x.round() as i32 - 1,
            Self::Cosine | Self::Peskin4 => x.floor() as i32 - 1,
        };
        let mut weights = [0.0; 4];
        for (i, w) in weights.iter_mut().take(self.width()).enumerate() {
            *w = self.weight(x - (first + i as i32) as f64);
        }
        (first, weights)
    }

    /// Fill `stencil` with the nodes and weights for a particle at `position`
    ///
    /// Nodes with zero weight are kept so the stencil always has width³ entries.
    pub fn stencil_into(&self, position: DVec3, stencil: &mut Stencil) {
        stencil.clear();
        let width = self.width();
        let (fx, wx) = self.axis(position.x);
        let (fy, wy) = self.axis(position.y);
        let (fz, wz) = self.axis(position.z);

        for i in 0..width {
            for j in 0..width {
                for k in 0..width {
                    stencil
                        .nodes
                        .push(IVec3::new(fx + i as i32, fy + j as i32, fz + k as i32));
                    stencil.weights.push(wx[i] * wy[j] * wz[k]);
                }
            }
        }
    }

    pub fn stencil(&self, position: DVec3) -> Stencil {
        let mut stencil = Stencil::default();
        self.stencil_into(position, &mut stencil);
        stencil
    }
}
