//! Partial statistics and their combination rules.
//!
//! | Statistic | Identity | Merge                          |
//! |-----------|----------|--------------------------------|
//! | Sum       | 0        | a + b                          |
//! | Mean      | 0        | (nₐ·a + n_b·b) / (nₐ + n_b)     |
//! | Min       | +∞       | elementwise min                |
//! | Max       | −∞       | elementwise max                |
//!
//! Every partial carries its sample count so means stay exact however the
//! samples are split across partitions.

use glam::DVec3;

use super::types::{Dimension, ReductionType, Statistic};

/// Number of components of an N-dimensional (inertia) value
pub const MOMENT_COMPONENTS: usize = 12;

/// Value of one reduced quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReducedValue {
    Scalar(f64),
    Vector(DVec3),
    /// Inertia moments: second moments row-major, then the first moment
    Tensor([f64; MOMENT_COMPONENTS]),
}

impl ReducedValue {
    /// Neutral element of a reduction type
    pub fn identity(ty: ReductionType) -> Self {
        let fill = match ty.statistic {
            Statistic::Min => f64::INFINITY,
            Statistic::Max => f64::NEG_INFINITY,
            Statistic::Sum | Statistic::Mean | Statistic::Derived => 0.0,
        };
        match ty.dimension {
            Dimension::Scalar => Self::Scalar(fill),
            Dimension::Vector => Self::Vector(DVec3::splat(fill)),
            Dimension::Tensor => Self::Tensor([fill; MOMENT_COMPONENTS]),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<DVec3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&[f64; MOMENT_COMPONENTS]> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Combine componentwise with `other`; mismatched shapes are left untouched
    fn zip_with(&mut self, other: &Self, f: impl Fn(f64, f64) -> f64) {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => *a = f(*a, *b),
            (Self::Vector(a), Self::Vector(b)) => *a = DVec3::new(f(a.x, b.x), f(a.y, b.y), f(a.z, b.z)),
            (Self::Tensor(a), Self::Tensor(b)) => {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x = f(*x, *y);
                }
            }
            _ => {}
        }
    }
}

impl From<f64> for ReducedValue {
    fn from(x: f64) -> Self {
        Self::Scalar(x)
    }
}

impl From<DVec3> for ReducedValue {
    fn from(v: DVec3) -> Self {
        Self::Vector(v)
    }
}

impl From<[f64; MOMENT_COMPONENTS]> for ReducedValue {
    fn from(t: [f64; MOMENT_COMPONENTS]) -> Self {
        Self::Tensor(t)
    }
}

/// Running statistic over a subset of samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub value: ReducedValue,
    pub samples: u64,
}

impl Partial {
    pub fn new(ty: ReductionType) -> Self {
        Self {
            value: ReducedValue::identity(ty),
            samples: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Fold one sample in
    pub fn push(&mut self, statistic: Statistic, sample: impl Into<ReducedValue>) {
        let sample = Partial {
            value: sample.into(),
            samples: 1,
        };
        self.merge(statistic, &sample);
    }

    /// Fold another partial of the same type in
    pub fn merge(&mut self, statistic: Statistic, other: &Partial) {
        if other.samples == 0 {
            return;
        }
        let total = self.samples + other.samples;
        match statistic {
            Statistic::Sum => self.value.zip_with(&other.value, |a, b| a + b),
            Statistic::Mean => {
                let w = other.samples as f64 / total as f64;
                self.value.zip_with(&other.value, |a, b| a + (b - a) * w);
            }
            Statistic::Min => self.value.zip_with(&other.value, f64::min),
            Statistic::Max => self.value.zip_with(&other.value, f64::max),
            Statistic::Derived => {}
        }
        self.samples = total;
    }
}
