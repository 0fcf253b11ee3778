//! Reduction-type codes for per-cell quantities.
//!
//! A code is `quantity · 100 + statistic · 10 + dimension`:
//! - dimension: 1 scalar, 3 vector, 9 tensor (inertia)
//! - statistic: 0 sum, 1 mean, 2 min, 3 max, 5 derived after the merge
//! - quantity: 0 unwrapped position, 1 volume, 2 angle, 3 area, 4 edge
//!   length, 5 tile span, 6 position, 7 velocity, 8 inertia, 9 energy,
//!   16 force, 17 torque, and the ellipsoid-fit outputs 10, 12, 13, 15
//!
//! The numeric codes are stable and match HemoCell output files.

use std::fmt;

/// Physical quantity being reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    /// Position without periodic wrapping; identical to `Position` here
    UnwrappedPosition,
    Volume,
    Angle,
    Area,
    EdgeLength,
    TileSpan,
    Position,
    Velocity,
    Inertia,
    Energy,
    TumblingAngles,
    Diameters,
    SymmetryDeviation,
    TaylorIndex,
    Force,
    Torque,
}

impl Quantity {
    const fn id(self) -> u16 {
        match self {
            Self::UnwrappedPosition => 0,
            Self::Volume => 1,
            Self::Angle => 2,
            Self::Area => 3,
            Self::EdgeLength => 4,
            Self::TileSpan => 5,
            Self::Position => 6,
            Self::Velocity => 7,
            Self::Inertia => 8,
            Self::Energy => 9,
            Self::TumblingAngles => 10,
            Self::Diameters => 12,
            Self::SymmetryDeviation => 13,
            Self::TaylorIndex => 15,
            Self::Force => 16,
            Self::Torque => 17,
        }
    }

    fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            0 => Self::UnwrappedPosition,
            1 => Self::Volume,
            2 => Self::Angle,
            3 => Self::Area,
            4 => Self::EdgeLength,
            5 => Self::TileSpan,
            6 => Self::Position,
            7 => Self::Velocity,
            8 => Self::Inertia,
            9 => Self::Energy,
            10 => Self::TumblingAngles,
            12 => Self::Diameters,
            13 => Self::SymmetryDeviation,
            15 => Self::TaylorIndex,
            16 => Self::Force,
            17 => Self::Torque,
            _ => return None,
        })
    }
}

/// How partial values combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Statistic {
    Sum,
    Mean,
    Min,
    Max,
    /// Computed from other quantities after the merge
    Derived,
}

impl Statistic {
    const fn id(self) -> u16 {
        match self {
            Self::Sum => 0,
            Self::Mean => 1,
            Self::Min => 2,
            Self::Max => 3,
            Self::Derived => 5,
        }
    }

    fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            0 => Self::Sum,
            1 => Self::Mean,
            2 => Self::Min,
            3 => Self::Max,
            5 => Self::Derived,
            _ => return None,
        })
    }
}

/// Number of components of a reduced value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Scalar,
    Vector,
    /// Inertia moments: nine second moments and three first moments
    Tensor,
}

impl Dimension {
    const fn id(self) -> u16 {
        match self {
            Self::Scalar => 1,
            Self::Vector => 3,
            Self::Tensor => 9,
        }
    }

    fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            1 => Self::Scalar,
            3 => Self::Vector,
            9 => Self::Tensor,
            _ => return None,
        })
    }
}

/// One reducible quantity with its statistic and dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReductionType {
    pub quantity: Quantity,
    pub statistic: Statistic,
    pub dimension: Dimension,
}

impl ReductionType {
    pub const UNWRAPPED_POSITION_MEAN: Self = Self::new(Quantity::UnwrappedPosition, Statistic::Mean, Dimension::Vector);
    pub const UNWRAPPED_POSITION_MIN: Self = Self::new(Quantity::UnwrappedPosition, Statistic::Min, Dimension::Vector);
    pub const UNWRAPPED_POSITION_MAX: Self = Self::new(Quantity::UnwrappedPosition, Statistic::Max, Dimension::Vector);
    pub const VOLUME: Self = Self::new(Quantity::Volume, Statistic::Sum, Dimension::Scalar);
    pub const ANGLE_MEAN: Self = Self::new(Quantity::Angle, Statistic::Mean, Dimension::Scalar);
    pub const ANGLE_MIN: Self = Self::new(Quantity::Angle, Statistic::Min, Dimension::Scalar);
    pub const ANGLE_MAX: Self = Self::new(Quantity::Angle, Statistic::Max, Dimension::Scalar);
    pub const SURFACE: Self = Self::new(Quantity::Area, Statistic::Sum, Dimension::Scalar);
    pub const TRIANGLE_AREA_MEAN: Self = Self::new(Quantity::Area, Statistic::Mean, Dimension::Scalar);
    pub const TRIANGLE_AREA_MIN: Self = Self::new(Quantity::Area, Statistic::Min, Dimension::Scalar);
    pub const TRIANGLE_AREA_MAX: Self = Self::new(Quantity::Area, Statistic::Max, Dimension::Scalar);
    pub const EDGE_LENGTH_MEAN: Self = Self::new(Quantity::EdgeLength, Statistic::Mean, Dimension::Scalar);
    pub const EDGE_LENGTH_MIN: Self = Self::new(Quantity::EdgeLength, Statistic::Min, Dimension::Scalar);
    pub const EDGE_LENGTH_MAX: Self = Self::new(Quantity::EdgeLength, Statistic::Max, Dimension::Scalar);
    pub const TILE_SPAN_MEAN: Self = Self::new(Quantity::TileSpan, Statistic::Mean, Dimension::Scalar);
    pub const TILE_SPAN_MIN: Self = Self::new(Quantity::TileSpan, Statistic::Min, Dimension::Scalar);
    pub const TILE_SPAN_MAX: Self = Self::new(Quantity::TileSpan, Statistic::Max, Dimension::Scalar);
    pub const POSITION_MEAN: Self = Self::new(Quantity::Position, Statistic::Mean, Dimension::Vector);
    pub const POSITION_MIN: Self = Self::new(Quantity::Position, Statistic::Min, Dimension::Vector);
    pub const POSITION_MAX: Self = Self::new(Quantity::Position, Statistic::Max, Dimension::Vector);
    pub const VELOCITY_MEAN: Self = Self::new(Quantity::Velocity, Statistic::Mean, Dimension::Vector);
    pub const VELOCITY_MIN: Self = Self::new(Quantity::Velocity, Statistic::Min, Dimension::Vector);
    pub const VELOCITY_MAX: Self = Self::new(Quantity::Velocity, Statistic::Max, Dimension::Vector);
    pub const ENERGY: Self = Self::new(Quantity::Energy, Statistic::Sum, Dimension::Scalar);
    pub const FORCE: Self = Self::new(Quantity::Force, Statistic::Sum, Dimension::Vector);
    pub const INERTIA: Self = Self::new(Quantity::Inertia, Statistic::Sum, Dimension::Tensor);
    pub const TORQUE: Self = Self::new(Quantity::Torque, Statistic::Sum, Dimension::Vector);
    pub const TUMBLING_ANGLES: Self = Self::new(Quantity::TumblingAngles, Statistic::Derived, Dimension::Vector);
    pub const DIAMETERS: Self = Self::new(Quantity::Diameters, Statistic::Derived, Dimension::Vector);
    pub const SYMMETRY_DEVIATION: Self = Self::new(Quantity::SymmetryDeviation, Statistic::Derived, Dimension::Scalar);
    pub const TAYLOR_INDEX: Self = Self::new(Quantity::TaylorIndex, Statistic::Derived, Dimension::Scalar);

    /// Every supported type
    pub const ALL: [Self; 31] = [
        Self::UNWRAPPED_POSITION_MEAN,
        Self::UNWRAPPED_POSITION_MIN,
        Self::UNWRAPPED_POSITION_MAX,
        Self::VOLUME,
        Self::ANGLE_MEAN,
        Self::ANGLE_MIN,
        Self::ANGLE_MAX,
        Self::SURFACE,
        Self::TRIANGLE_AREA_MEAN,
        Self::TRIANGLE_AREA_MIN,
        Self::TRIANGLE_AREA_MAX,
        Self::EDGE_LENGTH_MEAN,
        Self::EDGE_LENGTH_MIN,
        Self::EDGE_LENGTH_MAX,
        Self::TILE_SPAN_MEAN,
        Self::TILE_SPAN_MIN,
        Self::TILE_SPAN_MAX,
        Self::POSITION_MEAN,
        Self::POSITION_MIN,
        Self::POSITION_MAX,
        Self::VELOCITY_MEAN,
        Self::VELOCITY_MIN,
        Self::VELOCITY_MAX,
        Self::ENERGY,
        Self::FORCE,
        Self::INERTIA,
        Self::TORQUE,
        Self::TUMBLING_ANGLES,
        Self::DIAMETERS,
        Self::SYMMETRY_DEVIATION,
        Self::TAYLOR_INDEX,
    ];

    /// Volume and surface, enough for volume-conservation monitoring
    pub const VOLUME_AND_SURFACE: [Self; 2] = [Self::VOLUME, Self::SURFACE];

    /// Volume, surface and centre of mass
    pub const VOLUME_SURFACE_AND_CENTERS: [Self; 3] = [Self::VOLUME, Self::SURFACE, Self::POSITION_MEAN];

    /// Ellipsoid-fit outputs and their inputs
    pub const SHAPE: [Self; 6] = [
        Self::VOLUME,
        Self::INERTIA,
        Self::TUMBLING_ANGLES,
        Self::DIAMETERS,
        Self::SYMMETRY_DEVIATION,
        Self::TAYLOR_INDEX,
    ];

    pub const fn new(quantity: Quantity, statistic: Statistic, dimension: Dimension) -> Self {
        Self {
            quantity,
            statistic,
            dimension,
        }
    }

    /// Numeric code, e.g. 613 for the mean position
    pub const fn code(&self) -> u16 {
        self.quantity.id() * 100 + self.statistic.id() * 10 + self.dimension.id()
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(Self::new(
            Quantity::from_id(code / 100)?,
            Statistic::from_id((code / 10) % 10)?,
            Dimension::from_id(code % 10)?,
        ))
    }

    /// Produced by the ellipsoid fit rather than by particles
    pub fn is_derived(&self) -> bool {
        self.statistic == Statistic::Derived
    }

    /// Other types this one is computed from
    pub fn dependencies(&self) -> &'static [ReductionType] {
        match self.quantity {
            Quantity::Inertia => &[Self::VOLUME],
            Quantity::Torque => &[Self::FORCE, Self::POSITION_MEAN],
            Quantity::TumblingAngles | Quantity::Diameters | Quantity::SymmetryDeviation | Quantity::TaylorIndex => {
                &[Self::VOLUME, Self::INERTIA]
            }
            _ => &[],
        }
    }

    /// Human-readable name used in output headers
    pub fn name(&self) -> &'static str {
        use Quantity as Q;
        use Statistic as S;
        match (self.quantity, self.statistic) {
            (Q::UnwrappedPosition, S::Mean) => "Position (not periodic)",
            (Q::UnwrappedPosition, S::Min) => "Min positions (not periodic)",
            (Q::UnwrappedPosition, S::Max) => "Max positions (not periodic)",
            (Q::Volume, _) => "Volume",
            (Q::Angle, S::Mean) => "Mean angle",
            (Q::Angle, S::Min) => "Min angle",
            (Q::Angle, S::Max) => "Max angle",
            (Q::Area, S::Sum) => "Surface",
            (Q::Area, S::Mean) => "Mean triangle area",
            (Q::Area, S::Min) => "Min triangle area",
            (Q::Area, S::Max) => "Max triangle area",
            (Q::EdgeLength, S::Mean) => "Mean edge distance",
            (Q::EdgeLength, S::Min) => "Min edge distance",
            (Q::EdgeLength, S::Max) => "Max edge distance",
            (Q::TileSpan, S::Mean) => "Mean tile span",
            (Q::TileSpan, S::Min) => "Min tile span",
            (Q::TileSpan, S::Max) => "Max tile span",
            (Q::Position, S::Mean) => "Position",
            (Q::Position, S::Min) => "Min positions",
            (Q::Position, S::Max) => "Max positions",
            (Q::Velocity, S::Mean) => "Velocity",
            (Q::Velocity, S::Min) => "Min velocity",
            (Q::Velocity, S::Max) => "Max velocity",
            (Q::Inertia, _) => "Inertia",
            (Q::Energy, _) => "Energy",
            (Q::Force, _) => "Force",
            (Q::Torque, _) => "Torque",
            (Q::TumblingAngles, _) => "Tumbling angles",
            (Q::Diameters, _) => "Diameters",
            (Q::SymmetryDeviation, _) => "Symmetry deviation",
            (Q::TaylorIndex, _) => "Taylor deformation index",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ReductionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_output_format() {
        let expected = [
            (ReductionType::UNWRAPPED_POSITION_MEAN, 13),
            (ReductionType::UNWRAPPED_POSITION_MAX, 33),
            (ReductionType::VOLUME, 101),
            (ReductionType::ANGLE_MIN, 221),
            (ReductionType::SURFACE, 301),
            (ReductionType::TRIANGLE_AREA_MAX, 331),
            (ReductionType::EDGE_LENGTH_MEAN, 411),
            (ReductionType::TILE_SPAN_MIN, 521),
            (ReductionType::POSITION_MEAN, 613),
            (ReductionType::VELOCITY_MAX, 733),
            (ReductionType::INERTIA, 809),
            (ReductionType::ENERGY, 901),
            (ReductionType::FORCE, 1603),
            (ReductionType::TORQUE, 1703),
            (ReductionType::TUMBLING_ANGLES, 1053),
            (ReductionType::DIAMETERS, 1253),
            (ReductionType::SYMMETRY_DEVIATION, 1351),
            (ReductionType::TAYLOR_INDEX, 1551),
        ];
        for (ty, code) in expected {
            assert_eq!(ty.code(), code, "{}", ty.name());
            assert_eq!(ReductionType::from_code(code), Some(ty));
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(ReductionType::from_code(1153), None);
        assert_eq!(ReductionType::from_code(104), None);
    }

    #[test]
    fn test_dependencies() {
        assert!(ReductionType::TAYLOR_INDEX.is_derived());
        assert!(ReductionType::TAYLOR_INDEX.dependencies().contains(&ReductionType::INERTIA));
        assert!(ReductionType::TORQUE.dependencies().contains(&ReductionType::FORCE));
        assert!(ReductionType::VOLUME.dependencies().is_empty());
    }
}
