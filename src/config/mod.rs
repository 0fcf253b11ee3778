//! Configuration module for loading simulation parameters.
//!
//! Species stiffnesses, unit scaling and coupling settings are read from JSON.

mod parameters;

pub use parameters::{
    CouplingParameters, EquilibriumMode, Parameters, SpeciesParameters, UnitScaling, UpdateScheme,
    KBT_PHYSICAL_J,
};
