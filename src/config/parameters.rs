//! Parameter structures for membrane species, unit scaling and coupling.
//!
//! Membrane stiffnesses are given in the dimensional units HemoCell uses in
//! its species configuration files; conversion to lattice units happens once
//! in [`crate::physics::Equilibrium`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FicsionError, Result};

/// Thermal energy at body temperature (J)
/// Source: k_B · 297 K, as used by HemoCell
pub const KBT_PHYSICAL_J: f64 = 4.100531391e-21;

/// Top-level parameters container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    /// Lattice spacing, time step and mass unit
    pub units: UnitScaling,
    /// Immersed-boundary coupling settings
    pub coupling: CouplingParameters,
    /// One entry per cell species
    pub species: Vec<SpeciesParameters>,
}

impl Parameters {
    /// Load and validate parameters from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let params: Self = serde_json::from_str(&contents)?;
        params.validate()?;
        log::info!("Loaded simulation parameters from {:?}", path.as_ref());
        Ok(params)
    }

    /// Load parameters from a JSON file, or use defaults if it is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(params) => params,
            Err(FicsionError::Io(_)) => {
                log::info!("Parameter file {:?} not found, using defaults", path.as_ref());
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load parameters: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Find a species by name
    pub fn species(&self, name: &str) -> Option<&SpeciesParameters> {
        self.species.iter().find(|s| s.name == name)
    }

    /// Check every value for consistency
    pub fn validate(&self) -> Result<()> {
        self.units.validate()?;
        self.coupling.validate()?;
        if self.species.is_empty() {
            return Err(FicsionError::invalid("species", "at least one species is required"));
        }
        for species in &self.species {
            species.validate()?;
        }
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            units: UnitScaling::default(),
            coupling: CouplingParameters::default(),
            species: vec![SpeciesParameters::default(), SpeciesParameters::platelet()],
        }
    }
}

/// Conversion between physical and lattice units
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitScaling {
    /// Lattice spacing (m)
    pub dx_m: f64,
    /// Fluid time step (s)
    pub dt_s: f64,
    /// Mass unit (kg), usually ρ_plasma · dx³
    pub dm_kg: f64,
}

// SI unit suffixes in method names
#[allow(non_snake_case)]
impl UnitScaling {
    /// Lattice unit of force, dm·dx/dt² (N)
    pub fn force_unit_N(&self) -> f64 {
        self.dm_kg * self.dx_m / (self.dt_s * self.dt_s)
    }

    /// Lattice unit of energy, dm·dx²/dt² (J)
    pub fn energy_unit_J(&self) -> f64 {
        self.dm_kg * self.dx_m * self.dx_m / (self.dt_s * self.dt_s)
    }

    /// Thermal energy expressed in lattice units
    pub fn kbt_lattice(&self) -> f64 {
        KBT_PHYSICAL_J / self.energy_unit_J()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("dx_m", self.dx_m), ("dt_s", self.dt_s), ("dm_kg", self.dm_kg)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(FicsionError::invalid(name, format!("must be positive, got {value}")));
            }
        }
        Ok(())
    }
}

impl Default for UnitScaling {
    fn default() -> Self {
        let dx_m = 5.0e-7;
        Self {
            // 0.5 μm lattice, the HemoCell default resolution
            dx_m,
            dt_s: 1.0e-7,
            // Plasma density 1025 kg/m³
            dm_kg: 1025.0 * dx_m * dx_m * dx_m,
        }
    }
}

/// How rest lengths, angles and areas are assigned to mesh elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquilibriumMode {
    /// One mean rest value per element kind, derived from mesh metrics
    MeanMetric,
    /// Per-element rest values measured on the reference mesh
    ShapeMemory,
}

/// Particle position update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateScheme {
    /// x += v·Δt
    Euler,
    /// x += (1.5·v − 0.5·v_prev)·Δt
    AdamsBashforth,
}

/// Immersed-boundary coupling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingParameters {
    /// Interpolation kernel selector (1: linear, 2: cosine, 3: Roma 3-point, 4: Peskin 4-point)
    pub ibm_kernel: u8,
    /// Ghost layer width around each partition (lattice units)
    /// Must cover a whole cell so every owned vertex sees a complete cell.
    pub envelope_width: i32,
    /// Position update rule
    pub update_scheme: UpdateScheme,
    /// Fluid steps covered by one particle update
    pub particle_time_step: f64,
    /// Keep per-force and per-energy breakdowns on each particle
    pub record_breakdown: bool,
}

impl CouplingParameters {
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.ibm_kernel) {
            return Err(FicsionError::InvalidKernel(self.ibm_kernel));
        }
        // Kernel reach is at most 2 lattice nodes; one more node of slack for motion
        if self.envelope_width < 3 {
            return Err(FicsionError::invalid(
                "envelope_width",
                format!("must be at least 3 lattice units, got {}", self.envelope_width),
            ));
        }
        if !(self.particle_time_step > 0.0) {
            return Err(FicsionError::invalid("particle_time_step", "must be positive"));
        }
        Ok(())
    }
}

impl Default for CouplingParameters {
    fn default() -> Self {
        Self {
            ibm_kernel: 2,
            // 12.5 μm at dx = 0.5 μm, larger than an RBC diameter
            envelope_width: 25,
            update_scheme: UpdateScheme::Euler,
            particle_time_step: 1.0,
            record_breakdown: false,
        }
    }
}

/// Mechanical parameters of one cell species
///
/// Reference: Závodszky et al., "Cellular level in-silico modeling of blood
/// rheology with an improved material model for red blood cells",
/// Front Physiol 2017.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesParameters {
    /// Species name used for lookup ("RBC", "PLT", ...)
    pub name: String,
    /// Cell density (kg/m³), carried for output only
    pub density: f64,
    /// Anchor spring stiffness (N/m)
    pub k_rest: f64,
    /// Local area conservation stiffness (kBT)
    pub k_shear: f64,
    /// Bending stiffness (kBT)
    pub k_bend: f64,
    /// Hookean stretch stiffness (N), accepted but contributes no force
    pub k_stretch: f64,
    /// Worm-like chain link stiffness (dimensionless)
    pub k_wlc: f64,
    /// Elastic modulus, accepted for configuration compatibility
    pub k_elastic: f64,
    /// Volume conservation stiffness (kBT)
    pub k_volume: f64,
    /// Global surface conservation stiffness (kBT)
    pub k_surface: f64,
    /// Membrane viscosity (Pa·s·m)
    pub eta_m: f64,
    /// Spectrin persistence length at the fine (full spectrin) resolution (m)
    /// Source: HemoCell RBC configuration, 7.5 nm
    pub persistence_length_fine_m: f64,
    /// Ratio of maximum link extension to rest length
    pub eq_length_ratio: f64,
    /// Rest value assignment
    pub equilibrium: EquilibriumMode,
}

impl SpeciesParameters {
    /// Platelet defaults: stiffer in bending and area than an RBC
    pub fn platelet() -> Self {
        Self {
            name: "PLT".to_string(),
            k_bend: 500.0,
            k_shear: 100.0,
            k_volume: 50.0,
            k_surface: 500.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let stiffnesses = [
            ("k_rest", self.k_rest),
            ("k_shear", self.k_shear),
            ("k_bend", self.k_bend),
            ("k_stretch", self.k_stretch),
            ("k_wlc", self.k_wlc),
            ("k_elastic", self.k_elastic),
            ("k_volume", self.k_volume),
            ("k_surface", self.k_surface),
            ("eta_m", self.eta_m),
        ];
        for (name, value) in stiffnesses {
            if value < 0.0 || !value.is_finite() {
                return Err(FicsionError::invalid(name, format!("must be non-negative, got {value}")));
            }
        }
        if !(self.persistence_length_fine_m > 0.0) {
            return Err(FicsionError::invalid("persistence_length_fine_m", "must be positive"));
        }
        if !(self.eq_length_ratio > 1.0) {
            return Err(FicsionError::invalid(
                "eq_length_ratio",
                format!("must exceed 1, got {}", self.eq_length_ratio),
            ));
        }
        Ok(())
    }
}

impl Default for SpeciesParameters {
    fn default() -> Self {
        Self {
            name: "RBC".to_string(),
            // Evans & Fung, Microvasc Res 1972
            density: 1100.0,
            k_rest: 0.0,
            k_shear: 10.0,
            k_bend: 50.0,
            k_stretch: 0.0,
            k_wlc: 1.0,
            k_elastic: 0.0,
            k_volume: 20.0,
            k_surface: 100.0,
            eta_m: 0.0,
            persistence_length_fine_m: 7.5e-9,
            eq_length_ratio: 3.17,
            equilibrium: EquilibriumMode::ShapeMemory,
        }
    }
}
