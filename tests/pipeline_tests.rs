//! End-to-end tests of the per-step pipeline over partitioned cell fields.

use std::sync::Arc;

use ficsion::{
    config::{CouplingParameters, Parameters, SpeciesParameters, UnitScaling},
    coupling::{DenseFluidBlock, FluidBlock, LatticeBox},
    error::FicsionError,
    field::{decompose, CellField, CellFields, StretchingForce, MAX_NEIGHBOURS},
    geometry::{shapes, ReferenceMesh},
    reduction::ReductionType,
};
use glam::{DVec3, IVec3};

const CONFIG: &str = "data/parameters/simulation.json";

fn global() -> LatticeBox {
    LatticeBox::new(IVec3::ZERO, IVec3::new(31, 23, 23))
}

fn coupling(envelope: i32) -> CouplingParameters {
    CouplingParameters {
        ibm_kernel: 4,
        envelope_width: envelope,
        ..CouplingParameters::default()
    }
}

fn field_with(species: &SpeciesParameters, mesh: ReferenceMesh, splits: i32, coupling: &CouplingParameters) -> CellField {
    let partitions = decompose(global(), [splits, 1, 1], coupling.envelope_width).unwrap();
    CellField::new(species, &UnitScaling::default(), coupling, Arc::new(mesh), partitions).unwrap()
}

/// Sphere of radius 5 straddling the partition boundary at x = 16
fn sphere_field(splits: i32, envelope: i32) -> CellField {
    let mut field = field_with(
        &SpeciesParameters::default(),
        shapes::icosphere(2, 5.0).unwrap(),
        splits,
        &coupling(envelope),
    );
    let positions = shapes::positions_at(field.mesh(), DVec3::new(16.2, 12.0, 12.0));
    field.add_cell(0, &positions).unwrap();
    field
}

fn domain_blocks(field: &CellField, velocity: impl Fn(IVec3) -> DVec3 + Copy) -> Vec<DenseFluidBlock> {
    field
        .partitions()
        .iter()
        .map(|p| {
            let mut block = DenseFluidBlock::new(p.domain());
            block.set_velocity_field(velocity);
            block
        })
        .collect()
}

/// One full coupling step against prescribed fluid blocks
fn step(field: &mut CellField, blocks: &mut [DenseFluidBlock]) -> ficsion::Result<()> {
    field.apply_constitutive_model()?;
    field.delete_incomplete_cells();
    for block in blocks.iter_mut() {
        block.clear_forces();
    }
    field.spread_force_ibm(blocks)?;
    field.interpolate_velocity_ibm(blocks)?;
    field.advance_particles();
    Ok(())
}

// ============================================================================
// Step Sequence Tests
// ============================================================================

#[test]
fn test_shear_steps_preserve_volume() {
    let mut field = sphere_field(2, 12);
    let shear = 2e-3;
    let mut blocks = domain_blocks(&field, move |n| DVec3::new(shear * (n.y as f64 - 12.0), 0.0, 0.0));

    let start = field.synchronize_cell_quantities(&ReductionType::VOLUME_SURFACE_AND_CENTERS)[&0].clone();
    for _ in 0..20 {
        step(&mut field, &mut blocks).unwrap();
    }
    let end = &field.synchronize_cell_quantities(&ReductionType::VOLUME_SURFACE_AND_CENTERS)[&0];

    let v0 = start.volume().unwrap();
    assert!((end.volume().unwrap() - v0).abs() < 1e-9 * v0);
    // Simple shear stretches the surface but leaves the centre in place
    assert!(end.surface().unwrap() > start.surface().unwrap());
    assert!((end.position().unwrap() - start.position().unwrap()).length() < 1e-9);
    assert_eq!(field.num_particles(), 162);
}

#[test]
fn test_particles_migrate_between_partitions() {
    let mut field = sphere_field(2, 12);
    let mut blocks = domain_blocks(&field, |_| DVec3::new(0.5, 0.0, 0.0));
    let before = field.partitions()[1].owned_count();

    for _ in 0..4 {
        step(&mut field, &mut blocks).unwrap();
    }

    assert_eq!(field.num_particles(), 162);
    assert!(field.partitions()[1].owned_count() > before);
    assert!(field.incomplete_cells().is_empty());
    for partition in field.partitions() {
        assert!(partition.owned().iter().all(|p| partition.bulk.contains_point(p.position)));
    }
}

#[test]
fn test_forces_reach_the_fluid() {
    let mut field = field_with(
        &SpeciesParameters::default(),
        shapes::icosphere(2, 5.0).unwrap(),
        2,
        &coupling(12),
    );
    let inflated: Vec<DVec3> = field
        .mesh()
        .vertices()
        .iter()
        .map(|&x| DVec3::new(16.2, 12.0, 12.0) + 1.1 * x)
        .collect();
    field.add_cell(0, &inflated).unwrap();
    field.apply_constitutive_model().unwrap();

    let mut blocks = domain_blocks(&field, |_| DVec3::ZERO);
    field.spread_force_ibm(&mut blocks).unwrap();

    let magnitude: f64 = field.particles().map(|p| p.force.length()).sum();
    let spread: DVec3 = blocks.iter().map(DenseFluidBlock::total_force).sum();
    let particle_total: DVec3 = field.particles().map(|p| p.force).sum();
    assert!(magnitude > 0.0);
    assert!((spread - particle_total).length() < 1e-9 * magnitude);
    // Each block only receives forces on its own bulk
    assert!(blocks.iter().all(|b| b.total_force().length() < magnitude));
}

// ============================================================================
// Failure Mode Tests
// ============================================================================

#[test]
fn test_thin_envelope_flags_incomplete_cells() {
    let mut field = sphere_field(2, 3);
    let incomplete = field.apply_constitutive_model().unwrap();
    assert!(incomplete.contains(&0));
    assert_eq!(field.incomplete_cells(), &incomplete);
    // Incomplete cells receive no membrane force
    assert!(field.particles().all(|p| p.force == DVec3::ZERO));

    assert!(field.delete_incomplete_cells() > 0);
    assert_eq!(field.num_particles(), 0);
    assert!(field.cell_ids().is_empty());
    assert_eq!(field.delete_incomplete_cells(), 0);
}

#[test]
fn test_inverted_cell_is_fatal() {
    let mut field = field_with(
        &SpeciesParameters::default(),
        shapes::icosphere(2, 5.0).unwrap(),
        2,
        &coupling(12),
    );
    let mirrored: Vec<DVec3> = field
        .mesh()
        .vertices()
        .iter()
        .map(|&x| DVec3::new(16.2 - x.x, 12.0 + x.y, 12.0 + x.z))
        .collect();
    field.add_cell(4, &mirrored).unwrap();

    assert!(matches!(
        field.apply_constitutive_model(),
        Err(FicsionError::NonPositiveCellGeometry { cell_id: 4, .. })
    ));
}

#[test]
fn test_bulk_only_blocks_fail_gather() {
    let mut field = sphere_field(2, 12);
    let blocks: Vec<DenseFluidBlock> = field
        .partitions()
        .iter()
        .map(|p| DenseFluidBlock::new(p.bulk))
        .collect();

    assert!(matches!(
        field.interpolate_velocity_ibm(&blocks),
        Err(FicsionError::StencilOutOfBounds { .. })
    ));
}

#[test]
fn test_dense_decomposition_exceeds_neighbour_limit() {
    let global = LatticeBox::new(IVec3::ZERO, IVec3::splat(15));
    match decompose(global, [4, 4, 4], 25) {
        Err(FicsionError::TooManyNeighbours { partition, count, max }) => {
            assert_eq!(partition, 0);
            assert_eq!(count, 63);
            assert_eq!(max, MAX_NEIGHBOURS);
        }
        other => panic!("expected TooManyNeighbours, got {:?}", other.map(|p| p.len())),
    }
    assert!(decompose(global, [2, 2, 2], 4).is_ok());
}

#[test]
fn test_invalid_coupling_is_rejected() {
    let partitions = decompose(global(), [1, 1, 1], 12).unwrap();
    let result = CellField::new(
        &SpeciesParameters::default(),
        &UnitScaling::default(),
        &CouplingParameters {
            ibm_kernel: 7,
            ..CouplingParameters::default()
        },
        Arc::new(shapes::icosphere(1, 3.0).unwrap()),
        partitions,
    );
    assert!(matches!(result, Err(FicsionError::InvalidKernel(7))));
}

// ============================================================================
// Configuration and Species Tests
// ============================================================================

#[test]
fn test_parameter_file_loads() {
    let params = Parameters::load(CONFIG).unwrap();
    assert_eq!(params.coupling.ibm_kernel, 2);
    assert_eq!(params.coupling.envelope_width, 25);
    assert!((params.units.dx_m - 5e-7).abs() < 1e-20);

    let rbc = params.species("RBC").unwrap();
    let plt = params.species("PLT").unwrap();
    assert!(plt.k_bend > rbc.k_bend);
    assert!(params.species("WBC").is_none());
}

#[test]
fn test_missing_parameter_file_falls_back_to_defaults() {
    let params = Parameters::load_or_default("data/parameters/does_not_exist.json");
    assert_eq!(params.coupling.ibm_kernel, CouplingParameters::default().ibm_kernel);
    assert!(params.validate().is_ok());
}

#[test]
fn test_two_species_share_fluid_blocks() {
    let coupling = coupling(12);
    let mut rbc = field_with(
        &SpeciesParameters::default(),
        shapes::red_blood_cell(2, 6.0).unwrap(),
        2,
        &coupling,
    );
    let mut plt = field_with(
        &SpeciesParameters::platelet(),
        shapes::icosphere(1, 2.0).unwrap(),
        2,
        &coupling,
    );
    let rbc_positions: Vec<DVec3> = rbc
        .mesh()
        .vertices()
        .iter()
        .map(|&x| DVec3::new(12.0, 12.0, 12.0) + 1.05 * x)
        .collect();
    rbc.add_cell(0, &rbc_positions).unwrap();
    let plt_positions: Vec<DVec3> = plt
        .mesh()
        .vertices()
        .iter()
        .map(|&x| DVec3::new(23.0, 12.0, 12.0) + 0.9 * x)
        .collect();
    plt.add_cell(0, &plt_positions).unwrap();

    let mut fields = CellFields::new();
    fields.push(rbc);
    fields.push(plt);
    assert_eq!(fields.len(), 2);

    let incomplete = fields.apply_constitutive_model().unwrap();
    assert!(incomplete.iter().all(|set| set.is_empty()));

    let mut blocks = domain_blocks(fields.get("RBC").unwrap(), |_| DVec3::new(0.01, 0.0, 0.0));
    fields.spread_force_ibm(&mut blocks).unwrap();
    let magnitude: f64 = fields
        .iter()
        .flat_map(|f| f.particles())
        .map(|p| p.force.length())
        .sum();
    let spread: DVec3 = blocks.iter().map(DenseFluidBlock::total_force).sum();
    assert!(spread.length() < 1e-9 * magnitude);

    fields.interpolate_velocity_ibm(&blocks).unwrap();
    fields.advance_particles();
    fields.synchronize_cell_quantities(&ReductionType::VOLUME_AND_SURFACE);

    let rbc = fields.get("RBC").unwrap();
    let plt = fields.get("PLT").unwrap();
    assert_eq!(rbc.cell_quantities(0).unwrap().n_particles, 162);
    assert_eq!(plt.cell_quantities(0).unwrap().n_particles, 42);
    assert!(rbc.particles().all(|p| (p.velocity.x - 0.01).abs() < 1e-12));
    assert!(fields.get("WBC").is_none());
}

#[test]
fn test_breakdown_recorded_on_request() {
    let mut coupling = coupling(12);
    coupling.record_breakdown = true;
    let species = SpeciesParameters {
        eta_m: 1e-6,
        ..SpeciesParameters::default()
    };
    let mut field = field_with(&species, shapes::icosphere(2, 5.0).unwrap(), 2, &coupling);
    let stretched: Vec<DVec3> = field
        .mesh()
        .vertices()
        .iter()
        .map(|&x| DVec3::new(16.2, 12.0, 12.0) + DVec3::new(1.2 * x.x, x.y, 0.9 * x.z))
        .collect();
    field.add_cell(0, &stretched).unwrap();
    field.apply_constitutive_model().unwrap();

    for particle in field.particles() {
        let breakdown = particle.breakdown.as_ref().unwrap();
        assert!((breakdown.force.total() - particle.force).length() <= 1e-12 * (1.0 + particle.force.length()));
        assert!((breakdown.energy.total() - particle.energy).abs() <= 1e-12 * (1.0 + particle.energy.abs()));
    }
    // Ghost copies carry the computed forces too
    for partition in field.partitions() {
        assert!(partition.ghosts().iter().all(|g| g.breakdown.is_some()));
    }
}

// ============================================================================
// Stretching Tests
// ============================================================================

#[test]
fn test_stretching_forces_are_spread() {
    let mut field = sphere_field(2, 12);
    field.apply_constitutive_model().unwrap();
    let stretch = StretchingForce::new(&field, 0, 0, 10, 1e-4);
    assert_eq!(stretch.apply(&mut field), 20);

    let before = stretch.measure(&field).unwrap();
    assert!((before.axial - 10.0).abs() < 1.0);

    let mut blocks = domain_blocks(&field, |_| DVec3::ZERO);
    field.spread_force_ibm(&mut blocks).unwrap();

    let spread: f64 = blocks
        .iter()
        .map(|b| {
            let mut right = 0.0;
            let bounds = b.bounds();
            for z in bounds.min.z..=bounds.max.z {
                for y in bounds.min.y..=bounds.max.y {
                    for x in 17..=bounds.max.x {
                        right += b.force(IVec3::new(x, y, z)).x;
                    }
                }
            }
            right
        })
        .sum();
    // The right half of the cell is pulled towards +x
    assert!(spread > 0.5e-4);

    let total: DVec3 = blocks.iter().map(DenseFluidBlock::total_force).sum();
    assert!(total.length() < 1e-9);
}
