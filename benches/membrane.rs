//! Membrane and coupling benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{DVec3, IVec3};

use ficsion::config::{CouplingParameters, SpeciesParameters, UnitScaling};
use ficsion::coupling::{DenseFluidBlock, InterpolationKernel, LatticeBox};
use ficsion::field::{decompose, CellField};
use ficsion::geometry::shapes;
use ficsion::physics::{CellForces, MembraneModel};
use ficsion::reduction::ReductionType;
use ficsion::state::{CellIndex, CellView, VertexParticle};

fn stretched_field(splits: i32) -> CellField {
    let global = LatticeBox::new(IVec3::ZERO, IVec3::new(47, 31, 31));
    let partitions = decompose(global, [splits, 1, 1], 16).unwrap();
    let mesh = Arc::new(shapes::red_blood_cell(3, 7.82).unwrap());
    let mut field = CellField::new(
        &SpeciesParameters::default(),
        &UnitScaling::default(),
        &CouplingParameters {
            envelope_width: 16,
            ..Default::default()
        },
        mesh.clone(),
        partitions,
    )
    .unwrap();
    let positions: Vec<DVec3> = mesh
        .vertices()
        .iter()
        .map(|&x| DVec3::new(24.0, 16.0, 16.0) + DVec3::new(1.1 * x.x, 0.95 * x.y, x.z))
        .collect();
    field.add_cell(0, &positions).unwrap();
    field
}

fn bench_cell_force(c: &mut Criterion) {
    let mesh = shapes::red_blood_cell(3, 7.82).unwrap();
    let model = MembraneModel::new(&SpeciesParameters::default(), &UnitScaling::default(), &mesh).unwrap();
    let particles: Vec<VertexParticle> = mesh
        .vertices()
        .iter()
        .enumerate()
        .map(|(v, &x)| VertexParticle::new(0, v, mesh.num_vertices(), 1.05 * x))
        .collect();
    let mut index = CellIndex::new();
    index.rebuild(&particles, particles.len(), mesh.num_vertices());
    let view = CellView::new(0, &mesh, index.get(0).unwrap(), &particles);
    let mut out = CellForces::default();

    c.bench_function("rbc_cell_force", |b| {
        b.iter(|| model.compute_cell_force(black_box(&view), 0, &mut out))
    });
}

fn bench_stencil(c: &mut Criterion) {
    let kernel = InterpolationKernel::Peskin4;

    c.bench_function("peskin4_stencil", |b| {
        b.iter(|| kernel.stencil(black_box(DVec3::new(7.31, 8.62, 7.94))))
    });
}

fn bench_constitutive_model(c: &mut Criterion) {
    let mut field = stretched_field(2);

    c.bench_function("field_constitutive_model", |b| {
        b.iter(|| field.apply_constitutive_model().unwrap())
    });
}

fn bench_spread_force(c: &mut Criterion) {
    let mut field = stretched_field(2);
    field.apply_constitutive_model().unwrap();
    let mut blocks: Vec<DenseFluidBlock> = field
        .partitions()
        .iter()
        .map(|p| DenseFluidBlock::new(p.domain()))
        .collect();

    c.bench_function("field_spread_force", |b| {
        b.iter(|| field.spread_force_ibm(black_box(&mut blocks)).unwrap())
    });
}

fn bench_reduction(c: &mut Criterion) {
    let mut field = stretched_field(2);
    field.apply_constitutive_model().unwrap();

    c.bench_function("reduce_all_quantities", |b| {
        b.iter(|| {
            field.synchronize_cell_quantities(black_box(&ReductionType::ALL));
        })
    });
}

criterion_group!(
    benches,
    bench_cell_force,
    bench_stencil,
    bench_constitutive_model,
    bench_spread_force,
    bench_reduction
);
criterion_main!(benches);
