//! Two-phase reduction of per-cell quantities across partitions.
//!
//! Phase 1 (local reduce): each partition folds the particles it owns into
//! one [`ReductionParticle`] per visible cell. Mesh elements are attributed to
//! a single vertex (triangles to their first corner, edges to their first
//! endpoint) and counted by the partition owning that vertex, provided all
//! vertices of the element are visible there.
//!
//! Phase 2 (merge): reduction particles are grouped by cell id and merged
//! with each statistic's rule. A `(processor, cell_id)` pair is merged at most
//! once per merge site, so a contribution visible through several exchange
//! paths is never counted twice.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use glam::DVec3;

use super::quantities::CellQuantities;
use super::statistics::{Partial, ReducedValue, MOMENT_COMPONENTS};
use super::types::{Quantity, ReductionType};
use crate::geometry::primitives;
use crate::state::{CellId, CellView};

/// One partition's partial statistics for one cell
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionParticle {
    pub cell_id: CellId,
    /// Partition that produced this contribution
    pub processor: usize,
    /// Owned particles folded in
    pub n_particles: usize,
    /// Mean position of those particles
    pub position: DVec3,
    pub quantities: BTreeMap<ReductionType, Partial>,
}

impl ReductionParticle {
    fn new(cell_id: CellId, processor: usize, types: &BTreeSet<ReductionType>) -> Self {
        Self {
            cell_id,
            processor,
            n_particles: 0,
            position: DVec3::ZERO,
            quantities: types
                .iter()
                .filter(|ty| !ty.is_derived())
                .map(|&ty| (ty, Partial::new(ty)))
                .collect(),
        }
    }

    /// Fold one sample into every requested type of `quantity`
    fn push(&mut self, quantity: Quantity, sample: impl Into<ReducedValue> + Copy) {
        for (ty, partial) in self.quantities.range_mut(range_of(quantity)) {
            partial.push(ty.statistic, sample);
        }
    }

    fn wants(&self, quantity: Quantity) -> bool {
        self.quantities.range(range_of(quantity)).next().is_some()
    }
}

/// Key range covering every statistic and dimension of a quantity
fn range_of(quantity: Quantity) -> std::ops::RangeInclusive<ReductionType> {
    use super::types::{Dimension, Statistic};
    ReductionType::new(quantity, Statistic::Sum, Dimension::Scalar)
        ..=ReductionType::new(quantity, Statistic::Derived, Dimension::Tensor)
}

/// Requested types closed under their dependencies
pub fn required_types(requested: &[ReductionType]) -> BTreeSet<ReductionType> {
    let mut required = BTreeSet::new();
    let mut stack: Vec<ReductionType> = requested.to_vec();
    while let Some(ty) = stack.pop() {
        if required.insert(ty) {
            stack.extend_from_slice(ty.dependencies());
        }
    }
    required
}

/// Second and first volume moments of the tetrahedron (origin, x1, x2, x3)
///
/// ∫x xᵀ dV = V/20 · (Σ xₐxₐᵀ + s sᵀ) with s = x1 + x2 + x3, ∫x dV = V·s/4.
pub fn tetrahedron_moments(x1: DVec3, x2: DVec3, x3: DVec3) -> [f64; MOMENT_COMPONENTS] {
    let volume = primitives::signed_volume(x1, x2, x3);
    let s = x1 + x2 + x3;
    let mut out = [0.0; MOMENT_COMPONENTS];
    for i in 0..3 {
        for j in 0..3 {
            let sum = x1[i] * x1[j] + x2[i] * x2[j] + x3[i] * x3[j] + s[i] * s[j];
            out[3 * i + j] = volume / 20.0 * sum;
        }
    }
    let first = volume * s / 4.0;
    out[9] = first.x;
    out[10] = first.y;
    out[11] = first.z;
    out
}

/// Phase 1 for one cell: fold the owned particles of `cell`
///
/// Arena slots below `owned_count` are owned by `processor`.
pub fn reduce_cell(
    cell: &CellView,
    owned_count: usize,
    processor: usize,
    types: &BTreeSet<ReductionType>,
) -> ReductionParticle {
    let mut rp = ReductionParticle::new(cell.cell_id, processor, types);
    let mesh = cell.mesh();

    let wants_triangles = [
        Quantity::Volume,
        Quantity::Area,
        Quantity::TileSpan,
        Quantity::Inertia,
    ]
    .into_iter()
    .any(|q| rp.wants(q));
    let wants_edges = rp.wants(Quantity::EdgeLength) || rp.wants(Quantity::Angle);

    let mut position_sum = DVec3::ZERO;
    for vertex in cell.vertices() {
        let Some(slot) = cell.slots().slot(vertex) else {
            continue;
        };
        if slot >= owned_count {
            continue;
        }
        let Some(particle) = cell.particle(vertex) else {
            continue;
        };

        rp.n_particles += 1;
        position_sum += particle.position;

        rp.push(Quantity::Position, particle.position);
        rp.push(Quantity::UnwrappedPosition, particle.position);
        rp.push(Quantity::Velocity, particle.velocity);
        rp.push(Quantity::Energy, particle.energy);
        rp.push(Quantity::Force, particle.force);
        rp.push(Quantity::Torque, particle.position.cross(particle.force));

        if wants_triangles {
            for &t in mesh.triangles_owned_by(vertex) {
                if !cell.has_triangle(t) {
                    continue;
                }
                let [x1, x2, x3] = cell.triangle_corners(t);
                let area = primitives::triangle_area(x1, x2, x3);
                let span = (x2 - x1).length().max((x3 - x2).length()).max((x1 - x3).length());
                rp.push(Quantity::Volume, primitives::signed_volume(x1, x2, x3));
                rp.push(Quantity::Area, area);
                rp.push(Quantity::TileSpan, span);
                if rp.wants(Quantity::Inertia) {
                    rp.push(Quantity::Inertia, tetrahedron_moments(x1, x2, x3));
                }
            }
        }

        if wants_edges {
            for &e in mesh.edges_owned_by(vertex) {
                let edge = &mesh.edges()[e];
                if cell.particle(edge.b).is_none() {
                    continue;
                }
                rp.push(Quantity::EdgeLength, (cell.vertex(edge.b) - cell.vertex(edge.a)).length());

                let opposite_visible = edge
                    .opposite
                    .iter()
                    .all(|o| o.is_some_and(|v| cell.particle(v).is_some()));
                if edge.is_interior() && opposite_visible {
                    if let Some(angle) = cell.compute_signed_angle(edge.a, edge.b) {
                        rp.push(Quantity::Angle, angle.angle);
                    }
                }
            }
        }
    }

    if rp.n_particles > 0 {
        rp.position = position_sum / rp.n_particles as f64;
    }
    rp
}

/// Phase 2: merge reduction particles into per-cell quantities
///
/// Only cells listed in `cells` are merged; contributions with a
/// `(processor, cell_id)` pair seen before are skipped.
pub fn merge<'a>(
    particles: impl IntoIterator<Item = &'a ReductionParticle>,
    cells: &BTreeSet<CellId>,
    requested: &[ReductionType],
) -> BTreeMap<CellId, CellQuantities> {
    let types = required_types(requested);
    let mut seen: HashSet<(usize, CellId)> = HashSet::new();
    let mut merged: BTreeMap<CellId, (usize, BTreeMap<ReductionType, Partial>)> = BTreeMap::new();

    for rp in particles {
        if !cells.contains(&rp.cell_id) || !seen.insert((rp.processor, rp.cell_id)) {
            continue;
        }
        let (count, partials) = merged.entry(rp.cell_id).or_insert_with(|| {
            let partials = types
                .iter()
                .filter(|ty| !ty.is_derived())
                .map(|&ty| (ty, Partial::new(ty)))
                .collect();
            (0, partials)
        });
        *count += rp.n_particles;
        for (ty, partial) in partials.iter_mut() {
            if let Some(other) = rp.quantities.get(ty) {
                partial.merge(ty.statistic, other);
            }
        }
    }

    let requested: Vec<ReductionType> = types.into_iter().collect();
    merged
        .into_iter()
        .map(|(cell_id, (count, partials))| {
            (cell_id, CellQuantities::finalize(cell_id, count, partials, &requested))
        })
        .collect()
}
