//! Ficsion - membrane mechanics diagnostics
//!
//! Places one red blood cell in a prescribed linear shear flow and runs the
//! full per-step pipeline (forces, spreading, interpolation, advection,
//! reduction), reporting cell quantities as it goes.
//!
//! CLI Usage:
//!   cargo run                          # 1000 steps, shear rate 1e-3
//!   cargo run -- -n 5000 -s 2e-3 -p 2  # custom steps, shear rate, partitions
//!   cargo run -- -c my_params.json     # custom parameter file

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::{DVec3, IVec3};

use ficsion::{
    config::Parameters,
    coupling::{DenseFluidBlock, LatticeBox},
    field::{decompose, CellField},
    geometry::shapes,
    reduction::ReductionType,
};

const DEFAULT_CONFIG: &str = "data/parameters/simulation.json";

/// Evans-Fung rim radius of a healthy RBC (m)
const RBC_RADIUS_M: f64 = 3.91e-6;

struct Options {
    steps: usize,
    shear_rate: f64,
    partitions: i32,
    config: String,
}

/// Run the shear-flow diagnostics
fn run_diagnostics(options: &Options) -> Result<()> {
    println!("=== Ficsion - Membrane Diagnostics ===\n");

    let params = Parameters::load_or_default(&options.config);
    let species = params
        .species("RBC")
        .or_else(|| params.species.first())
        .context("no cell species configured")?;

    let radius = RBC_RADIUS_M / params.units.dx_m;
    let mesh = Arc::new(shapes::red_blood_cell(3, radius)?);
    println!("Species: {}", species.name);
    println!("Cell radius: {:.2} lattice units ({:.2} μm)", radius, RBC_RADIUS_M * 1e6);
    println!("Mesh: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());

    let size = IVec3::new(64, 40, 40);
    let global = LatticeBox::new(IVec3::ZERO, size - IVec3::ONE);
    let partitions = decompose(global, [options.partitions, 1, 1], params.coupling.envelope_width)?;
    let mut field = CellField::new(species, &params.units, &params.coupling, mesh.clone(), partitions)?;

    let center = size.as_dvec3() * 0.5;
    field.add_cell(0, &shapes::positions_at(&mesh, center))?;

    let equilibrium = field.model().equilibrium();
    let rest_volume = equilibrium.rest_volume;
    println!("Rest volume: {:.2}, rest surface: {:.2}", rest_volume, equilibrium.rest_surface);
    println!("Shear rate: {:.2e} per step", options.shear_rate);

    // Prescribed shear flow u_x = γ̇ (y − y_c) stands in for the fluid solver
    let shear = options.shear_rate;
    let mut blocks: Vec<DenseFluidBlock> = field
        .partitions()
        .iter()
        .map(|p| {
            let mut block = DenseFluidBlock::new(p.domain());
            block.set_velocity_field(|n| DVec3::new(shear * (n.y as f64 - center.y), 0.0, 0.0));
            block
        })
        .collect();

    let requested = [
        ReductionType::VOLUME,
        ReductionType::SURFACE,
        ReductionType::POSITION_MEAN,
        ReductionType::ENERGY,
        ReductionType::TAYLOR_INDEX,
        ReductionType::TUMBLING_ANGLES,
        ReductionType::DIAMETERS,
    ];

    println!("\n--- Running {} steps ---\n", options.steps);
    let report_every = (options.steps / 10).max(1);
    let start_time = Instant::now();
    let mut spread_force = 0.0;

    for step in 0..options.steps {
        let incomplete = field.apply_constitutive_model()?;
        if !incomplete.is_empty() {
            field.delete_incomplete_cells();
        }

        for block in &mut blocks {
            block.clear_forces();
        }
        field.spread_force_ibm(&mut blocks)?;
        spread_force = blocks.iter().map(|b| b.total_force().length()).sum::<f64>();

        field.interpolate_velocity_ibm(&blocks)?;
        field.advance_particles();

        if step % report_every == 0 || step + 1 == options.steps {
            let quantities = field.synchronize_cell_quantities(&requested);
            let Some(q) = quantities.get(&0) else {
                println!("  step {}: cell lost", step);
                break;
            };
            println!(
                "  step={:6}: V={:.3} S={:.3} E={:.4e} TI={:.4} angles=({:.3}, {:.3}, {:.3})",
                step,
                q.volume().unwrap_or(f64::NAN),
                q.surface().unwrap_or(f64::NAN),
                q.energy().unwrap_or(f64::NAN),
                q.taylor_index().unwrap_or(f64::NAN),
                q.tumbling_angles().map_or(f64::NAN, |a| a.x),
                q.tumbling_angles().map_or(f64::NAN, |a| a.y),
                q.tumbling_angles().map_or(f64::NAN, |a| a.z),
            );
        }
    }
    let elapsed = start_time.elapsed();

    let quantities = field.synchronize_cell_quantities(&requested);
    println!("\n=== Results ===");
    println!("Elapsed time: {:.2?}", elapsed);
    println!("Steps per second: {:.0}", options.steps as f64 / elapsed.as_secs_f64());
    println!("Force magnitude spread in last step: {:.4e}", spread_force);

    let Some(q) = quantities.get(&0) else {
        println!("⚠️  WARNING: cell was removed during the run");
        return Ok(());
    };
    let volume = q.volume().unwrap_or(f64::NAN);
    let drift = (volume - rest_volume) / rest_volume;
    println!("Final volume: {:.3} ({:+.3}% from rest)", volume, drift * 100.0);
    if let Some(d) = q.diameters() {
        println!("Ellipsoid diameters: ({:.3}, {:.3}, {:.3})", d.x, d.y, d.z);
    }

    println!("\n=== Diagnostic Checks ===");
    if drift.abs() > 0.05 {
        println!("⚠️  WARNING: volume drifted more than 5% - stiffness or time step too small/large");
    } else {
        println!("✓ Volume conserved within 5%");
    }
    match q.taylor_index() {
        Some(ti) if ti.is_finite() && ti < 1.0 => println!("✓ Taylor index {:.4} in range", ti),
        _ => println!("⚠️  WARNING: Taylor index unavailable or out of range"),
    }

    Ok(())
}

/// Parse CLI arguments
fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        steps: 1000,
        shear_rate: 1e-3,
        partitions: 2,
        config: DEFAULT_CONFIG.to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--steps" => {
                i += 1;
                if i < args.len() {
                    options.steps = args[i].parse().unwrap_or(1000);
                }
            }
            "-s" | "--shear" => {
                i += 1;
                if i < args.len() {
                    options.shear_rate = args[i].parse().unwrap_or(1e-3);
                }
            }
            "-p" | "--partitions" => {
                i += 1;
                if i < args.len() {
                    options.partitions = args[i].parse().unwrap_or(2);
                }
            }
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    options.config = args[i].clone();
                }
            }
            "--help" | "-h" => {
                println!("Ficsion membrane diagnostics");
                println!();
                println!("Usage: ficsion [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --steps <N>        Number of steps (default: 1000)");
                println!("  -s, --shear <RATE>     Shear rate in lattice units (default: 1e-3)");
                println!("  -p, --partitions <N>   Partitions along x (default: 2)");
                println!("  -c, --config <PATH>    Parameter file (default: {})", DEFAULT_CONFIG);
                println!("  -h, --help             Show this help");
                println!();
                println!("Set RUST_LOG=debug for detailed model output.");
                return None;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    Some(options)
}

fn main() -> Result<()> {
    env_logger::init();

    let Some(options) = parse_args() else {
        return Ok(());
    };
    run_diagnostics(&options)
}
