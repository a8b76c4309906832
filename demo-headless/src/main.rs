mod heatmap;

use clap::Parser;
use heatmap::TerminalHeatmap;
use ice_dome_core::solver::{DiffusionParams, DiffusionStepper};
use ice_dome_core::{
    AscExporter, DomeError, DomeSimulation, FieldData, IceGrid, SimulationConfig, SyntheticDome,
    Visualizer,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Antarctic ice dome diffusion with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "ice-dome")]
#[command(about = "Artificial diffusion of an Antarctic ice dome from BEDMAP2 grids", long_about = None)]
struct Args {
    /// Surface elevation ASC raster
    #[arg(short, long, requires = "bed")]
    surface: Option<PathBuf>,

    /// Bed elevation ASC raster
    #[arg(short, long, requires = "surface")]
    bed: Option<PathBuf>,

    /// Cells per side of the synthetic dome used when no rasters are given
    #[arg(long, default_value_t = 60)]
    synthetic_size: usize,

    /// Seed for the synthetic bed relief
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Time step in years
    #[arg(short = 't', long, default_value_t = 100.0)]
    dt: f64,

    /// Total simulated time in years
    #[arg(long, default_value_t = 100_000.0)]
    total_time: f64,

    /// Fixed diffusivity in m²/yr (overrides --ice-velocity)
    #[arg(short, long)]
    diffusivity: Option<f64>,

    /// Ice speed in m/yr used for artificial diffusivity v·Δx/2
    #[arg(long, default_value_t = 2.0)]
    ice_velocity: f64,

    /// Intermediate frames between the initial and final fields
    #[arg(short, long, default_value_t = 4)]
    frames: usize,

    /// Directory for ASC exports of every frame and the final surface
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum heatmap width in characters (0 disables the heatmap)
    #[arg(long, default_value_t = 60)]
    heatmap_width: usize,

    /// Run stepper validation checks
    #[arg(short, long)]
    validate: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulation aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), DomeError> {
    println!("=== Ice Dome Diffusion ===\n");

    let grid = match (&args.surface, &args.bed) {
        (Some(surface), Some(bed)) => {
            println!("Surface: {}", surface.display());
            println!("Bed:     {}", bed.display());
            IceGrid::from_paths(surface, bed)?
        }
        _ => {
            println!(
                "No rasters given, using a {0}x{0} synthetic dome (seed {1})",
                args.synthetic_size, args.seed
            );
            let (surface, bed) = SyntheticDome {
                size: args.synthetic_size,
                seed: args.seed,
                ..Default::default()
            }
            .generate()?;
            IceGrid::from_rasters(&surface, &bed)?
        }
    };

    let header = grid.header();
    println!(
        "Grid: {}x{} cells, {} m spacing, corner ({}, {})",
        header.ncols, header.nrows, header.cellsize, header.xllcorner, header.yllcorner
    );

    let mut config = SimulationConfig::default()
        .with_dt(args.dt)
        .with_total_time(args.total_time)
        .with_ice_velocity(args.ice_velocity)
        .with_frames(args.frames);
    if let Some(d) = args.diffusivity {
        config = config.with_diffusivity(d);
    }

    let sim = DomeSimulation::new(grid, config)?;
    let params = sim.stepper().params();
    println!(
        "Diffusivity: {:.3} m²/yr, dt: {} yr, Courant: {:.4}, steps: {}\n",
        params.diffusivity,
        params.dt,
        sim.stepper().courant_number(),
        sim.n_steps()
    );

    let mut heatmap = TerminalHeatmap::new(args.heatmap_width);
    let mut exporter = args.output_dir.as_ref().map(AscExporter::new);
    let mut visualizers: Vec<&mut dyn Visualizer> = Vec::new();
    if args.heatmap_width > 0 {
        visualizers.push(&mut heatmap);
    }
    if let Some(exporter) = exporter.as_mut() {
        visualizers.push(exporter);
    }

    let report = sim.run(&mut visualizers)?;
    drop(visualizers);

    let cell_area_km2 = sim.grid().cellsize() * sim.grid().cellsize() / 1e6;
    println!("\n Step   | Time(yr)  | Max(m)   | Mean(m)  | Volume(km³)");
    println!("--------|-----------|----------|----------|------------");
    for frame in &report.frames {
        let stats = frame.field.stats();
        println!(
            "{:7} | {:9.0} | {:8.1} | {:8.1} | {:11.1}",
            frame.step_index,
            frame.elapsed,
            stats.max,
            stats.mean,
            stats.sum * cell_area_km2 / 1000.0
        );
    }

    println!("\n=== Simulation Complete ===");
    println!("Simulated time: {:.0} yr", report.state.elapsed());
    println!(
        "Peak thickness: {:.1} m -> {:.1} m",
        report.initial_stats.max, report.final_stats.max
    );
    println!("Ice volume change: {:+.4}%", report.volume_change() * 100.0);
    let change = report.thickness_change.stats();
    println!(
        "Thickness change: up to {:.1} m thinner, up to {:.1} m thicker",
        change.max.max(0.0),
        (-change.min).max(0.0)
    );
    if let Some(exporter) = &exporter {
        println!(
            "Wrote {} ASC file(s) to {}",
            exporter.written().len(),
            exporter.dir().display()
        );
    }
    if !report.visualizer_failures.is_empty() {
        println!(
            "Visualizers with errors: {}",
            report.visualizer_failures.join(", ")
        );
    }

    if args.validate {
        run_validation_tests(sim.grid().cellsize(), params)?;
    }
    Ok(())
}

fn run_validation_tests(cellsize: f64, params: DiffusionParams) -> Result<(), DomeError> {
    println!("\n=== Running Validation Tests ===\n");

    let mut field = FieldData::with_value(9, 9, 100.0);
    field.set(4, 4, 1000.0);
    field.set(0, 3, 250.0);

    // Test 1: Zero diffusivity
    println!("Test 1: Zero Diffusivity");
    let frozen = DiffusionStepper::new(
        DiffusionParams {
            diffusivity: 0.0,
            ..params
        },
        cellsize,
    )?;
    let mut state = frozen.initial_state(field.clone());
    frozen.advance(&mut state, 50);
    report_check(*state.thickness() == field, "Field unchanged after 50 steps");

    // Test 2: Boundary cells
    println!("\nTest 2: Fixed Boundaries");
    let stepper = DiffusionStepper::new(params, cellsize)?;
    let mut state = stepper.initial_state(field.clone());
    stepper.advance(&mut state, 50);
    let edges_fixed = (0..9).all(|i| {
        [(i, 0), (i, 8), (0, i), (8, i)]
            .iter()
            .all(|&(x, y)| state.thickness().get(x, y) == field.get(x, y))
    });
    report_check(edges_fixed, "Edge cells keep their initial values");

    // Test 3: Composability
    println!("\nTest 3: Step Composability");
    let mut split = stepper.initial_state(field.clone());
    stepper.advance(&mut split, 20);
    stepper.advance(&mut split, 30);
    report_check(
        split.thickness() == state.thickness(),
        "20 + 30 steps equals 50 steps",
    );

    println!("\n=== Validation Complete ===");
    Ok(())
}

fn report_check(passed: bool, description: &str) {
    if passed {
        println!("  ✓ PASS: {description}");
    } else {
        println!("  ✗ FAIL: {description}");
    }
}
