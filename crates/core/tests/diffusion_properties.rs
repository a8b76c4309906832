//! Behavioural properties of the grid builder and diffusion stepper

mod common;

use approx::assert_relative_eq;
use ice_dome_core::io::{Raster, RasterHeader, DEFAULT_NODATA};
use ice_dome_core::solver::{DiffusionParams, DiffusionStepper};
use ice_dome_core::{DomeError, FieldData, IceGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_field(rng: &mut StdRng, width: usize, height: usize, lo: f64, hi: f64) -> FieldData {
    let data = (0..width * height).map(|_| rng.random_range(lo..hi)).collect();
    FieldData::from_vec(width, height, data).unwrap()
}

fn stepper(diffusivity: f64, dt: f64, cellsize: f64) -> DiffusionStepper {
    DiffusionStepper::new(DiffusionParams { diffusivity, dt }, cellsize).unwrap()
}

#[test]
fn test_thickness_never_negative() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let width = rng.random_range(1..20);
        let height = rng.random_range(1..20);
        let header = RasterHeader {
            ncols: width,
            nrows: height,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1000.0,
            nodata_value: DEFAULT_NODATA,
        };
        let surface = Raster::new(header, random_field(&mut rng, width, height, -500.0, 4000.0))
            .unwrap();
        let bed = Raster::new(header, random_field(&mut rng, width, height, -2000.0, 3000.0))
            .unwrap();
        let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
        assert!(grid.thickness().as_slice().iter().all(|&h| h >= 0.0));
    }
}

#[test]
fn test_zero_diffusivity_is_identity() {
    let mut rng = StdRng::seed_from_u64(11);
    let field = random_field(&mut rng, 15, 11, 0.0, 3000.0);
    let stepper = stepper(0.0, 100.0, 1000.0);
    let last = stepper
        .run(stepper.initial_state(field.clone()), 200)
        .last()
        .unwrap();
    assert_eq!(last.thickness(), &field);
    assert_eq!(last.step_index(), 200);
}

#[test]
fn test_split_run_equals_single_run() {
    let mut rng = StdRng::seed_from_u64(3);
    let field = random_field(&mut rng, 17, 13, 0.0, 3000.0);
    let stepper = stepper(1000.0, 200.0, 1000.0);

    for (n, m) in [(0, 9), (1, 1), (4, 7), (12, 0)] {
        let mut direct = stepper.initial_state(field.clone());
        stepper.advance(&mut direct, n + m);

        let mut run = stepper.run(stepper.initial_state(field.clone()), n);
        run.by_ref().for_each(drop);
        let mut resumed = run.into_state();
        stepper.advance(&mut resumed, m);

        assert_eq!(resumed.thickness(), direct.thickness(), "n={n} m={m}");
        assert_eq!(resumed.step_index(), direct.step_index());
        assert_eq!(resumed.elapsed(), direct.elapsed());
    }
}

#[test]
fn test_unstable_dt_rejected_before_stepping() {
    // cellsize² / (4D) = 1e6 / 4000 = 250
    let result = DiffusionStepper::new(
        DiffusionParams {
            diffusivity: 1000.0,
            dt: 250.5,
        },
        1000.0,
    );
    match result {
        Err(DomeError::Stability { message }) => assert!(message.contains("250")),
        other => panic!("expected stability error, got {other:?}"),
    }
    assert!(DiffusionStepper::new(
        DiffusionParams {
            diffusivity: 1000.0,
            dt: 250.0,
        },
        1000.0,
    )
    .is_ok());
}

#[test]
fn test_boundary_cells_keep_initial_values() {
    let mut rng = StdRng::seed_from_u64(5);
    let field = random_field(&mut rng, 12, 9, 0.0, 3000.0);
    let stepper = stepper(1.0, 0.25, 1.0);

    for state in stepper.run(stepper.initial_state(field.clone()), 40) {
        let h = state.thickness();
        for y in 0..field.height() {
            for x in 0..field.width() {
                if field.is_boundary(x, y) {
                    assert_eq!(h.get(x, y), field.get(x, y), "cell ({x}, {y})");
                }
            }
        }
    }
}

#[test]
fn test_interior_pulse_spreads_symmetrically_and_conserves_mass() {
    let size = 21;
    let mut field = FieldData::new(size, size);
    field.set(10, 10, 1000.0);
    let stepper = stepper(1.0, 0.2, 1.0);
    let mut state = stepper.initial_state(field);
    stepper.advance(&mut state, 8);

    let h = state.thickness();
    assert_relative_eq!(h.get(9, 10), h.get(11, 10), epsilon = 1e-9);
    assert_relative_eq!(h.get(10, 9), h.get(10, 11), epsilon = 1e-9);
    assert_relative_eq!(h.get(9, 10), h.get(10, 9), epsilon = 1e-9);
    assert!(h.get(10, 10) < 1000.0);
    // After 8 steps the pulse has not reached the cells next to the edges
    assert_relative_eq!(h.stats().sum, 1000.0, epsilon = 1e-6);
}

#[test]
fn test_narrow_grids_do_not_change() {
    let field = FieldData::from_rows(&[[5.0, 1.0, 9.0, 2.0], [3.0, 8.0, 4.0, 7.0]]).unwrap();
    let stepper = stepper(1.0, 0.25, 1.0);
    let mut state = stepper.initial_state(field.clone());
    stepper.advance(&mut state, 10);
    assert_eq!(state.thickness(), &field);
}
