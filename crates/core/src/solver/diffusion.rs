//! Explicit finite-difference diffusion of ice thickness
//!
//! Solves the 2-D diffusion equation with an FTCS scheme:
//! ```text
//! ∂h/∂t = D∇²h
//! h_new = h + D·Δt/Δx² · (h_w + h_e + h_n + h_s - 4h)
//! ```
//!
//! The scheme is stable for `D·Δt/Δx² ≤ 1/4`. The bound is checked when the
//! stepper is built, so an unstable configuration never advances a single
//! step. Boundary cells are held at their initial values (Dirichlet).
//!
//! # Artificial diffusion
//!
//! Ice flow is advective, but over long time scales a dome relaxes much like
//! a diffusing field. Following the EISMINT lessons on ice dome relaxation, the
//! diffusivity is approximated from the ice speed and grid spacing as
//! `D = v·Δx/2`.

use super::state::{SimulationState, StepRun};
use crate::core_types::units::{Meters, MetersPerYear, SquareMetersPerYear};
use crate::core_types::FieldData;
use crate::error::{DomeError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Largest Courant number `D·Δt/Δx²` allowed by the 5-point explicit scheme
pub const MAX_COURANT: f64 = 0.25;

/// Longest run in steps; beyond 2^53 the clock can no longer count steps exactly
pub const MAX_STEPS: u64 = 1 << 53;

/// Diffusion parameters in model units (metres, years)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffusionParams {
    /// Diffusivity D (m²/yr)
    pub diffusivity: f64,
    /// Time step Δt (yr)
    pub dt: f64,
}

/// Artificial diffusivity `D = v·Δx/2` for ice moving at `velocity`
pub fn artificial_diffusivity(velocity: MetersPerYear, cellsize: Meters) -> SquareMetersPerYear {
    velocity * cellsize / 2.0
}

/// Largest stable time step `Δx²/(4D)`; infinite when `D` is zero
pub fn max_stable_dt(diffusivity: f64, cellsize: f64) -> f64 {
    if diffusivity == 0.0 {
        f64::INFINITY
    } else {
        cellsize * cellsize / (4.0 * diffusivity)
    }
}

/// Advance one FTCS step from `h_in` into `h_out`
///
/// `coefficient` is `D·Δt/Δx²`. Edge cells are copied unchanged. Rows are
/// updated in parallel; every output cell depends only on `h_in`, so the
/// result is identical to a sequential sweep.
///
/// # Arguments
///
/// * `h_in` - Current field (row-major)
/// * `h_out` - Output field (row-major, same length)
/// * `width` - Grid width in cells
/// * `height` - Grid height in cells
/// * `coefficient` - Dimensionless update coefficient
pub fn step_diffusion_cpu(
    h_in: &[f64],
    h_out: &mut [f64],
    width: usize,
    height: usize,
    coefficient: f64,
) {
    debug_assert_eq!(h_in.len(), width * height);
    debug_assert_eq!(h_out.len(), width * height);

    h_out
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let idx = y * width + x;

                // Boundary conditions: Dirichlet (edges keep their value)
                if x == 0 || x == width - 1 || y == 0 || y == height - 1 {
                    *cell = h_in[idx];
                    continue;
                }

                let h = h_in[idx];
                let laplacian =
                    h_in[idx - 1] + h_in[idx + 1] + h_in[idx - width] + h_in[idx + width]
                        - 4.0 * h;
                *cell = h + coefficient * laplacian;
            }
        });
}

/// Validated explicit diffusion stepper
///
/// Holds no field data and no history; the caller owns the
/// [`SimulationState`] and decides how long to keep snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionStepper {
    params: DiffusionParams,
    cellsize: f64,
    coefficient: f64,
}

impl DiffusionStepper {
    /// Build a stepper, enforcing `Δt ≤ Δx²/(4D)`
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Stability`] if the diffusivity is negative or not
    /// finite, `dt` or `cellsize` is not finite and positive, or `dt`
    /// exceeds the stability bound
    pub fn new(params: DiffusionParams, cellsize: f64) -> Result<Self> {
        let DiffusionParams { diffusivity, dt } = params;
        if !(diffusivity.is_finite() && diffusivity >= 0.0) {
            return Err(DomeError::stability(format!(
                "diffusivity must be finite and non-negative, got {diffusivity}"
            )));
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DomeError::stability(format!(
                "time step must be finite and positive, got {dt}"
            )));
        }
        if !(cellsize.is_finite() && cellsize > 0.0) {
            return Err(DomeError::stability(format!(
                "cellsize must be finite and positive, got {cellsize}"
            )));
        }

        let limit = max_stable_dt(diffusivity, cellsize);
        if dt > limit {
            return Err(DomeError::stability(format!(
                "dt = {dt} exceeds cellsize²/(4D) = {limit} (D = {diffusivity}, cellsize = {cellsize})"
            )));
        }

        let coefficient = diffusivity * dt / (cellsize * cellsize);
        debug!(
            diffusivity,
            dt,
            cellsize,
            courant = coefficient,
            "Configured diffusion stepper"
        );

        Ok(Self {
            params,
            cellsize,
            coefficient,
        })
    }

    /// Parameters this stepper was validated with
    pub fn params(&self) -> DiffusionParams {
        self.params
    }

    /// Grid spacing
    pub fn cellsize(&self) -> f64 {
        self.cellsize
    }

    /// Courant number `D·Δt/Δx²` (at most [`MAX_COURANT`])
    pub fn courant_number(&self) -> f64 {
        self.coefficient
    }

    /// Number of whole steps that fit in `total_time`
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Stability`] if `total_time` is not finite or
    /// needs more than [`MAX_STEPS`] steps
    pub fn steps_for_duration(&self, total_time: f64) -> Result<usize> {
        if !total_time.is_finite() {
            return Err(DomeError::stability(format!(
                "total time must be finite, got {total_time}"
            )));
        }
        if total_time <= 0.0 {
            return Ok(0);
        }
        let steps = (total_time / self.params.dt).floor();
        if steps > MAX_STEPS as f64 {
            return Err(DomeError::stability(format!(
                "total time {total_time} needs {steps:e} steps of {} yr, more than {MAX_STEPS}",
                self.params.dt
            )));
        }
        usize::try_from(steps as u64).map_err(|_| {
            DomeError::stability(format!("{steps} steps do not fit in this platform's usize"))
        })
    }

    /// Fresh state at `t = 0` for a thickness field
    pub fn initial_state(&self, thickness: FieldData) -> SimulationState {
        SimulationState::new(thickness, self.params)
    }

    /// Advance `state` by one time step in place
    ///
    /// Interior cells receive the 5-point update, edges stay fixed, then the
    /// buffers are swapped and the clock advances by `Δt`.
    pub fn step(&self, state: &mut SimulationState) {
        let (current, next) = state.buffers_mut();
        let (width, height) = (current.width(), current.height());
        step_diffusion_cpu(
            current.as_slice(),
            next.as_mut_slice(),
            width,
            height,
            self.coefficient,
        );
        state.swap_buffers();
        state.advance_clock(self.params);
        trace!(
            step = state.step_index(),
            elapsed = state.elapsed(),
            "Diffusion step"
        );
    }

    /// Lazily run `n_steps` steps, yielding a snapshot after each one
    ///
    /// The returned iterator owns `state`; call [`StepRun::into_state`] to
    /// recover it after stopping early.
    pub fn run(&self, state: SimulationState, n_steps: usize) -> StepRun<'_> {
        StepRun::new(self, state, n_steps)
    }

    /// Run `n_steps` steps in place without keeping snapshots
    pub fn advance(&self, state: &mut SimulationState, n_steps: usize) {
        for _ in 0..n_steps {
            self.step(state);
        }
    }
}
