//! End-to-end ice dome run
//!
//! Ties the pipeline together: aligned grid → validated stepper → explicit
//! time stepping → frames for visualizers. Stability is checked when the
//! simulation is built, before any step runs.

use crate::config::SimulationConfig;
use crate::core_types::{FieldData, FieldStats};
use crate::error::Result;
use crate::grid::IceGrid;
use crate::solver::{DiffusionStepper, SimulationState};
use crate::viz::{FieldFrame, FrameKind, Visualizer};
use std::path::Path;
use tracing::{info, warn};

/// Diffusion run over one surface/bed grid
#[derive(Debug, Clone)]
pub struct DomeSimulation {
    grid: IceGrid,
    config: SimulationConfig,
    stepper: DiffusionStepper,
    n_steps: usize,
}

/// Outcome of [`DomeSimulation::run`]
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// State after the last step
    pub state: SimulationState,
    /// Surface elevation implied by the final thickness
    pub final_surface: FieldData,
    /// Thickness statistics before the first step
    pub initial_stats: FieldStats,
    /// Thickness statistics after the last step
    pub final_stats: FieldStats,
    /// Initial minus final thickness; positive where the ice thinned
    pub thickness_change: FieldData,
    /// Thickness frames captured during the run, initial and final included
    pub frames: Vec<FieldFrame>,
    /// Visualizers that reported an error
    pub visualizer_failures: Vec<String>,
}

impl SimulationReport {
    /// Relative change in ice volume over the run
    pub fn volume_change(&self) -> f64 {
        if self.initial_stats.sum == 0.0 {
            0.0
        } else {
            (self.final_stats.sum - self.initial_stats.sum) / self.initial_stats.sum
        }
    }
}

impl DomeSimulation {
    /// Prepare a run on an existing grid
    ///
    /// # Errors
    ///
    /// Returns [`crate::DomeError::Stability`] if the configuration cannot be
    /// integrated stably on this grid or asks for too many steps
    pub fn new(grid: IceGrid, config: SimulationConfig) -> Result<Self> {
        let stepper = config.stepper(grid.cellsize())?;
        let n_steps = stepper.steps_for_duration(*config.total_time)?;
        Ok(Self {
            grid,
            config,
            stepper,
            n_steps,
        })
    }

    /// Load surface and bed rasters and prepare a run
    ///
    /// # Errors
    ///
    /// Returns any I/O, format, shape or stability error
    pub fn from_paths(
        surface: impl AsRef<Path>,
        bed: impl AsRef<Path>,
        config: SimulationConfig,
    ) -> Result<Self> {
        Self::new(IceGrid::from_paths(surface, bed)?, config)
    }

    /// Grid being simulated
    pub fn grid(&self) -> &IceGrid {
        &self.grid
    }

    /// Run configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Validated stepper
    pub fn stepper(&self) -> &DiffusionStepper {
        &self.stepper
    }

    /// Steps the run will take
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// State at `t = 0`
    pub fn initial_state(&self) -> SimulationState {
        self.stepper.initial_state(self.grid.thickness().clone())
    }

    /// Step indices at which thickness frames are captured
    pub fn frame_steps(&self) -> Vec<usize> {
        // More frames than steps would only repeat indices
        let segments = self
            .config
            .frames
            .saturating_add(1)
            .min(self.n_steps.max(1));
        let mut steps: Vec<usize> = (0..=segments)
            .map(|k| (k as u128 * self.n_steps as u128 / segments as u128) as usize)
            .collect();
        steps.dedup();
        steps
    }

    /// Run to completion and hand the frames to every visualizer
    ///
    /// Each visualizer receives the thickness series, then the bed, the
    /// final surface and the change in thickness. Visualizer failures are
    /// logged and recorded in the report; they do not affect the computed
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DomeError::ShapeMismatch`] if the evolved thickness
    /// no longer matches the grid
    pub fn run(&self, visualizers: &mut [&mut dyn Visualizer]) -> Result<SimulationReport> {
        let mut state = self.initial_state();
        let initial_stats = state.thickness().stats();
        info!(
            steps = self.n_steps,
            dt = self.stepper.params().dt,
            diffusivity = self.stepper.params().diffusivity,
            courant = self.stepper.courant_number(),
            max_thickness = initial_stats.max,
            "Starting ice dome diffusion"
        );

        let mut frames = Vec::new();
        let mut done = 0_usize;
        for target in self.frame_steps() {
            self.stepper.advance(&mut state, target - done);
            done = target;
            frames.push(frame(FrameKind::Thickness, &state, state.thickness().clone()));
        }

        let final_stats = state.thickness().stats();
        let final_surface = self.grid.surface_from_thickness(state.thickness())?;
        let thickness_change = self
            .grid
            .thickness()
            .zip_map(state.thickness(), |initial, current| initial - current)?;

        let change_stats = thickness_change.stats();
        info!(
            steps = state.step_index(),
            elapsed = state.elapsed(),
            max_thickness = final_stats.max,
            mean_thickness = final_stats.mean,
            max_thinning = change_stats.max,
            max_thickening = -change_stats.min,
            "Finished ice dome diffusion"
        );

        let bed_frame = FieldFrame {
            kind: FrameKind::Bed,
            step_index: 0,
            elapsed: 0.0,
            field: self.grid.bed().clone(),
        };
        let summary = [
            bed_frame,
            frame(FrameKind::Surface, &state, final_surface.clone()),
            frame(FrameKind::ThicknessChange, &state, thickness_change.clone()),
        ];

        let mut visualizer_failures = Vec::new();
        for vis in visualizers {
            let result = vis
                .render_series(&self.grid, &frames)
                .and_then(|()| vis.render_series(&self.grid, &summary));
            if let Err(e) = result {
                warn!(visualizer = vis.name(), error = %e, "Visualizer failed, continuing");
                visualizer_failures.push(vis.name().to_string());
            }
        }

        Ok(SimulationReport {
            state,
            final_surface,
            initial_stats,
            final_stats,
            thickness_change,
            frames,
            visualizer_failures,
        })
    }
}

fn frame(kind: FrameKind, state: &SimulationState, field: FieldData) -> FieldFrame {
    FieldFrame {
        kind,
        step_index: state.step_index(),
        elapsed: state.elapsed(),
        field,
    }
}
