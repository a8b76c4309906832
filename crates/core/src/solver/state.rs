//! Simulation state and lazy step sequences

use super::diffusion::{DiffusionParams, DiffusionStepper};
use crate::core_types::FieldData;
use std::iter::FusedIterator;

/// Thickness field plus clock, owned by whoever drives the simulation
///
/// Cloning a state produces a snapshot that can later be handed back to
/// [`DiffusionStepper::run`] to continue from that point.
#[derive(Debug, Clone)]
pub struct SimulationState {
    // Ping-pong buffers (read from one, write to other, then swap)
    thickness: FieldData,
    back: FieldData,

    elapsed: f64,
    step_index: u64,
    params: DiffusionParams,
}

impl SimulationState {
    pub(crate) fn new(thickness: FieldData, params: DiffusionParams) -> Self {
        let back = FieldData::new(thickness.width(), thickness.height());
        Self {
            thickness,
            back,
            elapsed: 0.0,
            step_index: 0,
            params,
        }
    }

    /// Current thickness field
    pub fn thickness(&self) -> &FieldData {
        &self.thickness
    }

    /// Consume the state and keep only its thickness field
    pub fn into_thickness(self) -> FieldData {
        self.thickness
    }

    /// Simulated time since the initial state (yr)
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of steps taken since the initial state
    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    /// Diffusivity of the last applied step (m²/yr)
    pub fn diffusivity(&self) -> f64 {
        self.params.diffusivity
    }

    /// Time step of the last applied step (yr)
    pub fn dt(&self) -> f64 {
        self.params.dt
    }

    pub(crate) fn buffers_mut(&mut self) -> (&FieldData, &mut FieldData) {
        (&self.thickness, &mut self.back)
    }

    pub(crate) fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.thickness, &mut self.back);
    }

    pub(crate) fn advance_clock(&mut self, params: DiffusionParams) {
        self.params = params;
        self.elapsed += params.dt;
        self.step_index += 1;
    }
}

/// Lazy, finite sequence of states produced by [`DiffusionStepper::run`]
///
/// Each item is an owned snapshot taken after one step. Nothing is computed
/// until the iterator is polled.
pub struct StepRun<'a> {
    stepper: &'a DiffusionStepper,
    state: SimulationState,
    remaining: usize,
}

impl<'a> StepRun<'a> {
    pub(crate) fn new(stepper: &'a DiffusionStepper, state: SimulationState, n_steps: usize) -> Self {
        Self {
            stepper,
            state,
            remaining: n_steps,
        }
    }

    /// State after the most recent step
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Stop iterating and take back the state
    pub fn into_state(self) -> SimulationState {
        self.state
    }
}

impl Iterator for StepRun<'_> {
    type Item = SimulationState;

    fn next(&mut self) -> Option<SimulationState> {
        if self.remaining == 0 {
            return None;
        }
        self.stepper.step(&mut self.state);
        self.remaining -= 1;
        Some(self.state.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StepRun<'_> {}

impl FusedIterator for StepRun<'_> {}
