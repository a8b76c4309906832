//! Explicit diffusion solver for ice thickness
//!
//! # Example
//!
//! ```rust
//! use ice_dome_core::core_types::FieldData;
//! use ice_dome_core::solver::{DiffusionParams, DiffusionStepper};
//!
//! let params = DiffusionParams { diffusivity: 1000.0, dt: 100.0 };
//! let stepper = DiffusionStepper::new(params, 1000.0).unwrap();
//!
//! let mut thickness = FieldData::new(5, 5);
//! thickness.set(2, 2, 3000.0);
//! let last = stepper.run(stepper.initial_state(thickness), 10).last().unwrap();
//! assert_eq!(last.step_index(), 10);
//! ```

mod diffusion;
mod state;

// Re-exports
pub use diffusion::{
    artificial_diffusivity, max_stable_dt, step_diffusion_cpu, DiffusionParams, DiffusionStepper,
    MAX_COURANT, MAX_STEPS,
};
pub use state::{SimulationState, StepRun};
