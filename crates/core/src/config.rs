//! Simulation configuration
//!
//! All run constants (time step, duration, diffusivity) are passed in
//! explicitly. Defaults reproduce the Dome Argus experiment: 100 kyr of
//! artificial diffusion in 100-year steps with ice moving at 2 m/yr.

use crate::core_types::units::{Meters, MetersPerYear, SquareMetersPerYear, Years};
use crate::error::{DomeError, Result};
use crate::solver::{artificial_diffusivity, DiffusionParams, DiffusionStepper};
use serde::{Deserialize, Serialize};

/// Where the diffusivity comes from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffusivitySource {
    /// Fixed diffusivity
    Explicit(SquareMetersPerYear),
    /// Artificial diffusivity `v·Δx/2` from a representative ice speed
    IceVelocity(MetersPerYear),
}

impl DiffusivitySource {
    /// Diffusivity in m²/yr on a grid with the given spacing
    pub fn resolve(&self, cellsize: f64) -> f64 {
        match *self {
            Self::Explicit(d) => *d,
            Self::IceVelocity(v) => *artificial_diffusivity(v, Meters::new(cellsize)),
        }
    }
}

/// Configuration for one diffusion run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Time step
    pub dt: Years,
    /// Total simulated time; the run takes `floor(total_time / dt)` steps
    pub total_time: Years,
    /// Diffusivity source
    pub diffusivity: DiffusivitySource,
    /// Intermediate frames handed to the visualizer between the initial and
    /// final fields (0 = initial and final only)
    pub frames: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: Years::new(100.0),
            total_time: Years::new(100_000.0),
            diffusivity: DiffusivitySource::IceVelocity(MetersPerYear::new(2.0)),
            frames: 0,
        }
    }
}

impl SimulationConfig {
    /// Set the time step
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Years::new(dt);
        self
    }

    /// Set the total simulated time
    pub fn with_total_time(mut self, total_time: f64) -> Self {
        self.total_time = Years::new(total_time);
        self
    }

    /// Use a fixed diffusivity
    pub fn with_diffusivity(mut self, diffusivity: f64) -> Self {
        self.diffusivity = DiffusivitySource::Explicit(SquareMetersPerYear::new(diffusivity));
        self
    }

    /// Derive the diffusivity from an ice speed
    pub fn with_ice_velocity(mut self, velocity: f64) -> Self {
        self.diffusivity = DiffusivitySource::IceVelocity(MetersPerYear::new(velocity));
        self
    }

    /// Set the number of intermediate frames
    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    /// Check values that the stepper does not see
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Stability`] if the total time is negative or not
    /// finite
    pub fn validate(&self) -> Result<()> {
        if !(self.total_time.is_finite() && *self.total_time >= 0.0) {
            return Err(DomeError::stability(format!(
                "total time must be finite and non-negative, got {}",
                self.total_time
            )));
        }
        Ok(())
    }

    /// Diffusion parameters on a grid with the given spacing
    pub fn diffusion_params(&self, cellsize: f64) -> DiffusionParams {
        DiffusionParams {
            diffusivity: self.diffusivity.resolve(cellsize),
            dt: *self.dt,
        }
    }

    /// Build a validated stepper for a grid with the given spacing
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Stability`] if the configuration is invalid or
    /// violates the explicit scheme's stability bound
    pub fn stepper(&self, cellsize: f64) -> Result<DiffusionStepper> {
        self.validate()?;
        DiffusionStepper::new(self.diffusion_params(cellsize), cellsize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_matches_dome_argus_run() {
        let config = SimulationConfig::default();
        let stepper = config.stepper(1000.0).unwrap();
        assert_relative_eq!(stepper.params().diffusivity, 1000.0);
        assert_relative_eq!(stepper.courant_number(), 0.1);
        assert_eq!(stepper.steps_for_duration(*config.total_time).unwrap(), 1000);
    }

    #[test]
    fn test_explicit_diffusivity() {
        let config = SimulationConfig::default()
            .with_diffusivity(0.02)
            .with_dt(5.0);
        let params = config.diffusion_params(2.0);
        assert_eq!(params.diffusivity, 0.02);
        assert_eq!(params.dt, 5.0);
    }

    #[test]
    fn test_unstable_config_rejected() {
        // D = 2 * 10 / 2 = 10, limit = 100 / 40 = 2.5
        let config = SimulationConfig::default()
            .with_ice_velocity(2.0)
            .with_dt(3.0);
        assert!(matches!(
            config.stepper(10.0),
            Err(DomeError::Stability { .. })
        ));
    }

    #[test]
    fn test_negative_total_time_rejected() {
        let config = SimulationConfig::default().with_total_time(-1.0);
        assert!(config.validate().is_err());
    }
}
