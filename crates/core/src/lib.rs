//! Ice Dome Diffusion Core Library
//!
//! Models the long-term relaxation of an Antarctic ice dome from BEDMAP2
//! surface and bed elevation grids. Ice flow is treated as artificial
//! diffusion of the ice-thickness field and integrated with an explicit
//! finite-difference scheme.
//!
//! ## Pipeline
//!
//! - [`io::asc`] reads and writes ESRI ASCII rasters
//! - [`grid`] aligns surface and bed and derives non-negative thickness
//! - [`solver`] advances the thickness field with a 5-point FTCS stencil,
//!   refusing configurations that violate `Δt ≤ Δx²/(4D)`
//! - [`viz`] hands finished fields to rendering collaborators
//! - [`simulation`] runs the whole pipeline from a [`SimulationConfig`]
//!
//! ```rust
//! use ice_dome_core::{DomeSimulation, IceGrid, SimulationConfig, SyntheticDome};
//!
//! let (surface, bed) = SyntheticDome { size: 16, ..Default::default() }.generate().unwrap();
//! let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
//! let config = SimulationConfig::default().with_total_time(1000.0);
//! let report = DomeSimulation::new(grid, config).unwrap().run(&mut []).unwrap();
//! assert_eq!(report.state.step_index(), 10);
//! ```

pub mod config;
pub mod core_types;
pub mod error;
pub mod grid;
pub mod io;
pub mod simulation;
pub mod solver;
pub mod viz;

// Re-export core types
pub use config::{DiffusivitySource, SimulationConfig};
pub use core_types::{FieldData, FieldStats};
pub use error::{DomeError, Result};

// Re-export pipeline types
pub use grid::{IceGrid, SyntheticDome};
pub use io::{Raster, RasterHeader};
pub use simulation::{DomeSimulation, SimulationReport};
pub use solver::{DiffusionParams, DiffusionStepper, SimulationState, StepRun};
pub use viz::{AscExporter, FieldFrame, FrameKind, VisualizeError, Visualizer};
