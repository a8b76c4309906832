//! Grid construction from surface and bed rasters

pub mod ice_grid;
pub mod synthetic;

// Re-export main types
pub use ice_grid::*;
pub use synthetic::SyntheticDome;
