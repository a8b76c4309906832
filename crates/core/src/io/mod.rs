//! Raster file input and output

pub mod asc;

pub use asc::{Raster, RasterHeader, DEFAULT_NODATA};
