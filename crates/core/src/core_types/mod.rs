//! Core data types shared by the parser, grid builder and stepper

pub mod field;
pub mod units;

pub use field::{FieldData, FieldStats};
pub use units::{Meters, MetersPerYear, SquareMetersPerYear, Years};
