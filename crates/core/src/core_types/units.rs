//! Semantic unit types for the quantities that flow through the configuration
//!
//! Glaciological runs mix metres, years and diffusivities in m²/yr; these
//! newtypes keep them from being swapped by accident at API boundaries. The
//! numeric kernels work on plain `f64` once values are validated.
//!
//! # Usage
//! ```
//! use ice_dome_core::core_types::units::{Meters, MetersPerYear};
//!
//! let velocity = MetersPerYear::new(2.0);
//! let diffusivity = velocity * Meters::new(1000.0) / 2.0;
//! assert_eq!(*diffusivity, 1000.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, Div, Mul};

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(f64);

impl Meters {
    /// Create a new length
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Meters(value)
    }
}

impl Deref for Meters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl From<f64> for Meters {
    fn from(value: f64) -> Self {
        Meters(value)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m", self.0)
    }
}

/// Duration in years
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Years(f64);

impl Years {
    /// Create a new duration
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Years(value)
    }
}

impl Deref for Years {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl From<f64> for Years {
    fn from(value: f64) -> Self {
        Years(value)
    }
}

impl fmt::Display for Years {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} yr", self.0)
    }
}

/// Ice flow speed in metres per year
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MetersPerYear(f64);

impl MetersPerYear {
    /// Create a new speed
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MetersPerYear(value)
    }
}

impl Deref for MetersPerYear {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl fmt::Display for MetersPerYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m/yr", self.0)
    }
}

/// Speed × length gives a diffusivity
impl Mul<Meters> for MetersPerYear {
    type Output = SquareMetersPerYear;
    fn mul(self, rhs: Meters) -> SquareMetersPerYear {
        SquareMetersPerYear(self.0 * rhs.0)
    }
}

/// Diffusivity in square metres per year
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SquareMetersPerYear(f64);

impl SquareMetersPerYear {
    /// Create a new diffusivity
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        SquareMetersPerYear(value)
    }
}

impl Deref for SquareMetersPerYear {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Div<f64> for SquareMetersPerYear {
    type Output = SquareMetersPerYear;
    fn div(self, rhs: f64) -> SquareMetersPerYear {
        SquareMetersPerYear(self.0 / rhs)
    }
}

impl fmt::Display for SquareMetersPerYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m²/yr", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_times_length_is_diffusivity() {
        let d = MetersPerYear::new(2.0) * Meters::new(5000.0);
        assert_eq!(*d, 10000.0);
        assert_eq!(*(d / 2.0), 5000.0);
    }

    #[test]
    fn test_display_includes_units() {
        assert_eq!(Years::new(100.0).to_string(), "100 yr");
        assert_eq!(SquareMetersPerYear::new(0.5).to_string(), "0.5 m²/yr");
    }
}
