//! Synthetic surface/bed pairs for demos and tests
//!
//! Produces a Gaussian ice dome resting on a rough bed. Bed roughness comes
//! from a seeded RNG so runs are reproducible.

use crate::core_types::FieldData;
use crate::error::Result;
use crate::io::{Raster, RasterHeader, DEFAULT_NODATA};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters of a synthetic ice dome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDome {
    /// Cells along each side (square grid)
    pub size: usize,
    /// Grid spacing in metres
    pub cellsize: f64,
    /// Ice thickness at the dome centre (m)
    pub peak_thickness: f64,
    /// Gaussian radius of the dome, as a fraction of the grid width
    pub radius_fraction: f64,
    /// Mean bed elevation (m)
    pub bed_elevation: f64,
    /// Peak-to-peak random bed relief (m)
    pub bed_relief: f64,
    /// RNG seed for the bed relief
    pub seed: u64,
}

impl Default for SyntheticDome {
    /// A 1 km grid roughly the scale of the Dome Argus study area
    fn default() -> Self {
        Self {
            size: 60,
            cellsize: 1000.0,
            peak_thickness: 3000.0,
            radius_fraction: 0.25,
            bed_elevation: 500.0,
            bed_relief: 200.0,
            seed: 42,
        }
    }
}

impl SyntheticDome {
    /// Generate `(surface, bed)` rasters sharing one header
    ///
    /// # Errors
    ///
    /// Returns [`crate::DomeError::Format`] if `size` is zero or `cellsize`
    /// is not positive
    pub fn generate(&self) -> Result<(Raster, Raster)> {
        let header = RasterHeader {
            ncols: self.size,
            nrows: self.size,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: self.cellsize,
            nodata_value: DEFAULT_NODATA,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = self.size;
        let center = (n as f64 - 1.0) / 2.0;
        let radius = (self.radius_fraction * n as f64).max(f64::EPSILON);

        let mut bed = Vec::with_capacity(n * n);
        let mut surface = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                let dx = x as f64 - center;
                let dy = y as f64 - center;
                let dist_sq = dx * dx + dy * dy;

                // Gaussian dome profile
                let ice = self.peak_thickness * (-dist_sq / (radius * radius)).exp();
                let relief = if self.bed_relief > 0.0 {
                    rng.random_range(-0.5..0.5) * self.bed_relief
                } else {
                    0.0
                };
                let b = self.bed_elevation + relief;
                bed.push(b);
                surface.push(b + ice);
            }
        }

        let bed = Raster::new(header, FieldData::from_vec(n, n, bed)?)?;
        let surface = Raster::new(header, FieldData::from_vec(n, n, surface)?)?;
        Ok((surface, bed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::IceGrid;

    #[test]
    fn test_dome_peaks_in_centre() {
        let dome = SyntheticDome {
            size: 21,
            bed_relief: 0.0,
            ..Default::default()
        };
        let (surface, bed) = dome.generate().unwrap();
        let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
        let centre = grid.thickness().get(10, 10);
        assert!((centre - dome.peak_thickness).abs() < 1e-9);
        assert!(grid.thickness().get(0, 0) < centre);
    }

    #[test]
    fn test_same_seed_same_bed() {
        let dome = SyntheticDome {
            size: 8,
            ..Default::default()
        };
        let (_, a) = dome.generate().unwrap();
        let (_, b) = dome.generate().unwrap();
        assert_eq!(a, b);

        let other = SyntheticDome { seed: 7, ..dome };
        let (_, c) = other.generate().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_size_rejected() {
        let dome = SyntheticDome {
            size: 0,
            ..Default::default()
        };
        assert!(dome.generate().is_err());
    }
}
