//! Aligned surface/bed grid and derived ice thickness
//!
//! Surface and bed rasters must share the same georeferencing. Thickness is
//! `surface - bed`, floored at zero because ice thickness cannot be
//! negative. Cells where either input holds its NODATA sentinel carry no ice.

use crate::core_types::FieldData;
use crate::error::{DomeError, Result};
use crate::io::{Raster, RasterHeader};
use nalgebra::DVector;
use std::path::Path;
use tracing::debug;

/// Coordinate axis `corner + i * cellsize` for `i` in `0..n`
pub fn axis(corner: f64, cellsize: f64, n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| corner + i as f64 * cellsize)
}

/// Surface, bed and thickness on a shared georeferenced grid
#[derive(Debug, Clone)]
pub struct IceGrid {
    header: RasterHeader,
    /// Easting of each column, west to east
    x: DVector<f64>,
    /// Northing of each row index counted from the south edge
    y: DVector<f64>,
    surface: FieldData,
    bed: FieldData,
    thickness: FieldData,
}

impl IceGrid {
    /// Build the grid from a surface and a bed raster
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::ShapeMismatch`] if the rasters differ in
    /// dimensions, cellsize or corner coordinates
    pub fn from_rasters(surface: &Raster, bed: &Raster) -> Result<Self> {
        check_aligned(surface.header(), bed.header())?;
        let header = *surface.header();
        let bed_header = *bed.header();

        let thickness = surface.values().zip_map(bed.values(), |s, b| {
            if header.is_nodata(s) || bed_header.is_nodata(b) {
                0.0
            } else {
                // NaN inputs also floor to zero
                (s - b).max(0.0)
            }
        })?;

        let x = axis(header.xllcorner, header.cellsize, header.ncols);
        let y = axis(header.yllcorner, header.cellsize, header.nrows);

        debug!(
            ncols = header.ncols,
            nrows = header.nrows,
            max_thickness = thickness.stats().max,
            "Built ice grid"
        );

        Ok(Self {
            header,
            x,
            y,
            surface: surface.values().clone(),
            bed: bed.values().clone(),
            thickness,
        })
    }

    /// Load both rasters from disk and build the grid
    ///
    /// # Errors
    ///
    /// Propagates [`DomeError::Io`] and [`DomeError::Format`] from parsing,
    /// and [`DomeError::ShapeMismatch`] from alignment checks
    pub fn from_paths(surface: impl AsRef<Path>, bed: impl AsRef<Path>) -> Result<Self> {
        let surface = Raster::from_path(surface)?;
        let bed = Raster::from_path(bed)?;
        Self::from_rasters(&surface, &bed)
    }

    /// Shared raster header
    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    /// Uniform grid spacing
    pub fn cellsize(&self) -> f64 {
        self.header.cellsize
    }

    /// Column coordinates (length `ncols`)
    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    /// Row coordinates from the south edge (length `nrows`)
    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    /// Northing of a data row; rows are stored north to south
    ///
    /// Returns `None` if `row` is outside the grid.
    pub fn northing_of_row(&self, row: usize) -> Option<f64> {
        let index = self.header.nrows.checked_sub(row)?.checked_sub(1)?;
        Some(self.y[index])
    }

    /// Surface elevation as loaded
    pub fn surface(&self) -> &FieldData {
        &self.surface
    }

    /// Bed elevation as loaded
    pub fn bed(&self) -> &FieldData {
        &self.bed
    }

    /// Initial ice thickness
    pub fn thickness(&self) -> &FieldData {
        &self.thickness
    }

    /// Surface elevation implied by a thickness field over this grid's bed
    ///
    /// Cells where the bed is NODATA keep the sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::ShapeMismatch`] if `thickness` has another shape
    pub fn surface_from_thickness(&self, thickness: &FieldData) -> Result<FieldData> {
        let header = self.header;
        self.bed.zip_map(thickness, |b, h| {
            if header.is_nodata(b) {
                header.nodata_value
            } else {
                b + h
            }
        })
    }

    /// Wrap any field on this grid (thickness, change, bed) in the grid's
    /// georeferencing
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Format`] if `field` has another shape
    pub fn field_raster(&self, field: &FieldData) -> Result<Raster> {
        Raster::new(self.header, field.clone())
    }

    /// Surface raster implied by a thickness field
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::ShapeMismatch`] if `thickness` has another shape
    pub fn surface_raster(&self, thickness: &FieldData) -> Result<Raster> {
        Raster::new(self.header, self.surface_from_thickness(thickness)?)
    }
}

fn check_aligned(surface: &RasterHeader, bed: &RasterHeader) -> Result<()> {
    if surface.ncols != bed.ncols || surface.nrows != bed.nrows {
        return Err(DomeError::shape_mismatch(format!(
            "surface is {}x{} but bed is {}x{}",
            surface.ncols, surface.nrows, bed.ncols, bed.nrows
        )));
    }
    if surface.cellsize != bed.cellsize {
        return Err(DomeError::shape_mismatch(format!(
            "surface cellsize {} differs from bed cellsize {}",
            surface.cellsize, bed.cellsize
        )));
    }
    if surface.origin() != bed.origin() {
        return Err(DomeError::shape_mismatch(format!(
            "surface corner {:?} differs from bed corner {:?}",
            surface.origin(),
            bed.origin()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DEFAULT_NODATA;

    fn raster(rows: &[[f64; 3]], xll: f64, cellsize: f64) -> Raster {
        let header = RasterHeader {
            ncols: 3,
            nrows: rows.len(),
            xllcorner: xll,
            yllcorner: 100.0,
            cellsize,
            nodata_value: DEFAULT_NODATA,
        };
        Raster::new(header, FieldData::from_rows(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_thickness_is_surface_minus_bed() {
        let surface = raster(&[[10.0, 12.0, 14.0], [9.0, 8.0, 7.0]], 0.0, 2.0);
        let bed = raster(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], 0.0, 2.0);
        let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
        assert_eq!(
            grid.thickness().as_slice(),
            &[9.0, 10.0, 11.0, 5.0, 3.0, 1.0]
        );
    }

    #[test]
    fn test_negative_thickness_floors_to_zero() {
        let surface = raster(&[[0.0, 5.0, 1.0]], 0.0, 1.0);
        let bed = raster(&[[3.0, 5.0, 0.5]], 0.0, 1.0);
        let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
        assert_eq!(grid.thickness().as_slice(), &[0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_nodata_cells_have_no_ice() {
        let surface = raster(&[[DEFAULT_NODATA, 50.0, 60.0]], 0.0, 1.0);
        let bed = raster(&[[0.0, DEFAULT_NODATA, 10.0]], 0.0, 1.0);
        let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
        assert_eq!(grid.thickness().as_slice(), &[0.0, 0.0, 50.0]);
    }

    #[test]
    fn test_coordinate_axes() {
        let surface = raster(&[[0.0; 3], [0.0; 3]], -500.0, 250.0);
        let grid = IceGrid::from_rasters(&surface, &surface).unwrap();
        assert_eq!(grid.x().as_slice(), &[-500.0, -250.0, 0.0]);
        assert_eq!(grid.y().as_slice(), &[100.0, 350.0]);
        // Row 0 is the northern edge
        assert_eq!(grid.northing_of_row(0), Some(350.0));
        assert_eq!(grid.northing_of_row(1), Some(100.0));
        assert_eq!(grid.northing_of_row(2), None);
        assert_eq!(grid.northing_of_row(usize::MAX), None);
    }

    #[test]
    fn test_misaligned_rasters_rejected() {
        let a = raster(&[[0.0; 3]], 0.0, 1.0);
        let shifted = raster(&[[0.0; 3]], 1.0, 1.0);
        let coarser = raster(&[[0.0; 3]], 0.0, 2.0);
        let taller = raster(&[[0.0; 3], [0.0; 3]], 0.0, 1.0);
        for other in [&shifted, &coarser, &taller] {
            assert!(matches!(
                IceGrid::from_rasters(&a, other),
                Err(DomeError::ShapeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_surface_from_thickness_restores_surface() {
        let surface = raster(&[[10.0, 12.0, 14.0]], 0.0, 1.0);
        let bed = raster(&[[1.0, 2.0, 3.0]], 0.0, 1.0);
        let grid = IceGrid::from_rasters(&surface, &bed).unwrap();
        let restored = grid.surface_from_thickness(grid.thickness()).unwrap();
        assert_eq!(restored.as_slice(), surface.values().as_slice());

        let exported = grid.surface_raster(grid.thickness()).unwrap();
        assert_eq!(exported.header(), surface.header());

        let bed_raster = grid.field_raster(grid.bed()).unwrap();
        assert_eq!(bed_raster.values(), bed.values());
    }
}
