//! Fixed-shape 2-D scalar fields
//!
//! Elevation, bed and thickness grids are all stored as a flat `Vec<f64>` in
//! row-major order (`y * width + x`), with row 0 being the northernmost row
//! of the raster. The shape is validated once at construction and never
//! changes afterwards.

use crate::error::{DomeError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// 2-D field of `f64` values with a fixed `width × height` shape
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    /// Field values in row-major order (y * width + x)
    data: Vec<f64>,
    /// Grid width in cells (raster `ncols`)
    width: usize,
    /// Grid height in cells (raster `nrows`)
    height: usize,
}

/// Number of cells in a `width × height` grid
///
/// # Errors
///
/// Returns [`DomeError::Format`] if a dimension is zero or the product
/// overflows `usize`
pub fn cell_count(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(DomeError::format(format!(
            "field dimensions must be positive, got {width}x{height}"
        )));
    }
    width.checked_mul(height).ok_or_else(|| {
        DomeError::format(format!("field dimensions {width}x{height} overflow"))
    })
}

impl FieldData {
    /// Create a new field with given dimensions, initialized to zero
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or `width * height` overflows
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Create a new field with given dimensions, initialized to a value
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or `width * height` overflows
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        assert!(width > 0 && height > 0, "Field dimensions must be positive");
        let Some(len) = width.checked_mul(height) else {
            panic!("Field dimensions {width}x{height} overflow");
        };
        Self {
            data: vec![value; len],
            width,
            height,
        }
    }

    /// Wrap a row-major vector as a field
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Format`] if a dimension is zero, `width * height`
    /// overflows, or the vector length is not `width * height`
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        let len = cell_count(width, height)?;
        if data.len() != len {
            return Err(DomeError::format(format!(
                "field size mismatch: expected {}x{} = {} values, got {}",
                width,
                height,
                len,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a field from a list of equally long rows (north to south)
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Format`] if there are no rows, a row is empty, or
    /// the rows are ragged
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(cell_count(width, height).unwrap_or(0));
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(DomeError::format(format!(
                    "row {y} has {} values, expected {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(width, height, data)
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Fields are never empty; provided for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when both fields have the same `width × height`
    #[inline]
    pub fn same_shape(&self, other: &FieldData) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the field and return its row-major data
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Fill entire field with a value
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// True if the cell lies on the outer ring of the grid
    #[inline]
    pub fn is_boundary(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// Iterate over rows, north to south
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.width)
    }

    /// Apply `f` to every cell, producing a new field of the same shape
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Combine two same-shaped fields cell by cell
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::ShapeMismatch`] if the shapes differ
    pub fn zip_map(&self, other: &FieldData, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        if !self.same_shape(other) {
            return Err(DomeError::shape_mismatch(format!(
                "{}x{} field combined with {}x{} field",
                self.width, self.height, other.width, other.height
            )));
        }
        Ok(Self {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
            width: self.width,
            height: self.height,
        })
    }

    /// Copy into an `nrows × ncols` matrix for plotting backends
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.height, self.width, &self.data)
    }

    /// Summary statistics over all cells
    pub fn stats(&self) -> FieldStats {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        FieldStats {
            min,
            max,
            mean: sum / self.data.len() as f64,
            sum,
        }
    }
}

/// Summary statistics of a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Smallest cell value
    pub min: f64,
    /// Largest cell value
    pub max: f64,
    /// Arithmetic mean over all cells
    pub mean: f64,
    /// Sum over all cells
    pub sum: f64,
}

impl FieldStats {
    /// Volume represented by the field when each cell covers `cellsize²`
    pub fn volume(&self, cellsize: f64) -> f64 {
        self.sum * cellsize * cellsize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = FieldData::new(10, 20);
        assert_eq!(field.width(), 10);
        assert_eq!(field.height(), 20);
        assert_eq!(field.len(), 200);
        assert!(field.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_field_get_set() {
        let mut field = FieldData::new(10, 10);
        field.set(3, 4, 123.45);
        assert_eq!(field.get(3, 4), 123.45);

        // Verify row-major indexing
        let index = 4 * 10 + 3;
        assert_eq!(field.as_slice()[index], 123.45);
    }

    #[test]
    fn test_from_rows_keeps_row_order() {
        let field = FieldData::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 2);
        assert_eq!(field.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let rows: Vec<&[f64]> = field.rows().collect();
        assert_eq!(rows[1], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            FieldData::from_rows(&rows),
            Err(DomeError::Format { .. })
        ));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        assert!(matches!(
            FieldData::from_vec(usize::MAX, 2, vec![0.0; 4]),
            Err(DomeError::Format { .. })
        ));
        assert!(cell_count(0, 5).is_err());
        assert_eq!(cell_count(4, 5).unwrap(), 20);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(FieldData::from_vec(3, 3, vec![0.0; 8]).is_err());
        assert!(FieldData::from_vec(0, 3, Vec::new()).is_err());
    }

    #[test]
    fn test_zip_map_requires_same_shape() {
        let a = FieldData::with_value(4, 3, 2.0);
        let b = FieldData::with_value(3, 4, 1.0);
        assert!(matches!(
            a.zip_map(&b, |x, y| x - y),
            Err(DomeError::ShapeMismatch { .. })
        ));
        let c = FieldData::with_value(4, 3, 0.5);
        let diff = a.zip_map(&c, |x, y| x - y).unwrap();
        assert!(diff.as_slice().iter().all(|&v| v == 1.5));
    }

    #[test]
    fn test_boundary_ring() {
        let field = FieldData::new(4, 3);
        assert!(field.is_boundary(0, 1));
        assert!(field.is_boundary(3, 1));
        assert!(field.is_boundary(2, 0));
        assert!(field.is_boundary(2, 2));
        assert!(!field.is_boundary(1, 1));
        assert!(!field.is_boundary(2, 1));
    }

    #[test]
    fn test_to_matrix_matches_row_col() {
        let field = FieldData::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let m = field.to_matrix();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
    }

    #[test]
    fn test_stats() {
        let field = FieldData::from_rows(&[[1.0, 2.0], [3.0, 6.0]]).unwrap();
        let stats = field.stats();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.sum, 12.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.volume(10.0), 1200.0);
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = FieldData::new(10, 10);
        let _ = field.get(10, 5); // Out of bounds
    }
}
