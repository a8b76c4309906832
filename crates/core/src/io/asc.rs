//! ESRI ASCII raster (`.asc`) reading and writing
//!
//! BEDMAP2 surface and bed grids are distributed in this format: a short
//! `key value` header followed by `nrows` lines of `ncols` whitespace
//! separated numbers, north row first.
//!
//! ```text
//! ncols         3
//! nrows         2
//! xllcorner     0
//! yllcorner     0
//! cellsize      1
//! NODATA_value  -9999
//! 1 2 3
//! 4 5 6
//! ```
//!
//! Header keys are case-insensitive and may appear in any order.
//! `xllcenter`/`yllcenter` are accepted in place of the corner keys and are
//! converted to corners on read. Floats are written with Rust's shortest
//! round-trip formatting, so a written raster re-parses bit-for-bit.

use crate::core_types::field::cell_count;
use crate::core_types::FieldData;
use crate::error::{DomeError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// NODATA sentinel written when a header does not declare one
pub const DEFAULT_NODATA: f64 = -9999.0;

const KEY_NCOLS: &str = "ncols";
const KEY_NROWS: &str = "nrows";
const KEY_XLLCORNER: &str = "xllcorner";
const KEY_YLLCORNER: &str = "yllcorner";
const KEY_XLLCENTER: &str = "xllcenter";
const KEY_YLLCENTER: &str = "yllcenter";
const KEY_CELLSIZE: &str = "cellsize";
const KEY_NODATA: &str = "nodata_value";

/// Values reserved up front; larger rasters grow as rows are read
const MAX_INITIAL_RESERVE: usize = 1 << 20;

const KNOWN_KEYS: [&str; 8] = [
    KEY_NCOLS,
    KEY_NROWS,
    KEY_XLLCORNER,
    KEY_YLLCORNER,
    KEY_XLLCENTER,
    KEY_YLLCENTER,
    KEY_CELLSIZE,
    KEY_NODATA,
];

/// Georeferencing header of an ASC raster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterHeader {
    /// Number of columns (west to east)
    pub ncols: usize,
    /// Number of rows (north to south)
    pub nrows: usize,
    /// X coordinate of the lower-left corner
    pub xllcorner: f64,
    /// Y coordinate of the lower-left corner
    pub yllcorner: f64,
    /// Uniform cell spacing in both directions
    pub cellsize: f64,
    /// Sentinel marking missing cells
    pub nodata_value: f64,
}

impl RasterHeader {
    /// Lower-left corner `(x, y)`
    pub fn origin(&self) -> (f64, f64) {
        (self.xllcorner, self.yllcorner)
    }

    /// True if `value` is this raster's NODATA sentinel
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        if self.nodata_value.is_nan() {
            value.is_nan()
        } else {
            value == self.nodata_value
        }
    }

    /// Cells declared by the header
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Format`] if a dimension is zero or
    /// `ncols * nrows` overflows
    pub fn cell_count(&self) -> Result<usize> {
        cell_count(self.ncols, self.nrows).map_err(|_| {
            DomeError::format(format!(
                "grid dimensions must be positive and fit in memory, got ncols={} nrows={}",
                self.ncols, self.nrows
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        self.cell_count()?;
        if !(self.cellsize.is_finite() && self.cellsize > 0.0) {
            return Err(DomeError::format(format!(
                "cellsize must be finite and positive, got {}",
                self.cellsize
            )));
        }
        if !(self.xllcorner.is_finite() && self.yllcorner.is_finite()) {
            return Err(DomeError::format("corner coordinates must be finite"));
        }
        Ok(())
    }

    fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "ncols         {}", self.ncols)?;
        writeln!(out, "nrows         {}", self.nrows)?;
        writeln!(out, "xllcorner     {}", self.xllcorner)?;
        writeln!(out, "yllcorner     {}", self.yllcorner)?;
        writeln!(out, "cellsize      {}", self.cellsize)?;
        writeln!(out, "NODATA_value  {}", self.nodata_value)
    }
}

/// Parsed ASC raster: header plus `nrows × ncols` values
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    header: RasterHeader,
    values: FieldData,
}

impl Raster {
    /// Pair a header with a field of values
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Format`] if the header is invalid or the field's
    /// shape differs from the declared `ncols × nrows`
    pub fn new(header: RasterHeader, values: FieldData) -> Result<Self> {
        header.validate()?;
        if values.width() != header.ncols || values.height() != header.nrows {
            return Err(DomeError::format(format!(
                "header declares {}x{} cells but data is {}x{}",
                header.ncols,
                header.nrows,
                values.width(),
                values.height()
            )));
        }
        Ok(Self { header, values })
    }

    /// Read a raster from a file
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Io`] if the file cannot be opened or read and
    /// [`DomeError::Format`] if its contents are malformed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DomeError::io(path, e))?;
        let raster = parse(BufReader::new(file), path)?;
        debug!(
            path = %path.display(),
            ncols = raster.header.ncols,
            nrows = raster.header.nrows,
            cellsize = raster.header.cellsize,
            "Loaded ASC raster"
        );
        Ok(raster)
    }

    /// Read a raster from any buffered reader
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Io`] if reading fails and [`DomeError::Format`]
    /// if the contents are malformed
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        parse(reader, Path::new("<reader>"))
    }

    /// Raster header
    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    /// Raster values, north row first
    pub fn values(&self) -> &FieldData {
        &self.values
    }

    /// Consume the raster and return its values
    pub fn into_values(self) -> FieldData {
        self.values
    }

    /// Replace the values while keeping this raster's georeferencing
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Format`] if `values` has a different shape
    pub fn with_values(&self, values: FieldData) -> Result<Self> {
        Self::new(self.header, values)
    }

    /// Number of cells holding the NODATA sentinel
    pub fn nodata_count(&self) -> usize {
        self.values
            .as_slice()
            .iter()
            .filter(|&&v| self.header.is_nodata(v))
            .count()
    }

    /// Serialize to ASC text
    ///
    /// # Errors
    ///
    /// Returns any error produced by the writer
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.header.write_to(out)?;
        let mut line = String::new();
        for row in self.values.rows() {
            line.clear();
            for (i, v) in row.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                // Writing into a String cannot fail
                let _ = write!(line, "{v}");
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Write the raster to a file, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns [`DomeError::Io`] if the file cannot be created or written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DomeError::io(path, e))?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)
            .and_then(|()| out.flush())
            .map_err(|e| DomeError::io(path, e))?;
        debug!(path = %path.display(), "Wrote ASC raster");
        Ok(())
    }

    /// Serialize to an in-memory ASC string
    pub fn to_asc_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl FromStr for Raster {
    type Err = DomeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}

/// Header entries collected before the first data row
#[derive(Default)]
struct HeaderFields<'a> {
    entries: FxHashMap<String, (usize, String)>,
    origin: Option<&'a Path>,
}

impl HeaderFields<'_> {
    fn insert(&mut self, line_no: usize, key: &str, value: &str) -> Result<()> {
        let key = key.to_ascii_lowercase();
        if !KNOWN_KEYS.contains(&key.as_str()) {
            return Err(DomeError::format_at(
                line_no,
                format!("unexpected header key '{key}'"),
            ));
        }
        if let Some((first, _)) = self.entries.get(&key) {
            return Err(DomeError::format_at(
                line_no,
                format!("duplicate header key '{key}' (first seen at line {first})"),
            ));
        }
        self.entries.insert(key, (line_no, value.to_string()));
        Ok(())
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some((line_no, raw)) => raw.parse::<T>().map(Some).map_err(|_| {
                DomeError::format_at(*line_no, format!("invalid value '{raw}' for '{key}'"))
            }),
        }
    }

    fn required<T: FromStr>(&self, key: &str) -> Result<T> {
        self.number(key)?.ok_or_else(|| {
            let source = self
                .origin
                .map_or_else(String::new, |p| format!(" in {}", p.display()));
            DomeError::format(format!("missing header key '{key}'{source}"))
        })
    }

    /// Resolve a lower-left coordinate from either its corner or center key
    fn lower_left(&self, corner: &str, center: &str, cellsize: f64) -> Result<f64> {
        match (self.number::<f64>(corner)?, self.number::<f64>(center)?) {
            (Some(_), Some(_)) => Err(DomeError::format(format!(
                "header declares both '{corner}' and '{center}'"
            ))),
            (Some(v), None) => Ok(v),
            (None, Some(v)) => Ok(v - cellsize / 2.0),
            (None, None) => Err(DomeError::format(format!("missing header key '{corner}'"))),
        }
    }

    fn finish(&self) -> Result<RasterHeader> {
        let cellsize: f64 = self.required(KEY_CELLSIZE)?;
        let header = RasterHeader {
            ncols: self.required(KEY_NCOLS)?,
            nrows: self.required(KEY_NROWS)?,
            xllcorner: self.lower_left(KEY_XLLCORNER, KEY_XLLCENTER, cellsize)?,
            yllcorner: self.lower_left(KEY_YLLCORNER, KEY_YLLCENTER, cellsize)?,
            cellsize,
            nodata_value: self.number(KEY_NODATA)?.unwrap_or(DEFAULT_NODATA),
        };
        header.validate()?;
        Ok(header)
    }
}

/// A header line starts with a token that is not a number
fn is_header_line(first_token: &str) -> bool {
    first_token.parse::<f64>().is_err()
}

fn parse<R: BufRead>(reader: R, origin: &Path) -> Result<Raster> {
    let mut fields = HeaderFields {
        origin: Some(origin),
        ..HeaderFields::default()
    };
    let mut header: Option<RasterHeader> = None;
    let mut data: Vec<f64> = Vec::new();
    let mut rows_read = 0_usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| DomeError::io(origin, e))?;
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        let h = match header {
            Some(h) => h,
            None if is_header_line(first) => {
                let value = tokens.next().ok_or_else(|| {
                    DomeError::format_at(line_no, format!("header key '{first}' has no value"))
                })?;
                if tokens.next().is_some() {
                    return Err(DomeError::format_at(
                        line_no,
                        format!("header line for '{first}' has trailing tokens"),
                    ));
                }
                fields.insert(line_no, first, value)?;
                continue;
            }
            None => {
                let parsed = fields.finish()?;
                data.reserve(parsed.cell_count()?.min(MAX_INITIAL_RESERVE));
                header = Some(parsed);
                parsed
            }
        };

        if rows_read == h.nrows {
            return Err(DomeError::format_at(
                line_no,
                format!("more than the declared {} data rows", h.nrows),
            ));
        }

        let start = data.len();
        for token in std::iter::once(first).chain(tokens) {
            let value = token.parse::<f64>().map_err(|_| {
                DomeError::format_at(line_no, format!("invalid number '{token}' in data row"))
            })?;
            data.push(value);
        }
        let count = data.len() - start;
        if count != h.ncols {
            return Err(DomeError::format_at(
                line_no,
                format!("expected {} values, got {count}", h.ncols),
            ));
        }
        rows_read += 1;
    }

    let header = match header {
        Some(h) => h,
        // Header only: still report missing keys before the missing data
        None => fields.finish()?,
    };
    if rows_read != header.nrows {
        return Err(DomeError::format(format!(
            "expected {} data rows, got {rows_read}",
            header.nrows
        )));
    }

    let values = FieldData::from_vec(header.ncols, header.nrows, data)?;
    Raster::new(header, values)
}
