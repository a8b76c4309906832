//! Visualization seam
//!
//! Rendering is an external concern. The simulation hands finished fields
//! to any number of [`Visualizer`]s; a failing visualizer is logged and
//! skipped, it never invalidates the computed data.

use crate::core_types::FieldData;
use crate::grid::IceGrid;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a frame's values represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Ice thickness (m)
    Thickness,
    /// Surface elevation, bed plus thickness (m)
    Surface,
    /// Bed elevation under the ice (m)
    Bed,
    /// Initial minus current thickness (m), positive where ice thinned
    ThicknessChange,
}

impl FrameKind {
    /// Human-readable name used in titles
    pub fn label(self) -> &'static str {
        match self {
            FrameKind::Thickness => "thickness",
            FrameKind::Surface => "surface",
            FrameKind::Bed => "bed",
            FrameKind::ThicknessChange => "thickness change",
        }
    }
}

/// File-name stem, e.g. `thickness_change`
impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Thickness => write!(f, "thickness"),
            FrameKind::Surface => write!(f, "surface"),
            FrameKind::Bed => write!(f, "bed"),
            FrameKind::ThicknessChange => write!(f, "thickness_change"),
        }
    }
}

/// One field at one moment of the run
#[derive(Debug, Clone)]
pub struct FieldFrame {
    /// What the values represent
    pub kind: FrameKind,
    /// Step index the field belongs to
    pub step_index: u64,
    /// Simulated time (yr)
    pub elapsed: f64,
    /// Field values, north row first
    pub field: FieldData,
}

impl FieldFrame {
    /// Human-readable title, e.g. `thickness after 100000 yr`
    pub fn title(&self) -> String {
        match (self.kind, self.step_index) {
            (FrameKind::Bed, _) => "bed".to_string(),
            (kind, 0) => format!("initial {}", kind.label()),
            (kind, _) => format!("{} after {} yr", kind.label(), self.elapsed),
        }
    }
}

/// Errors raised by rendering backends
#[derive(Debug)]
pub enum VisualizeError {
    /// Output could not be written
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Backend-specific failure
    Backend(String),
}

impl fmt::Display for VisualizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualizeError::Io { path, source } => {
                write!(f, "Failed to write {}: {source}", path.display())
            }
            VisualizeError::Backend(msg) => write!(f, "Rendering failed: {msg}"),
        }
    }
}

impl std::error::Error for VisualizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VisualizeError::Io { source, .. } => Some(source),
            VisualizeError::Backend(_) => None,
        }
    }
}

/// Consumer of finished grids
///
/// The grid supplies the x/y coordinate vectors and georeferencing; frames
/// supply the values.
pub trait Visualizer {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Render a single field
    ///
    /// # Errors
    ///
    /// Returns a [`VisualizeError`] if the backend fails
    fn render_field(&mut self, grid: &IceGrid, frame: &FieldFrame) -> Result<(), VisualizeError>;

    /// Render a time series, by default one frame at a time
    ///
    /// # Errors
    ///
    /// Returns the first [`VisualizeError`] raised by the backend
    fn render_series(
        &mut self,
        grid: &IceGrid,
        frames: &[FieldFrame],
    ) -> Result<(), VisualizeError> {
        for frame in frames {
            self.render_field(grid, frame)?;
        }
        Ok(())
    }
}

/// Writes every frame as an ASC raster in a directory
///
/// Files are named `<kind>_<step>.asc`, with the step zero-padded to six
/// digits so that directory listings sort chronologically.
#[derive(Debug, Clone)]
pub struct AscExporter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl AscExporter {
    /// Export into `dir`, creating it on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, frame: &FieldFrame) -> PathBuf {
        self.dir
            .join(format!("{}_{:06}.asc", frame.kind, frame.step_index))
    }
}

impl Visualizer for AscExporter {
    fn name(&self) -> &str {
        "asc-export"
    }

    fn render_field(&mut self, grid: &IceGrid, frame: &FieldFrame) -> Result<(), VisualizeError> {
        fs::create_dir_all(&self.dir).map_err(|source| VisualizeError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let raster = grid
            .field_raster(&frame.field)
            .map_err(|e| VisualizeError::Backend(e.to_string()))?;
        let path = self.path_for(frame);
        raster.save(&path).map_err(|e| match e {
            crate::DomeError::Io { path, source } => VisualizeError::Io { path, source },
            other => VisualizeError::Backend(other.to_string()),
        })?;

        debug!(path = %path.display(), title = %frame.title(), "Exported frame");
        self.written.push(path);
        Ok(())
    }
}
