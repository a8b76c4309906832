//! Error taxonomy for the ice dome pipeline
//!
//! Every variant is fatal to a run: parsing, grid construction and stepper
//! setup either succeed completely or report one of these errors. Rendering
//! problems are reported separately through [`crate::viz::VisualizeError`]
//! and never abort a simulation.

use std::fmt;
use std::path::PathBuf;

/// Result alias used throughout the core crate
pub type Result<T> = std::result::Result<T, DomeError>;

/// Errors that can occur while loading rasters or configuring a simulation
#[derive(Debug)]
pub enum DomeError {
    /// File could not be opened or read
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Malformed header or data row
    Format {
        /// 1-based line number, when the problem is tied to a line
        line: Option<usize>,
        /// Description of the problem
        message: String,
    },
    /// Surface and bed rasters are not aligned
    ShapeMismatch {
        /// Description of the mismatch
        message: String,
    },
    /// Numerical configuration violates the explicit scheme's stability bound
    Stability {
        /// Description of the violated constraint
        message: String,
    },
}

impl DomeError {
    /// Create a format error without a line reference
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            line: None,
            message: message.into(),
        }
    }

    /// Create a format error tied to a 1-based line number
    pub fn format_at(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    /// Create a stability error
    pub fn stability(message: impl Into<String>) -> Self {
        Self::Stability {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path that produced it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for DomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomeError::Io { path, source } => {
                write!(f, "Failed to read {}: {source}", path.display())
            }
            DomeError::Format {
                line: Some(line),
                message,
            } => write!(f, "Malformed raster at line {line}: {message}"),
            DomeError::Format {
                line: None,
                message,
            } => write!(f, "Malformed raster: {message}"),
            DomeError::ShapeMismatch { message } => write!(f, "Grid shape mismatch: {message}"),
            DomeError::Stability { message } => write!(f, "Unstable configuration: {message}"),
        }
    }
}

impl std::error::Error for DomeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomeError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_format_display_with_line() {
        let err = DomeError::format_at(7, "expected 3 values, got 2");
        assert_eq!(
            err.to_string(),
            "Malformed raster at line 7: expected 3 values, got 2"
        );
    }

    #[test]
    fn test_io_error_exposes_source() {
        let err = DomeError::io(
            "missing.asc",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing.asc"));
    }

    #[test]
    fn test_non_io_errors_have_no_source() {
        assert!(DomeError::stability("dt too large").source().is_none());
        assert!(DomeError::shape_mismatch("3x2 vs 2x3").source().is_none());
    }
}
