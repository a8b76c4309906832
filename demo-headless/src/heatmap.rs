//! Character heatmap rendered to stdout

use ice_dome_core::{FieldFrame, FrameKind, IceGrid, VisualizeError, Visualizer};
use nalgebra::DVector;
use std::io::{self, Write};

/// Brightness ramp from thin to thick ice
const RAMP: &[u8] = b" .:-=+*#%@";

/// Prints each frame as a down-sampled character map
pub struct TerminalHeatmap {
    max_width: usize,
}

impl TerminalHeatmap {
    pub fn new(max_width: usize) -> Self {
        Self {
            max_width: max_width.max(1),
        }
    }

    fn draw<W: Write>(&self, out: &mut W, grid: &IceGrid, frame: &FieldFrame) -> io::Result<()> {
        let field = &frame.field;
        let header = grid.header();
        // Only elevation frames carry the raster's NODATA sentinel
        let has_nodata = matches!(frame.kind, FrameKind::Surface | FrameKind::Bed);
        let is_valid = |v: f64| v.is_finite() && !(has_nodata && header.is_nodata(v));

        let range = value_range(field.as_slice().iter().copied().filter(|&v| is_valid(v)));
        let (x_min, x_max) = extent(grid.x());
        let (y_min, y_max) = extent(grid.y());

        writeln!(out, "\n--- {} ---", frame.title())?;
        match range {
            Some((min, max, mean)) => writeln!(
                out,
                "x: {:.0}..{:.0} m  y: {:.0}..{:.0} m  min {:.1} m  max {:.1} m  mean {:.1} m",
                x_min, x_max, y_min, y_max, min, max, mean
            )?,
            None => writeln!(out, "no valid cells")?,
        }
        let (min, max, _) = range.unwrap_or((0.0, 0.0, 0.0));

        // Terminal cells are about twice as tall as they are wide
        let stride = field.width().div_ceil(self.max_width).max(1);
        let row_stride = stride * 2;
        let span = max - min;

        let mut line = String::with_capacity(self.max_width);
        for y in (0..field.height()).step_by(row_stride) {
            line.clear();
            for x in (0..field.width()).step_by(stride) {
                let v = field.get(x, y);
                let t = if span > 0.0 && is_valid(v) {
                    (v - min) / span
                } else {
                    0.0
                };
                let idx = (t * (RAMP.len() - 1) as f64).round() as usize;
                line.push(RAMP[idx.min(RAMP.len() - 1)] as char);
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

/// Min, max and mean of the given values, `None` when there are none
fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64, f64)> {
    let mut count = 0_usize;
    let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        count += 1;
    }
    (count > 0).then_some((min, max, sum / count as f64))
}

fn extent(axis: &DVector<f64>) -> (f64, f64) {
    (axis.min(), axis.max())
}

impl Visualizer for TerminalHeatmap {
    fn name(&self) -> &str {
        "terminal-heatmap"
    }

    fn render_field(&mut self, grid: &IceGrid, frame: &FieldFrame) -> Result<(), VisualizeError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.draw(&mut out, grid, frame)
            .map_err(|e| VisualizeError::Backend(format!("stdout: {e}")))
    }
}
