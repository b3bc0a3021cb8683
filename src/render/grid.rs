//! Bilinear splatting of scattered `(x, value, z)` samples onto a bar grid.
//!
//! The grid owns its accumulators and its running value range. Callers that
//! extend a previous plot keep the grid as is; a fresh plot calls
//! [`Grid::reset`] first, which zeroes every cell and the range.
//!
//! ```text
//!   (x0,z0) +--------+ (x0+1,z0)
//!           |   .e   |        e = (xf, zf)
//!           |        |        weight(c) = (1-|cx-xf|) * (1-|cz-zf|)
//! (x0,z0+1) +--------+ (x0+1,z0+1)
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::{config::Dimensions, data::Table};

/// One bar accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GridCell {
    pub value: f64,
    /// Received a contribution with nonzero weight at least once.
    pub touched: bool,
}

/// `x_count × z_count` accumulators, stored row-major by x.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Grid {
    x_count: usize,
    z_count: usize,
    cells: Vec<GridCell>,
    min: f64,
    max: f64,
}

impl Grid {
    /// Grid with one cell per vertex: `(x_vertices+1) × (z_vertices+1)`.
    #[must_use]
    pub fn new(x_vertices: usize, z_vertices: usize) -> Self {
        let (x_count, z_count) = (x_vertices + 1, z_vertices + 1);
        Self {
            x_count,
            z_count,
            cells: vec![GridCell::default(); x_count * z_count],
            min: 0.0,
            max: 0.0,
        }
    }

    #[must_use]
    pub fn for_dimensions(dims: &Dimensions) -> Self {
        Self::new(dims.x_vertices(), dims.z_vertices())
    }

    /// True when this grid was sized for `dims`.
    #[must_use]
    pub fn fits(&self, dims: &Dimensions) -> bool {
        self.x_count == dims.x_vertices() + 1 && self.z_count == dims.z_vertices() + 1
    }

    pub fn reset(&mut self) {
        self.cells.fill(GridCell::default());
        self.min = 0.0;
        self.max = 0.0;
    }

    #[inline]
    #[must_use]
    pub fn x_count(&self) -> usize {
        self.x_count
    }

    #[inline]
    #[must_use]
    pub fn z_count(&self) -> usize {
        self.z_count
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> Option<&GridCell> {
        (x < self.x_count && z < self.z_count).then(|| &self.cells[x * self.z_count + z])
    }

    /// Running `(min, max)` over every update since the last reset.
    #[inline]
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Touched cells with their coordinates.
    pub fn touched(&self) -> impl Iterator<Item = (usize, usize, &GridCell)> + '_ {
        let z_count = self.z_count;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.touched)
            .map(move |(i, c)| (i / z_count, i % z_count, c))
    }

    /// Sum of all accumulated values.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.cells.iter().map(|c| c.value).sum()
    }

    /// Add `value * weight(x, z)` to one cell. Out-of-grid cells and zero
    /// weights are no-ops.
    fn deposit(&mut self, x: i64, z: i64, value: f64, xf: f64, zf: f64) {
        #[allow(clippy::cast_precision_loss)]
        let weight = (1.0 - (x as f64 - xf).abs()) * (1.0 - (z as f64 - zf).abs());
        if weight == 0.0 {
            return;
        }
        let (Ok(xu), Ok(zu)) = (usize::try_from(x), usize::try_from(z)) else {
            return;
        };
        if xu >= self.x_count || zu >= self.z_count {
            return;
        }
        let cell = &mut self.cells[xu * self.z_count + zu];
        cell.value += value * weight;
        cell.touched = true;
        self.min = self.min.min(cell.value);
        self.max = self.max.max(cell.value);
    }
}

/// Which table columns feed the splat.
#[derive(Clone, Copy, Debug)]
pub struct SplatColumns {
    pub x: usize,
    pub value: usize,
    pub z: usize,
}

/// Maps data coordinates onto grid coordinates:
/// `xf = (x - min_x) * x_scale`, `zf = (z - min_z) * z_scale`.
#[derive(Clone, Copy, Debug)]
pub struct SplatTransform {
    pub x_scale: f64,
    pub z_scale: f64,
    pub min_x: f64,
    pub min_z: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SplatReport {
    pub splatted: usize,
    pub skipped: usize,
    pub min: f64,
    pub max: f64,
}

/// Distribute every row's value over the four surrounding cells.
///
/// Rows without a numeric value or with non-finite coordinates are skipped
/// with a warning.
pub fn splat(table: &Table, cols: SplatColumns, grid: &mut Grid, tf: SplatTransform) -> SplatReport {
    let mut report = SplatReport::default();

    for (i, row) in table.rows().iter().enumerate() {
        let value = row.get(cols.value).and_then(|c| c.as_number());
        let Some(value) = value.filter(|v| v.is_finite()) else {
            warn!(row = i, column = cols.value, "non-number value, skipping data point");
            report.skipped += 1;
            continue;
        };
        let x = row.get(cols.x).and_then(|c| c.as_number()).unwrap_or(f64::NAN);
        let z = row.get(cols.z).and_then(|c| c.as_number()).unwrap_or(f64::NAN);
        let xf = (x - tf.min_x) * tf.x_scale;
        let zf = (z - tf.min_z) * tf.z_scale;
        if !xf.is_finite() || !zf.is_finite() {
            warn!(row = i, "non-number coordinate, skipping data point");
            report.skipped += 1;
            continue;
        }

        #[allow(clippy::cast_possible_truncation)]
        let (x0, z0) = (xf.floor() as i64, zf.floor() as i64);
        #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
        let aligned = xf == x0 as f64 && zf == z0 as f64;

        if aligned {
            grid.deposit(x0, z0, value, xf, zf);
        } else {
            grid.deposit(x0, z0, value, xf, zf);
            grid.deposit(x0 + 1, z0, value, xf, zf);
            grid.deposit(x0, z0 + 1, value, xf, zf);
            grid.deposit(x0 + 1, z0 + 1, value, xf, zf);
        }
        report.splatted += 1;
    }

    (report.min, report.max) = grid.range();
    debug!(
        splatted = report.splatted,
        skipped = report.skipped,
        min = report.min,
        max = report.max,
        "splat done"
    );
    report
}
