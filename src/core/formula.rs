//! Sampling a formula `f(x1, x3) -> x2` into plottable rows.
//!
//! The formula itself is evaluated elsewhere; this module only sees a pure
//! function. `NaN` and infinite results mean "no data" and never reach a
//! table.

use tracing::warn;

use crate::core::{
    config::{Dimensions, PlotMode},
    data::{Cell, Table},
};

/// Rows `[x, f(x/x_res, z/z_res), z]` over the vertex grid.
///
/// Bar charts sample the closed range `0..=vertices` so the last grid line
/// gets a bar too; everything else samples `0..vertices`.
#[must_use]
pub fn sample_rows<F>(f: F, dims: &Dimensions, mode: PlotMode) -> Table
where
    F: Fn(f64, f64) -> f64,
{
    let extra = usize::from(mode == PlotMode::Barchart);
    let (xs, zs) = (dims.x_vertices() + extra, dims.z_vertices() + extra);

    let mut rows = Vec::with_capacity(xs * zs);
    let mut dropped = 0usize;
    for x in 0..xs {
        for z in 0..zs {
            #[allow(clippy::cast_precision_loss)]
            let (xv, zv) = (x as f64, z as f64);
            let y = f(xv / dims.x_res(), zv / dims.z_res());
            if y.is_finite() {
                rows.push(vec![Cell::Number(xv), Cell::Number(y), Cell::Number(zv)]);
            } else {
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        warn!(dropped, "formula returned no data for some samples");
    }
    Table::from_rows(rows)
}

/// Height field over the full `(x_vertices+1) × (z_vertices+1)` grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceSamples {
    pub x_count: usize,
    pub z_count: usize,
    /// Row-major by x; `None` where the formula had no value.
    pub heights: Vec<Option<f64>>,
    /// Range of the finite heights, seeded with 0.
    pub min: f64,
    pub max: f64,
}

impl SurfaceSamples {
    /// `max(max(|max|, |min|), |max - min|)`, never zero.
    #[must_use]
    pub fn hybrid_scale(&self) -> f64 {
        let s = self.max.abs().max(self.min.abs()).max((self.max - self.min).abs());
        if s == 0.0 { 1.0 } else { s }
    }

    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> Option<f64> {
        if x >= self.x_count || z >= self.z_count {
            return None;
        }
        self.heights[x * self.z_count + z]
    }
}

#[must_use]
pub fn sample_surface<F>(f: F, dims: &Dimensions) -> SurfaceSamples
where
    F: Fn(f64, f64) -> f64,
{
    let (x_count, z_count) = (dims.x_vertices() + 1, dims.z_vertices() + 1);
    let mut heights = Vec::with_capacity(x_count * z_count);
    let (mut min, mut max) = (0.0_f64, 0.0_f64);

    for x in 0..x_count {
        for z in 0..z_count {
            #[allow(clippy::cast_precision_loss)]
            let y = f(x as f64 / dims.x_res(), z as f64 / dims.z_res());
            if y.is_finite() {
                min = min.min(y);
                max = max.max(y);
                heights.push(Some(y));
            } else {
                heights.push(None);
            }
        }
    }
    SurfaceSamples {
        x_count,
        z_count,
        heights,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dimensions {
        Dimensions::new(2, 2, 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_scatter_sampling_is_half_open() {
        let t = sample_rows(|x, z| x + z, &small(), PlotMode::Scatterplot);
        assert_eq!(t.len(), 4);
        assert_eq!(t.width(), 3);
        // last row: x=1, z=1 -> f(0.5, 0.5)
        assert_eq!(t.cell(3, 1), Some(&Cell::Number(1.0)));
    }

    #[test]
    fn test_bar_sampling_is_closed() {
        let t = sample_rows(|_, _| 1.0, &small(), PlotMode::Barchart);
        assert_eq!(t.len(), 9);
    }

    #[test]
    fn test_non_finite_results_dropped() {
        let t = sample_rows(|x, _| 1.0 / x, &small(), PlotMode::Scatterplot);
        // x = 0 gives infinity for both z values
        assert_eq!(t.len(), 2);
        let t = sample_rows(|_, _| f64::NAN, &small(), PlotMode::Barchart);
        assert!(t.is_empty());
    }

    #[test]
    fn test_surface_grid_and_scale() {
        let s = sample_surface(|x, z| x - z, &small());
        assert_eq!((s.x_count, s.z_count), (3, 3));
        assert_eq!((s.min, s.max), (-1.0, 1.0));
        assert_eq!(s.hybrid_scale(), 2.0);
        assert_eq!(s.get(2, 0), Some(1.0));
    }

    #[test]
    fn test_surface_no_data() {
        let s = sample_surface(|_, _| f64::INFINITY, &small());
        assert!(s.heights.iter().all(Option::is_none));
        assert_eq!(s.hybrid_scale(), 1.0);
    }

    #[test]
    fn test_surface_positive_only_scale() {
        let s = sample_surface(|_, _| 3.0, &small());
        assert_eq!((s.min, s.max), (0.0, 3.0));
        assert_eq!(s.hybrid_scale(), 3.0);
    }
}
