//! Axis ranges + terminal size plumbing.

use serde::Serialize;
use terminal_size::{Height, Width, terminal_size};

use crate::core::{
    constants::{BORDER_WIDTH, MIN_PREVIEW_HEIGHT, MIN_PREVIEW_WIDTH},
    data::Table,
};

/// Which plot axis. `X2` is the vertical one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Axis {
    X1,
    X2,
    X3,
}

/// Range of one axis plus the divisor that maps it onto unit length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AxisNormalization {
    pub min: f64,
    pub max: f64,
    /// `|max - min|`, never zero.
    pub scale: f64,
}

impl AxisNormalization {
    /// Range `[min, max]`. A zero span gets scale 1.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        let mut scale = (max - min).abs();
        if scale == 0.0 || !scale.is_finite() {
            scale = 1.0;
        }
        Self { min, max, scale }
    }

    /// Axis that is not normalized: values are only divided by `scale`.
    #[must_use]
    pub fn fixed(scale: f64) -> Self {
        let scale = if scale == 0.0 || !scale.is_finite() {
            1.0
        } else {
            scale.abs()
        };
        Self {
            min: 0.0,
            max: 1.0,
            scale,
        }
    }

    /// Widen (never narrow) this range with `other`.
    #[must_use]
    pub fn merged(self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Map a value into `[0, len]`.
    #[inline]
    #[must_use]
    pub fn project(&self, v: f64, len: f64) -> f64 {
        (v - self.min) / self.scale * len
    }
}

impl Default for AxisNormalization {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Normalization of all three axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Normalization {
    pub x1: AxisNormalization,
    pub x2: AxisNormalization,
    pub x3: AxisNormalization,
}

impl Normalization {
    #[must_use]
    pub fn axis(&self, axis: Axis) -> &AxisNormalization {
        match axis {
            Axis::X1 => &self.x1,
            Axis::X2 => &self.x2,
            Axis::X3 => &self.x3,
        }
    }
}

/// Min/max of one column.
///
/// Text and non-finite cells are ignored, so a header row that slipped
/// through does not poison the range. With `extend` the result is widened
/// by `previous`. A column without any number yields `previous` (when
/// extending) or `[0, 1]`.
#[must_use]
pub fn compute_axis_normalization(
    table: &Table,
    column: usize,
    previous: Option<&AxisNormalization>,
    extend: bool,
) -> AxisNormalization {
    let found = table
        .column(column)
        .filter_map(|c| c.as_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| {
            Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
        });

    let previous = previous.filter(|_| extend);
    match (found, previous) {
        (Some((lo, hi)), Some(prev)) => AxisNormalization::new(lo, hi).merged(prev),
        (Some((lo, hi)), None) => AxisNormalization::new(lo, hi),
        (None, Some(prev)) => *prev,
        (None, None) => AxisNormalization::default(),
    }
}

/// Current terminal geometry (80×30 fallback).
#[inline]
#[must_use]
pub fn terminal_geometry() -> (Width, Height) {
    terminal_size().unwrap_or((Width(80), Height(30)))
}

/// Character grid available for a preview of `cols × rows` cells, keeping
/// room for the borders and a label line.
#[inline]
#[must_use]
pub fn preview_dims((w, h): (Width, Height), cols: usize, rows: usize) -> (usize, usize) {
    let max_w = usize::from(w.0).saturating_sub(BORDER_WIDTH).max(MIN_PREVIEW_WIDTH);
    let max_h = usize::from(h.0).saturating_sub(6).max(MIN_PREVIEW_HEIGHT);
    (cols.clamp(1, max_w), rows.clamp(1, max_h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::Cell;

    fn table(rows: &[&[f64]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&v| Cell::Number(v)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_min_max_scale() {
        let t = table(&[&[3.0, 4.0], &[5.0, 6.0]]);
        let n = compute_axis_normalization(&t, 0, None, false);
        assert_eq!((n.min, n.max, n.scale), (3.0, 5.0, 2.0));
    }

    #[test]
    fn test_flat_column_scale_is_one() {
        let t = table(&[&[7.0], &[7.0], &[7.0]]);
        let n = compute_axis_normalization(&t, 0, None, false);
        assert_eq!((n.min, n.max, n.scale), (7.0, 7.0, 1.0));
    }

    #[test]
    fn test_extend_only_widens() {
        let t = table(&[&[2.0], &[4.0]]);
        let prev = AxisNormalization::new(0.0, 3.0);
        let n = compute_axis_normalization(&t, 0, Some(&prev), true);
        assert_eq!((n.min, n.max, n.scale), (0.0, 4.0, 4.0));

        let narrow = AxisNormalization::new(2.5, 3.0);
        let n = compute_axis_normalization(&t, 0, Some(&narrow), true);
        assert_eq!((n.min, n.max), (2.0, 4.0));
    }

    #[test]
    fn test_previous_ignored_without_extend() {
        let t = table(&[&[2.0], &[4.0]]);
        let prev = AxisNormalization::new(-10.0, 10.0);
        let n = compute_axis_normalization(&t, 0, Some(&prev), false);
        assert_eq!((n.min, n.max), (2.0, 4.0));
    }

    #[test]
    fn test_text_cells_are_skipped() {
        let t = Table::from_rows(vec![
            vec![Cell::Text("x".into())],
            vec![Cell::Number(1.0)],
            vec![Cell::Number(f64::NAN)],
            vec![Cell::Number(9.0)],
        ]);
        let n = compute_axis_normalization(&t, 0, None, false);
        assert_eq!((n.min, n.max, n.scale), (1.0, 9.0, 8.0));
    }

    #[test]
    fn test_no_numbers_falls_back() {
        let t = Table::from_rows(vec![vec![Cell::Text("x".into())]]);
        assert_eq!(compute_axis_normalization(&t, 0, None, false), AxisNormalization::default());
    }

    #[test]
    fn test_fixed_scale_never_zero() {
        assert_eq!(AxisNormalization::fixed(0.0).scale, 1.0);
        assert_eq!(AxisNormalization::fixed(-4.0).scale, 4.0);
    }

    #[test]
    fn test_preview_dims_clamp() {
        let (w, h) = preview_dims((Width(40), Height(20)), 100, 3);
        assert_eq!((w, h), (38, 3));
    }
}
